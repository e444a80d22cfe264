// debughub - Debugger Coordination Hub
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Per-language registry of debugger interfaces.
//!
//! A registration is a named bundle (usually one adapter) that contributes one
//! or more languages. Each language carries its capabilities, the file
//! extensions it claims and a factory that builds a fresh interface.

use std::{fmt, sync::Arc};

use debughub_common::Capabilities;
use tracing::{debug, info, warn};

use crate::interface::{DebuggerInterface, InterfaceContext};

/// Builds a new interface for one language.
pub type InterfaceFactory =
    Arc<dyn Fn(InterfaceContext) -> Box<dyn DebuggerInterface> + Send + Sync>;

/// One language contributed by a registration.
#[derive(Clone)]
pub struct LanguageRegistration {
    /// Language name, e.g. `Python3`
    pub language: String,
    /// Supported features
    pub capabilities: Capabilities,
    /// File extensions, with leading dot
    pub extensions: Vec<String>,
    /// Interface factory
    pub factory: InterfaceFactory,
}

impl LanguageRegistration {
    /// Creates a registration; extensions are normalised to carry a leading dot.
    pub fn new(
        language: impl Into<String>,
        capabilities: Capabilities,
        extensions: impl IntoIterator<Item = impl AsRef<str>>,
        factory: InterfaceFactory,
    ) -> Self {
        Self {
            language: language.into(),
            capabilities,
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
            factory,
        }
    }
}

impl fmt::Debug for LanguageRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageRegistration")
            .field("language", &self.language)
            .field("capabilities", &self.capabilities)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Registration {
    name: String,
    languages: Vec<LanguageRegistration>,
}

fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

/// Language name to interface mapping, in registration order.
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    registrations: Vec<Registration>,
}

impl InterfaceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the languages produced by `discover` under `name`.
    ///
    /// A name that is already registered is left alone unless `reregister` is set,
    /// in which case its previous languages are replaced. Returns whether anything
    /// was registered.
    pub fn register<F>(&mut self, name: &str, discover: F, reregister: bool) -> bool
    where
        F: FnOnce() -> Vec<LanguageRegistration>,
    {
        if self.is_registered(name) {
            if !reregister {
                warn!(registration = name, "Debugger interface already registered");
                return false;
            }
            self.unregister(name);
        }

        let languages = discover();
        if languages.is_empty() {
            debug!(registration = name, "Debugger interface contributed no languages");
            return false;
        }

        for language in &languages {
            if self.lookup_by_language(&language.language).is_some() {
                warn!(
                    registration = name,
                    language = %language.language,
                    "Language already provided by another interface, earlier registration wins"
                );
            }
        }

        info!(
            registration = name,
            languages = ?languages.iter().map(|l| l.language.as_str()).collect::<Vec<_>>(),
            "Registered debugger interface"
        );
        self.registrations.push(Registration { name: name.to_string(), languages });
        true
    }

    /// Removes every language contributed by `name`.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|registration| registration.name != name);
        let removed = self.registrations.len() != before;
        if removed {
            info!(registration = name, "Unregistered debugger interface");
        }
        removed
    }

    /// Whether a registration called `name` exists.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registrations.iter().any(|registration| registration.name == name)
    }

    fn languages(&self) -> impl Iterator<Item = &LanguageRegistration> {
        self.registrations.iter().flat_map(|registration| registration.languages.iter())
    }

    /// Returns the entry of `language`.
    pub fn lookup_by_language(&self, language: &str) -> Option<&LanguageRegistration> {
        self.languages().find(|entry| entry.language == language)
    }

    /// Returns the first language (in registration order) claiming `extension`.
    pub fn lookup_by_extension(&self, extension: &str) -> Option<&str> {
        let extension = normalize_extension(extension);
        self.languages()
            .find(|entry| entry.extensions.contains(&extension))
            .map(|entry| entry.language.as_str())
    }

    /// Capabilities of `language`, empty if it is unknown.
    pub fn capabilities_of(&self, language: &str) -> Capabilities {
        self.lookup_by_language(language).map(|entry| entry.capabilities).unwrap_or_default()
    }

    /// Names of every registered language, or only those offering a shell.
    pub fn supported_languages(&self, shell_only: bool) -> Vec<String> {
        self.languages()
            .filter(|entry| !shell_only || entry.capabilities.contains(Capabilities::SHELL))
            .map(|entry| entry.language.clone())
            .collect()
    }

    /// File extensions claimed by `language`.
    pub fn extensions_of(&self, language: &str) -> Vec<String> {
        self.lookup_by_language(language).map(|entry| entry.extensions.clone()).unwrap_or_default()
    }

    /// Builds a fresh interface for `language`.
    pub fn create(
        &self,
        language: &str,
        context: InterfaceContext,
    ) -> Option<Box<dyn DebuggerInterface>> {
        self.lookup_by_language(language).map(|entry| (entry.factory)(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{recording_factory, CommandLog};

    fn python(log: &CommandLog) -> Vec<LanguageRegistration> {
        vec![
            LanguageRegistration::new(
                "Python3",
                Capabilities::ALL,
                [".py", "pyw"],
                recording_factory(log.clone()),
            ),
            LanguageRegistration::new(
                "MicroPython",
                Capabilities::DEBUGGER | Capabilities::INTERPRETER,
                [".py"],
                recording_factory(log.clone()),
            ),
        ]
    }

    #[test]
    fn test_register_and_lookup() {
        let log = CommandLog::default();
        let mut registry = InterfaceRegistry::new();
        assert!(registry.register("python", || python(&log), false));

        assert!(registry.lookup_by_language("Python3").is_some());
        assert_eq!(registry.lookup_by_extension("py"), Some("Python3"));
        assert_eq!(registry.lookup_by_extension(".pyw"), Some("Python3"));
        assert_eq!(registry.lookup_by_extension(".rb"), None);
        assert_eq!(registry.capabilities_of("Python3"), Capabilities::ALL);
        assert!(registry.capabilities_of("Cobol85").is_empty());
        assert_eq!(registry.extensions_of("Python3"), vec![".py", ".pyw"]);
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let log = CommandLog::default();
        let mut registry = InterfaceRegistry::new();
        assert!(registry.register("python", || python(&log), false));
        assert!(!registry.register("python", Vec::new, false));
        assert_eq!(registry.supported_languages(false).len(), 2);
    }

    #[test]
    fn test_reregister_replaces_languages() {
        let log = CommandLog::default();
        let mut registry = InterfaceRegistry::new();
        registry.register("python", || python(&log), false);

        let replacement = vec![LanguageRegistration::new(
            "Python3",
            Capabilities::DEBUGGER,
            [".py"],
            recording_factory(log.clone()),
        )];
        assert!(registry.register("python", || replacement, true));
        assert_eq!(registry.supported_languages(false), vec!["Python3"]);
        assert_eq!(registry.capabilities_of("Python3"), Capabilities::DEBUGGER);
    }

    #[test]
    fn test_empty_discovery_registers_nothing() {
        let mut registry = InterfaceRegistry::new();
        assert!(!registry.register("empty", Vec::new, false));
        assert!(!registry.is_registered("empty"));
    }

    #[test]
    fn test_unregister_and_shell_filter() {
        let log = CommandLog::default();
        let mut registry = InterfaceRegistry::new();
        registry.register("python", || python(&log), false);

        assert_eq!(registry.supported_languages(true), vec!["Python3"]);
        assert!(registry.unregister("python"));
        assert!(!registry.unregister("python"));
        assert!(registry.lookup_by_language("Python3").is_none());
    }

    #[test]
    fn test_create_runs_factory() {
        let log = CommandLog::default();
        let mut registry = InterfaceRegistry::new();
        registry.register("python", || python(&log), false);

        let (events, _rx) = tokio::sync::mpsc::unbounded_channel();
        let events = crate::interface::EventSink::new(1, events);
        let context = InterfaceContext { language: "Python3".to_string(), passive: false, events };
        let mut interface = registry.create("Python3", context.clone()).unwrap();
        interface.send("", crate::protocol::RemoteCommand::Step);
        assert_eq!(log.take(), vec![(String::new(), crate::protocol::RemoteCommand::Step)]);

        assert!(registry.create("Cobol85", context).is_none());
    }
}
