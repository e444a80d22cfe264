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

//! Hub configuration, stored as TOML in `~/.debughub.toml`.

use std::{
    collections::BTreeMap,
    fs,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    path::{Path, PathBuf},
    time::Duration,
};

use debughub_common::Capabilities;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Language the hub falls back to when a script's extension is unknown.
pub const DEFAULT_LANGUAGE: &str = "Python3";

/// Hub configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Address the backend listener binds to
    pub host: IpAddr,
    /// Listener port, 0 picks a free one
    pub port: u16,
    /// Wait for externally started debuggees instead of spawning them
    pub passive: bool,
    /// Language of debuggees connecting in passive mode
    pub passive_language: String,
    /// Language used when a script's extension is not claimed by any interface
    pub default_language: String,
    /// Peers admitted without asking the front end
    pub allowed_hosts: Vec<IpAddr>,
    /// Re-issue the last launch when the last debuggee exits
    pub auto_relaunch: bool,
    /// Seconds to wait for a launched debuggee to report back
    pub launch_timeout_secs: u64,
    /// Program patterns that child processes must not debug
    pub multiprocess_no_debug: Vec<String>,
    /// Debuggee launch settings per language
    pub languages: BTreeMap<String, LanguageConfig>,
}

/// How to start a debuggee of one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Debug client executable; empty if none is configured
    pub command: String,
    /// Arguments; `{host}`, `{port}` and `{script}` are substituted
    pub args: Vec<String>,
    /// Script extensions claimed by this language
    pub extensions: Vec<String>,
    /// Capability names, e.g. `debugger,interpreter` or `all`
    pub capabilities: String,
}

impl LanguageConfig {
    /// Parsed capability set.
    pub fn capabilities(&self) -> Result<Capabilities> {
        self.capabilities
            .parse()
            .wrap_err_with(|| format!("Invalid capabilities '{}'", self.capabilities))
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        let mut languages = BTreeMap::new();
        languages.insert(
            DEFAULT_LANGUAGE.to_string(),
            LanguageConfig {
                command: String::new(),
                args: ["--host", "{host}", "--port", "{port}"].map(String::from).to_vec(),
                extensions: [".py", ".pyw", ".py3", ".pyw3"].map(String::from).to_vec(),
                capabilities: "all".to_string(),
            },
        );

        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            passive: false,
            passive_language: DEFAULT_LANGUAGE.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            allowed_hosts: vec![IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)],
            auto_relaunch: false,
            launch_timeout_secs: 30,
            multiprocess_no_debug: Vec::new(),
            languages,
        }
    }
}

impl HubConfig {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home_dir.join(".debughub.toml"))
    }

    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found, creating default at {:?}", config_path);
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {path:?}"))?;

        let config: Self =
            toml::from_str(&content).wrap_err("Failed to parse config file as TOML")?;
        config.validate()?;

        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        fs::write(path, content)
            .wrap_err_with(|| format!("Failed to write config file: {path:?}"))?;

        debug!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).wrap_err("Failed to serialize config to TOML")
    }

    /// Checks values that serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        for (name, language) in &self.languages {
            language.capabilities().wrap_err_with(|| format!("language '{name}'"))?;
        }
        Ok(())
    }

    /// Launch deadline as a duration
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.port, 0);
        assert!(!config.passive);
        assert_eq!(config.default_language, "Python3");
        assert!(config.allowed_hosts.contains(&IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert_eq!(config.launch_timeout(), Duration::from_secs(30));
        assert_eq!(config.languages["Python3"].capabilities().unwrap(), Capabilities::ALL);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debughub.toml");

        let mut config = HubConfig::default();
        config.passive = true;
        config.multiprocess_no_debug = vec!["pip*".to_string()];
        config.save_to(&path).unwrap();

        assert_eq!(HubConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debughub.toml");
        let content = r#"
port = 4711

[languages.Ruby]
extensions = [".rb"]
capabilities = "debugger"
"#;
        fs::write(&path, content).unwrap();

        let config = HubConfig::load_from(&path).unwrap();
        assert_eq!(config.port, 4711);
        assert_eq!(config.launch_timeout_secs, 30);
        assert_eq!(config.languages["Ruby"].command, "");
        assert!(!config.languages.contains_key("Python3"));
    }

    #[test]
    fn test_invalid_capabilities_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debughub.toml");
        fs::write(&path, "[languages.Ruby]\ncapabilities = \"teleport\"\n").unwrap();

        let err = HubConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:?}").contains("teleport"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(HubConfig::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
