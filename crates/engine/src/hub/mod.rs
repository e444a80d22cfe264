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

//! The coordination hub.
//!
//! [`DebugServer`] owns the breakpoint and watchpoint stores, the interface
//! registry, the admission allow-list and the set of attached backend sessions.
//! It is a plain `&mut self` state machine: all inputs (store edits, backend
//! events, front-end requests, admitted connections, launch deadlines) are fed
//! to it from one task, normally the [`HubRuntime`](crate::runtime::HubRuntime).
//!
//! Session states:
//!
//! ```text
//!   Idle ──launch──▶ Launching ──id/banner/capabilities──▶ Debugging | RunningNoStop
//!    ▲                   │                                          │
//!    └── no process / ───┘                last backend gone, stop(),│
//!        deadline                         syntax error in script ───┘ (via Terminating)
//! ```

mod admission;
mod events;
mod propagation;
mod remote;
mod requests;

pub use admission::Admission;

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    net::SocketAddr,
    path::PathBuf,
};

use debughub_common::{Breakpoint, Capabilities, WatchTrigger, Watchpoint};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    config::HubConfig,
    error::{HubError, HubResult},
    interface::{BackendConnection, DebuggerInterface, EventSink, InterfaceContext, StartRequest},
    protocol::{HubEvent, InterfaceEvent, LaunchMode, LaunchRequest, RemoteCommand},
    registry::{InterfaceRegistry, LanguageRegistration},
    store::{BreakpointStore, StoreEvent, WatchpointStore},
};

use admission::AllowList;

/// Lifecycle state of the debugging session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No debuggee
    #[default]
    Idle,
    /// A debuggee was started and has not reported back yet
    Launching,
    /// Debuggees stop at breakpoints
    Debugging,
    /// Debuggees run without stopping (run, coverage, profile)
    RunningNoStop,
    /// The interface is shutting down
    Terminating,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Launching => "launching",
            Self::Debugging => "debugging",
            Self::RunningNoStop => "running",
            Self::Terminating => "terminating",
        };
        f.write_str(name)
    }
}

/// One attached debuggee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSession {
    /// Language of the interface the session belongs to
    pub language: String,
    /// Capabilities, from the registry until the backend reports its own
    pub capabilities: Capabilities,
    exit_reported: bool,
}

/// Builder for [`DebugServer`] with a fluent API.
#[derive(Debug, Default)]
pub struct DebugServerBuilder {
    config: HubConfig,
    registry: InterfaceRegistry,
    allowed_hosts: Option<Vec<std::net::IpAddr>>,
}

impl DebugServerBuilder {
    /// Create a new builder with the default configuration and an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the interface registry
    pub fn registry(mut self, registry: InterfaceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Override the initial allow-list (defaults to `config.allowed_hosts`)
    pub fn allowed_hosts(mut self, hosts: Vec<std::net::IpAddr>) -> Self {
        self.allowed_hosts = Some(hosts);
        self
    }

    /// Enable or disable passive mode
    pub fn passive(mut self, passive: bool) -> Self {
        self.config.passive = passive;
        self
    }

    /// Build the hub, returning it together with the front-end event stream
    pub fn build(self) -> (DebugServer, UnboundedReceiver<HubEvent>) {
        let Self { config, registry, allowed_hosts } = self;
        let (events_tx, events_rx) = unbounded_channel();
        let (interface_tx, interface_rx) = unbounded_channel();

        let mut breakpoints = BreakpointStore::new();
        let mut watchpoints = WatchpointStore::new();
        let breakpoint_events = breakpoints.subscribe();
        let watchpoint_events = watchpoints.subscribe();

        let allow_list =
            AllowList::new(allowed_hosts.unwrap_or_else(|| config.allowed_hosts.clone()));

        let hub = DebugServer {
            config,
            registry,
            breakpoints,
            watchpoints,
            breakpoint_events,
            watchpoint_events,
            interface: None,
            language: None,
            mode: None,
            sessions: BTreeMap::new(),
            state: SessionState::Idle,
            launch_deadline: None,
            last_launch: None,
            allow_list,
            reported_break_errors: HashSet::new(),
            reported_watch_errors: HashSet::new(),
            interface_generation: 0,
            interface_tx,
            interface_rx: Some(interface_rx),
            events: events_tx,
            listen_addr: None,
        };
        (hub, events_rx)
    }
}

/// The debugger coordination hub.
pub struct DebugServer {
    config: HubConfig,
    registry: InterfaceRegistry,

    breakpoints: BreakpointStore,
    watchpoints: WatchpointStore,
    breakpoint_events: UnboundedReceiver<StoreEvent<Breakpoint>>,
    watchpoint_events: UnboundedReceiver<StoreEvent<Watchpoint>>,

    interface: Option<Box<dyn DebuggerInterface>>,
    language: Option<String>,
    mode: Option<LaunchMode>,
    sessions: BTreeMap<String, BackendSession>,
    state: SessionState,
    launch_deadline: Option<Instant>,
    last_launch: Option<(LaunchRequest, LaunchMode)>,

    allow_list: AllowList,
    reported_break_errors: HashSet<(PathBuf, u32)>,
    reported_watch_errors: HashSet<(String, WatchTrigger)>,

    interface_generation: u64,
    interface_tx: UnboundedSender<InterfaceEvent>,
    interface_rx: Option<UnboundedReceiver<InterfaceEvent>>,
    events: UnboundedSender<HubEvent>,
    listen_addr: Option<SocketAddr>,
}

impl fmt::Debug for DebugServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugServer")
            .field("state", &self.state)
            .field("language", &self.language)
            .field("sessions", &self.sessions)
            .field("breakpoints", &self.breakpoints.len())
            .field("watchpoints", &self.watchpoints.len())
            .finish_non_exhaustive()
    }
}

impl DebugServer {
    /// Shorthand for [`DebugServerBuilder::new`].
    pub fn builder() -> DebugServerBuilder {
        DebugServerBuilder::new()
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Active configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Whether the hub waits for inbound debuggees instead of spawning them
    pub fn is_passive(&self) -> bool {
        self.config.passive
    }

    /// Language of the active interface
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The interface registry
    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    /// Registers an interface; see [`InterfaceRegistry::register`].
    pub fn register_interface<F>(&mut self, name: &str, discover: F, reregister: bool) -> bool
    where
        F: FnOnce() -> Vec<LanguageRegistration>,
    {
        self.registry.register(name, discover, reregister)
    }

    /// Unregisters an interface; see [`InterfaceRegistry::unregister`].
    pub fn unregister_interface(&mut self, name: &str) -> bool {
        self.registry.unregister(name)
    }

    /// Ids of the attached backends, sorted
    pub fn debugger_ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    /// The session of `debugger_id`
    pub fn session(&self, debugger_id: &str) -> Option<&BackendSession> {
        self.sessions.get(debugger_id)
    }

    /// Whether an interface is active and has an open connection
    pub fn is_connected(&self) -> bool {
        self.interface.as_ref().is_some_and(|interface| interface.is_connected())
    }

    /// The breakpoint store (read only; edit through [`Self::edit_breakpoints`])
    pub fn breakpoints(&self) -> &BreakpointStore {
        &self.breakpoints
    }

    /// The watchpoint store (read only; edit through [`Self::edit_watchpoints`])
    pub fn watchpoints(&self) -> &WatchpointStore {
        &self.watchpoints
    }

    /// Address of the backend listener, once the runtime has bound it
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listen_addr
    }

    /// Records where debuggees must connect to.
    pub fn set_listen_addr(&mut self, addr: SocketAddr) {
        self.listen_addr = Some(addr);
    }

    /// Hands the interface event stream to the task that drives the hub.
    ///
    /// Returns `None` once taken.
    pub fn take_interface_events(&mut self) -> Option<UnboundedReceiver<InterfaceEvent>> {
        self.interface_rx.take()
    }

    /// Generation of the most recently created interface.
    ///
    /// Events stamped with any other generation are dropped.
    pub fn interface_generation(&self) -> u64 {
        self.interface_generation
    }

    /// Context for a new interface, which becomes the current generation.
    fn interface_context(&mut self, language: &str, passive: bool) -> InterfaceContext {
        self.interface_generation += 1;
        InterfaceContext {
            language: language.to_string(),
            passive,
            events: EventSink::new(self.interface_generation, self.interface_tx.clone()),
        }
    }

    /// When the pending launch expires
    pub fn launch_deadline(&self) -> Option<Instant> {
        self.launch_deadline
    }

    fn emit(&self, event: HubEvent) {
        if self.events.send(event).is_err() {
            debug!("Front end event receiver dropped");
        }
    }

    /// Tells the front end that one of its requests failed.
    pub fn report_failure(&self, err: &HubError) {
        warn!(%err, "Request failed");
        self.emit(HubEvent::RequestFailed { message: err.to_string() });
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        info!(from = %self.state, to = %state, "Session state changed");
        self.state = state;
        self.emit(HubEvent::StateChanged { state });
    }

    /// Language for `request`: override, extension lookup, then the configured default.
    fn resolve_language(&self, request: &LaunchRequest) -> HubResult<String> {
        let language = match &request.language {
            Some(language) if !language.is_empty() => language.clone(),
            _ => request
                .script
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| self.registry.lookup_by_extension(ext))
                .map(str::to_string)
                .unwrap_or_else(|| self.config.default_language.clone()),
        };

        if self.registry.capabilities_of(&language).is_empty() {
            warn!(%language, "No debugger interface for language");
            return Err(HubError::UnsupportedLanguage(language));
        }
        Ok(language)
    }

    /// Starts a debuggee for `request` in `mode`.
    ///
    /// An unsupported language is rejected before anything else happens. Otherwise
    /// any running debuggee is shut down first.
    pub fn launch(&mut self, request: LaunchRequest, mode: LaunchMode) -> HubResult<()> {
        if self.config.passive {
            return Err(HubError::PassiveMode);
        }
        let language = self.resolve_language(&request)?;

        self.teardown_interface();
        self.set_state(SessionState::Launching);

        let context = self.interface_context(&language, false);
        let Some(mut interface) = self.registry.create(&language, context) else {
            self.launch_failed(format!("no debugger interface for {language}"));
            return Err(HubError::UnsupportedLanguage(language));
        };

        let start = self.start_request(&request);
        let started = if request.for_project {
            interface.start_remote_for_project(&start)
        } else {
            interface.start_remote(&start)
        };

        match started {
            Ok(client) if client.process.is_some() => {
                info!(
                    %language,
                    script = %request.script.display(),
                    pid = ?client.process,
                    interpreter = %client.interpreter,
                    "Debuggee started"
                );
            }
            Ok(client) => {
                interface.shutdown();
                let reason = if client.interpreter.is_empty() {
                    format!("no interpreter configured for {language}")
                } else {
                    format!("{} could not be started", client.interpreter)
                };
                self.launch_failed(reason.clone());
                return Err(HubError::Start(reason));
            }
            Err(err) => {
                interface.shutdown();
                self.launch_failed(err.to_string());
                return Err(err);
            }
        }

        self.interface = Some(interface);
        self.language = Some(language);
        self.mode = Some(mode);
        self.launch_deadline = Instant::now().checked_add(self.config.launch_timeout());
        if self.launch_deadline.is_none() {
            warn!(
                timeout_secs = self.config.launch_timeout_secs,
                "Launch timeout out of range, waiting for the debuggee without a deadline"
            );
        }

        let environment = RemoteCommand::Environment { vars: request.environment.clone() };
        let command = request.command(mode);
        self.last_launch = Some((request, mode));
        self.send_store_command("", environment);
        self.send_store_command("", command);
        Ok(())
    }

    fn start_request(&self, request: &LaunchRequest) -> StartRequest {
        let (host, port) = match self.listen_addr {
            Some(addr) => (addr.ip().to_string(), addr.port()),
            None => (self.config.host.to_string(), self.config.port),
        };
        StartRequest {
            host,
            port,
            run_in_console: request.run_in_console,
            venv_name: request.venv_name.clone(),
            original_path: request.script.clone(),
            working_dir: request
                .working_dir
                .clone()
                .or_else(|| request.script.parent().map(PathBuf::from))
                .filter(|dir| !dir.as_os_str().is_empty()),
            config_override: request.config_override.clone(),
        }
    }

    /// Start a debugging session
    pub fn remote_load(&mut self, request: LaunchRequest) -> HubResult<()> {
        self.launch(request, LaunchMode::Debug)
    }

    /// Run a script without stopping
    pub fn remote_run(&mut self, request: LaunchRequest) -> HubResult<()> {
        self.launch(request, LaunchMode::Run)
    }

    /// Run a script under coverage
    pub fn remote_coverage(&mut self, request: LaunchRequest, erase: bool) -> HubResult<()> {
        self.launch(request, LaunchMode::Coverage { erase })
    }

    /// Run a script under the profiler
    pub fn remote_profile(&mut self, request: LaunchRequest, erase: bool) -> HubResult<()> {
        self.launch(request, LaunchMode::Profile { erase })
    }

    fn launch_failed(&mut self, reason: String) {
        warn!(%reason, "Launch failed");
        self.launch_deadline = None;
        self.set_state(SessionState::Idle);
        self.emit(HubEvent::LaunchFailed { reason });
    }

    /// Fails the pending launch if its deadline passed without a backend reporting.
    ///
    /// Returns whether the launch was abandoned.
    pub fn expire_launch(&mut self, now: Instant) -> bool {
        match self.launch_deadline {
            Some(deadline) if deadline <= now && self.state == SessionState::Launching => {
                self.teardown_interface();
                self.launch_failed(format!(
                    "no debuggee connected within {} seconds",
                    self.config.launch_timeout_secs
                ));
                true
            }
            _ => false,
        }
    }

    /// Shuts every debuggee down and returns to `Idle`.
    pub fn stop(&mut self) {
        if self.interface.is_none() && self.state == SessionState::Idle {
            return;
        }
        self.set_state(SessionState::Terminating);
        self.teardown_interface();
        self.set_state(SessionState::Idle);
    }

    /// Shuts the active interface down and forgets its sessions.
    fn teardown_interface(&mut self) {
        if let Some(mut interface) = self.interface.take() {
            debug!(language = ?self.language, "Shutting down debugger interface");
            interface.shutdown();
        }
        for debugger_id in std::mem::take(&mut self.sessions).into_keys() {
            self.emit(HubEvent::BackendDetached { debugger_id });
        }
        self.language = None;
        self.mode = None;
        self.launch_deadline = None;
        self.reported_break_errors.clear();
        self.reported_watch_errors.clear();
    }

    /// Re-issues the last launch, if any.
    fn relaunch(&mut self) {
        let Some((request, mode)) = self.last_launch.clone() else {
            return;
        };
        info!(script = %request.script.display(), "Relaunching debuggee");
        if let Err(err) = self.launch(request, mode) {
            warn!(%err, "Relaunch failed");
        }
    }

    /// Passes an admitted connection to the active interface.
    ///
    /// In passive mode the interface for the passive language is created on demand.
    pub fn accept_connection(&mut self, connection: BackendConnection) {
        if self.interface.is_none() {
            if !self.config.passive {
                warn!(peer = %connection.peer, "No active debugger interface, dropping connection");
                return;
            }
            let language = self.config.passive_language.clone();
            let context = self.interface_context(&language, true);
            let Some(interface) = self.registry.create(&language, context) else {
                warn!(
                    %language,
                    peer = %connection.peer,
                    "Passive language has no interface, dropping connection"
                );
                return;
            };
            info!(%language, "Created passive debugger interface");
            self.interface = Some(interface);
            self.language = Some(language);
            self.mode = Some(LaunchMode::Debug);
        }

        if let Some(interface) = self.interface.as_mut() {
            debug!(peer = %connection.peer, "Handing connection to debugger interface");
            interface.new_connection(connection);
        }
    }
}

#[cfg(test)]
mod tests;
