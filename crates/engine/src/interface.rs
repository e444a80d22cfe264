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

//! The contract between the hub and a language specific debugger adapter.

use std::{net::SocketAddr, path::PathBuf};

use tokio::{net::TcpStream, sync::mpsc::UnboundedSender};

use crate::{
    error::HubResult,
    protocol::{BackendEvent, InterfaceEvent, RemoteCommand},
};

/// Channel on which an interface reports backend events to the hub.
///
/// Every event is stamped with the generation of the interface that owns the
/// sink, so events left in the channel by a replaced interface can be told apart.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: UnboundedSender<InterfaceEvent>,
}

impl EventSink {
    /// A sink stamping events with `generation`.
    pub fn new(generation: u64, tx: UnboundedSender<InterfaceEvent>) -> Self {
        Self { generation, tx }
    }

    /// Generation of the interface owning this sink
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reports `event` from `debugger_id`. Returns `false` once the hub is gone.
    pub fn send(&self, debugger_id: impl Into<String>, event: BackendEvent) -> bool {
        let event = InterfaceEvent::new(debugger_id, event).with_generation(self.generation);
        self.tx.send(event).is_ok()
    }
}

/// What an interface factory is given when the hub creates an interface.
#[derive(Debug, Clone)]
pub struct InterfaceContext {
    /// Language the interface serves
    pub language: String,
    /// The hub never asks this interface to spawn a debuggee
    pub passive: bool,
    /// Where to report backend events
    pub events: EventSink,
}

/// Parameters for starting a debuggee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartRequest {
    /// Hub listener address the debuggee must connect back to
    pub host: String,
    /// Hub listener port
    pub port: u16,
    /// Run the debuggee in a console window
    pub run_in_console: bool,
    /// Virtual environment to use
    pub venv_name: Option<String>,
    /// Script the user asked to start
    pub original_path: PathBuf,
    /// Working directory of the debuggee
    pub working_dir: Option<PathBuf>,
    /// Interface specific configuration override
    pub config_override: Option<String>,
}

/// Result of starting a debuggee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientStart {
    /// Process id of the started debuggee, `None` if nothing was started
    pub process: Option<u32>,
    /// Whether the debuggee connects over the network
    pub networked: bool,
    /// Interpreter used, empty if none is configured
    pub interpreter: String,
}

impl ClientStart {
    /// Outcome of a start that produced no process.
    pub fn not_started(interpreter: impl Into<String>) -> Self {
        Self { process: None, networked: false, interpreter: interpreter.into() }
    }
}

/// An accepted inbound connection from a debuggee.
#[derive(Debug)]
pub struct BackendConnection {
    /// The socket
    pub stream: TcpStream,
    /// Remote address
    pub peer: SocketAddr,
}

/// A live protocol adapter for one language.
///
/// Interfaces own the sockets and processes of their backends. They route
/// [`RemoteCommand`]s by backend id (an empty id means every backend) and report
/// everything the debuggees say through the [`EventSink`] they were created with,
/// ending each connection with a `Disconnected` event.
pub trait DebuggerInterface: Send {
    /// Starts a debuggee for a single script.
    fn start_remote(&mut self, request: &StartRequest) -> HubResult<ClientStart>;

    /// Starts a debuggee with the settings of the current project.
    fn start_remote_for_project(&mut self, request: &StartRequest) -> HubResult<ClientStart> {
        self.start_remote(request)
    }

    /// Takes ownership of an admitted inbound connection.
    fn new_connection(&mut self, connection: BackendConnection);

    /// Sends `command` to `debugger_id`, or to every backend when the id is empty.
    fn send(&mut self, debugger_id: &str, command: RemoteCommand);

    /// Kills the spawned debuggee and closes every connection.
    fn shutdown(&mut self);

    /// Whether at least one backend connection is open.
    fn is_connected(&self) -> bool;

    /// Ids of the backends that identified themselves.
    fn debugger_ids(&self) -> Vec<String>;
}
