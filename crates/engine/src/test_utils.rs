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

//! Test helpers: an in-memory interface that records what the hub asks of it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::HubResult,
    interface::{BackendConnection, ClientStart, DebuggerInterface, InterfaceContext, StartRequest},
    protocol::RemoteCommand,
    registry::InterfaceFactory,
};

#[derive(Debug, Default)]
struct LogInner {
    commands: Vec<(String, RemoteCommand)>,
    starts: Vec<StartRequest>,
    connections: usize,
    shutdowns: usize,
}

/// Shared record of everything sent to recording interfaces.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandLog(Arc<Mutex<LogInner>>);

impl CommandLog {
    /// Drains the recorded `(debugger_id, command)` pairs.
    pub(crate) fn take(&self) -> Vec<(String, RemoteCommand)> {
        std::mem::take(&mut self.0.lock().commands)
    }

    pub(crate) fn starts(&self) -> usize {
        self.0.lock().starts.len()
    }

    pub(crate) fn connections(&self) -> usize {
        self.0.lock().connections
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.0.lock().shutdowns
    }
}

/// Interface that records commands instead of talking to a debuggee.
pub(crate) struct RecordingInterface {
    log: CommandLog,
    process: Option<u32>,
    connected: bool,
}

impl DebuggerInterface for RecordingInterface {
    fn start_remote(&mut self, request: &StartRequest) -> HubResult<ClientStart> {
        self.log.0.lock().starts.push(request.clone());
        Ok(ClientStart {
            process: self.process,
            networked: true,
            interpreter: if self.process.is_some() { "python3".to_string() } else { String::new() },
        })
    }

    fn new_connection(&mut self, _connection: BackendConnection) {
        self.connected = true;
        self.log.0.lock().connections += 1;
    }

    fn send(&mut self, debugger_id: &str, command: RemoteCommand) {
        self.log.0.lock().commands.push((debugger_id.to_string(), command));
    }

    fn shutdown(&mut self) {
        self.connected = false;
        self.log.0.lock().shutdowns += 1;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn debugger_ids(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Factory for interfaces whose debuggee always starts.
pub(crate) fn recording_factory(log: CommandLog) -> InterfaceFactory {
    Arc::new(move |_context: InterfaceContext| {
        Box::new(RecordingInterface { log: log.clone(), process: Some(4242), connected: false })
            as Box<dyn DebuggerInterface>
    })
}

/// Factory for interfaces that never manage to start a debuggee.
pub(crate) fn failing_factory(log: CommandLog) -> InterfaceFactory {
    Arc::new(move |_context: InterfaceContext| {
        Box::new(RecordingInterface { log: log.clone(), process: None, connected: false })
            as Box<dyn DebuggerInterface>
    })
}
