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

//! User-issued commands, multiplexed by backend id.
//!
//! An empty `debugger_id` broadcasts to every attached backend.

use std::{collections::BTreeMap, path::PathBuf};

use tracing::debug;

use super::DebugServer;
use crate::{
    error::{HubError, HubResult},
    protocol::RemoteCommand,
};

impl DebugServer {
    fn send_user_command(&mut self, debugger_id: &str, command: RemoteCommand) -> HubResult<()> {
        if !debugger_id.is_empty() && !self.sessions.contains_key(debugger_id) {
            return Err(HubError::UnknownBackend(debugger_id.to_string()));
        }
        let Some(interface) = self.interface.as_mut() else {
            debug!(debugger_id, ?command, "No debugger interface, command dropped");
            return Err(HubError::NoInterface);
        };
        interface.send(debugger_id, command);
        Ok(())
    }

    /// Step into
    pub fn remote_step(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::Step)
    }

    /// Step over
    pub fn remote_step_over(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::StepOver)
    }

    /// Step out of the current frame
    pub fn remote_step_out(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::StepOut)
    }

    /// Quit the debuggee
    pub fn remote_step_quit(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::StepQuit)
    }

    /// Resume; `special` skips watch expressions
    pub fn remote_continue(&mut self, debugger_id: &str, special: bool) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::Continue { special })
    }

    /// Resume until `line` of the current file
    pub fn remote_continue_until(&mut self, debugger_id: &str, line: u32) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::ContinueUntil { line })
    }

    /// Move the instruction pointer to `line`
    pub fn remote_move_ip(&mut self, debugger_id: &str, line: u32) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::MoveIp { line })
    }

    /// Set or clear a breakpoint directly, bypassing the store
    pub fn remote_breakpoint(
        &mut self,
        debugger_id: &str,
        file: PathBuf,
        line: u32,
        set: bool,
        condition: Option<String>,
        temporary: bool,
    ) -> HubResult<()> {
        self.send_user_command(
            debugger_id,
            RemoteCommand::Breakpoint { file, line, set, condition, temporary },
        )
    }

    /// Enable or disable a breakpoint directly
    pub fn remote_breakpoint_enable(
        &mut self,
        debugger_id: &str,
        file: PathBuf,
        line: u32,
        enable: bool,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::BreakpointEnable { file, line, enable })
    }

    /// Set the ignore count of a breakpoint directly
    pub fn remote_breakpoint_ignore(
        &mut self,
        debugger_id: &str,
        file: PathBuf,
        line: u32,
        count: u32,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::BreakpointIgnore { file, line, count })
    }

    /// Set or clear a watch expression directly; `condition` is the composite form
    pub fn remote_watchpoint(
        &mut self,
        debugger_id: &str,
        condition: String,
        set: bool,
        temporary: bool,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::Watchpoint { condition, set, temporary })
    }

    /// Enable or disable a watch expression directly
    pub fn remote_watchpoint_enable(
        &mut self,
        debugger_id: &str,
        condition: String,
        enable: bool,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::WatchpointEnable { condition, enable })
    }

    /// Set the ignore count of a watch expression directly
    pub fn remote_watchpoint_ignore(
        &mut self,
        debugger_id: &str,
        condition: String,
        count: u32,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::WatchpointIgnore { condition, count })
    }

    /// Answer a raw input request
    pub fn remote_raw_input(&mut self, debugger_id: &str, input: String) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::RawInput { input })
    }

    /// Request the thread list
    pub fn remote_thread_list(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::ThreadList)
    }

    /// Switch the current thread
    pub fn remote_set_thread(&mut self, debugger_id: &str, thread_id: u64) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::SetThread { thread_id })
    }

    /// Request the call stack
    pub fn remote_client_stack(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::ClientStack)
    }

    /// Request the variables of `frame`
    pub fn remote_client_variables(
        &mut self,
        debugger_id: &str,
        global: bool,
        frame: usize,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::ClientVariables { global, frame })
    }

    /// Request the members of the variable at `path`
    pub fn remote_client_variable(
        &mut self,
        debugger_id: &str,
        global: bool,
        path: Vec<String>,
        frame: usize,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::ClientVariable { global, path, frame })
    }

    /// Request a disassembly of the current frame
    pub fn remote_client_disassembly(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::ClientDisassembly)
    }

    /// Set the variable type filter
    pub fn remote_client_set_filter(
        &mut self,
        debugger_id: &str,
        global: bool,
        filter: String,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::SetFilter { global, filter })
    }

    /// Enable or disable call tracing
    pub fn set_call_trace_enabled(&mut self, debugger_id: &str, enabled: bool) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::CallTrace { enabled })
    }

    /// Request the backend banner
    pub fn remote_banner(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::Banner)
    }

    /// Request the backend capabilities
    pub fn remote_capabilities(&mut self, debugger_id: &str) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::Capabilities)
    }

    /// Request completions for `text`
    pub fn remote_completion(&mut self, debugger_id: &str, text: String) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::Completion { text })
    }

    /// Execute `statement` in the current frame
    pub fn remote_statement(&mut self, debugger_id: &str, statement: String) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::Statement { statement })
    }

    /// Send environment variables
    pub fn remote_environment(
        &mut self,
        debugger_id: &str,
        vars: BTreeMap<String, String>,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::Environment { vars })
    }

    /// Send the list of programs child processes must not debug
    pub fn remote_no_debug_list(
        &mut self,
        debugger_id: &str,
        patterns: Vec<String>,
    ) -> HubResult<()> {
        self.send_user_command(debugger_id, RemoteCommand::NoDebugList { patterns })
    }
}
