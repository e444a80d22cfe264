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

use tracing::debug;

use super::DebugServer;
use crate::{
    error::{HubError, HubResult},
    protocol::HubRequest,
};

impl DebugServer {
    /// Dispatches one front-end request.
    ///
    /// Store edits at invalid positions are ignored; everything else reports
    /// failures through the returned error.
    pub fn handle_request(&mut self, request: HubRequest) -> HubResult<()> {
        debug!(?request, "Front-end request");
        match request {
            HubRequest::Load { request } => self.remote_load(request),
            HubRequest::Run { request } => self.remote_run(request),
            HubRequest::Coverage { request, erase } => self.remote_coverage(request, erase),
            HubRequest::Profile { request, erase } => self.remote_profile(request, erase),
            HubRequest::Stop => {
                self.stop();
                Ok(())
            }

            HubRequest::AddBreakpoint { breakpoint } => {
                self.edit_breakpoints(|store| store.add(breakpoint));
                Ok(())
            }
            HubRequest::SetBreakpoint { position, breakpoint } => {
                self.edit_breakpoints(|store| store.set_at(position, breakpoint));
                Ok(())
            }
            HubRequest::EnableBreakpoint { position, enabled } => {
                self.edit_breakpoints(|store| store.set_enabled_at(position, enabled));
                Ok(())
            }
            HubRequest::SetBreakpointCondition { position, condition } => {
                self.edit_breakpoints(|store| store.set_condition_at(position, &condition));
                Ok(())
            }
            HubRequest::SetBreakpointTemporary { position, temporary } => {
                self.edit_breakpoints(|store| store.set_temporary_at(position, temporary));
                Ok(())
            }
            HubRequest::IgnoreBreakpoint { position, count } => {
                self.edit_breakpoints(|store| store.set_ignore_count_at(position, count));
                Ok(())
            }
            HubRequest::DeleteBreakpoints { positions } => {
                self.edit_breakpoints(|store| store.delete_batch(&positions));
                Ok(())
            }
            HubRequest::ClearBreakpoints => {
                self.edit_breakpoints(|store| store.delete_all());
                Ok(())
            }

            HubRequest::AddWatchpoint { watchpoint } => {
                self.edit_watchpoints(|store| store.add(watchpoint));
                Ok(())
            }
            HubRequest::SetWatchpoint { position, watchpoint } => {
                self.edit_watchpoints(|store| store.set_at(position, watchpoint));
                Ok(())
            }
            HubRequest::EnableWatchpoint { position, enabled } => {
                self.edit_watchpoints(|store| store.set_enabled_at(position, enabled));
                Ok(())
            }
            HubRequest::IgnoreWatchpoint { position, count } => {
                self.edit_watchpoints(|store| store.set_ignore_count_at(position, count));
                Ok(())
            }
            HubRequest::DeleteWatchpoints { positions } => {
                self.edit_watchpoints(|store| store.delete_batch(&positions));
                Ok(())
            }
            HubRequest::ClearWatchpoints => {
                self.edit_watchpoints(|store| store.delete_all());
                Ok(())
            }

            HubRequest::Step { debugger_id } => self.remote_step(&debugger_id),
            HubRequest::StepOver { debugger_id } => self.remote_step_over(&debugger_id),
            HubRequest::StepOut { debugger_id } => self.remote_step_out(&debugger_id),
            HubRequest::StepQuit { debugger_id } => self.remote_step_quit(&debugger_id),
            HubRequest::Continue { debugger_id, special } => {
                self.remote_continue(&debugger_id, special)
            }
            HubRequest::ContinueUntil { debugger_id, line } => {
                self.remote_continue_until(&debugger_id, line)
            }
            HubRequest::MoveIp { debugger_id, line } => self.remote_move_ip(&debugger_id, line),
            HubRequest::RawInput { debugger_id, input } => {
                self.remote_raw_input(&debugger_id, input)
            }
            HubRequest::ThreadList { debugger_id } => self.remote_thread_list(&debugger_id),
            HubRequest::SetThread { debugger_id, thread_id } => {
                self.remote_set_thread(&debugger_id, thread_id)
            }
            HubRequest::Stack { debugger_id } => self.remote_client_stack(&debugger_id),
            HubRequest::Variables { debugger_id, global, frame } => {
                self.remote_client_variables(&debugger_id, global, frame)
            }
            HubRequest::Variable { debugger_id, global, path, frame } => {
                self.remote_client_variable(&debugger_id, global, path, frame)
            }
            HubRequest::Disassembly { debugger_id } => {
                self.remote_client_disassembly(&debugger_id)
            }
            HubRequest::SetFilter { debugger_id, global, filter } => {
                self.remote_client_set_filter(&debugger_id, global, filter)
            }
            HubRequest::CallTrace { debugger_id, enabled } => {
                self.set_call_trace_enabled(&debugger_id, enabled)
            }
            HubRequest::Banner { debugger_id } => self.remote_banner(&debugger_id),
            HubRequest::Capabilities { debugger_id } => self.remote_capabilities(&debugger_id),
            HubRequest::Completion { debugger_id, text } => {
                self.remote_completion(&debugger_id, text)
            }
            HubRequest::Statement { debugger_id, statement } => {
                self.remote_statement(&debugger_id, statement)
            }
            HubRequest::Environment { debugger_id, vars } => {
                self.remote_environment(&debugger_id, vars)
            }
            HubRequest::NoDebugList { debugger_id, patterns } => {
                self.remote_no_debug_list(&debugger_id, patterns)
            }

            HubRequest::ResolveConnection { ticket, accept } => {
                self.resolve_admission(ticket, accept)
                    .map(|_| ())
                    .ok_or(HubError::UnknownTicket(ticket))
            }
        }
    }
}
