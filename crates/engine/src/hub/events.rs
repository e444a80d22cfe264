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

//! Translation of backend events into session bookkeeping and front-end events.

use debughub_common::{WatchTrigger, Watchpoint};
use tracing::{debug, info, warn};

use super::{BackendSession, DebugServer, SessionState};
use crate::protocol::{BackendEvent, HubEvent, InterfaceEvent, LaunchMode};

impl DebugServer {
    /// Processes one event reported by the active interface.
    pub fn handle_interface_event(&mut self, event: InterfaceEvent) {
        let InterfaceEvent { generation, debugger_id, event } = event;
        if self.interface.is_none() || generation != self.interface_generation {
            debug!(generation, %debugger_id, ?event, "Dropping event of a replaced interface");
            return;
        }

        if matches!(
            event,
            BackendEvent::DebuggerId { .. }
                | BackendEvent::Banner { .. }
                | BackendEvent::Capabilities { .. }
                | BackendEvent::PassiveStartup { .. }
        ) {
            self.backend_reported();
        }

        match event {
            BackendEvent::DebuggerId { debugger_id: reported } => {
                let debugger_id = if reported.is_empty() { debugger_id } else { reported };
                self.attach_session(debugger_id);
            }
            BackendEvent::Banner { version, platform, interpreter } => {
                self.emit(HubEvent::ClientBanner { debugger_id, version, platform, interpreter });
            }
            BackendEvent::Capabilities { capabilities, language } => {
                if let Some(session) = self.sessions.get_mut(&debugger_id) {
                    session.capabilities = capabilities;
                }
                self.emit(HubEvent::ClientCapabilities { debugger_id, capabilities, language });
            }
            BackendEvent::Output { text, stderr } => {
                self.emit(HubEvent::ClientOutput { debugger_id, text, stderr });
            }
            BackendEvent::Line { file, line } => {
                self.emit(HubEvent::ClientLine { debugger_id, file, line });
            }
            BackendEvent::Stack { frames } => {
                self.emit(HubEvent::ClientStack { debugger_id, frames });
            }
            BackendEvent::ThreadList { current, threads } => {
                self.emit(HubEvent::ClientThreadList { debugger_id, current, threads });
            }
            BackendEvent::ThreadSet => self.emit(HubEvent::ClientThreadSet { debugger_id }),
            BackendEvent::Variables { global, variables } => {
                self.emit(HubEvent::ClientVariables { debugger_id, global, variables });
            }
            BackendEvent::Variable { global, path, variables } => {
                self.emit(HubEvent::ClientVariable { debugger_id, global, path, variables });
            }
            BackendEvent::Statement { more } => {
                self.emit(HubEvent::ClientStatement { debugger_id, more });
            }
            BackendEvent::Disassembly { lines } => {
                self.emit(HubEvent::ClientDisassembly { debugger_id, lines });
            }
            BackendEvent::Exception { exception_type, message, stack } => {
                self.emit(HubEvent::ClientException {
                    debugger_id,
                    exception_type,
                    message,
                    stack,
                });
            }
            BackendEvent::SyntaxError { message, file, line, column } => {
                let in_main_script = self
                    .last_launch
                    .as_ref()
                    .is_some_and(|(request, _)| request.script == file);
                self.emit(HubEvent::ClientSyntaxError { debugger_id, message, file, line, column });
                if in_main_script || self.state == SessionState::Launching {
                    info!("Syntax error in the main script, ending the session");
                    self.stop();
                }
            }
            BackendEvent::Signal { message, file, line, function } => {
                self.emit(HubEvent::ClientSignal { debugger_id, message, file, line, function });
            }
            BackendEvent::Exit { status, message } => {
                if let Some(session) = self.sessions.get_mut(&debugger_id) {
                    session.exit_reported = true;
                }
                self.emit(HubEvent::ClientExit { debugger_id, status, message, unplanned: false });
            }
            BackendEvent::ClearBreak { file, line } => {
                let key = (file, line);
                self.edit_breakpoints(|store| match store.find_index(&key) {
                    Some(position) => {
                        store.delete_at(position);
                    }
                    None => debug!(?key, "Temporary breakpoint already gone"),
                });
            }
            BackendEvent::BreakConditionError { file, line } => {
                if self.reported_break_errors.insert((file.clone(), line)) {
                    self.emit(HubEvent::BreakConditionError { debugger_id, file, line });
                } else {
                    debug!(
                        file = %file.display(),
                        line,
                        "Breakpoint condition error already reported"
                    );
                }
            }
            BackendEvent::ClearWatch { condition } => {
                let key = Watchpoint::from_condition(&condition).key();
                self.edit_watchpoints(|store| match store.find_index(&key) {
                    Some(position) => {
                        store.delete_at(position);
                    }
                    None => debug!(?key, "Temporary watch expression already gone"),
                });
            }
            BackendEvent::WatchConditionError { condition } => {
                let key: (String, WatchTrigger) = WatchTrigger::split_condition(&condition);
                if self.reported_watch_errors.insert(key) {
                    self.emit(HubEvent::WatchConditionError { debugger_id, condition });
                } else {
                    debug!(%condition, "Watch expression error already reported");
                }
            }
            BackendEvent::RawInput { prompt, echo } => {
                self.emit(HubEvent::ClientRawInput { debugger_id, prompt, echo });
            }
            BackendEvent::Completion { completions, text } => {
                self.emit(HubEvent::ClientCompletionList { debugger_id, completions, text });
            }
            BackendEvent::CallTrace { is_call, from, to } => {
                self.emit(HubEvent::ClientCallTrace { debugger_id, is_call, from, to });
            }
            BackendEvent::PassiveStartup { file, exceptions } => {
                self.emit(HubEvent::PassiveDebugStarted { debugger_id, file, exceptions });
            }
            BackendEvent::Disconnected => self.detach_session(debugger_id),
        }
    }

    /// A backend spoke for the first time since the launch or since going idle.
    fn backend_reported(&mut self) {
        match self.state {
            SessionState::Launching => {
                self.launch_deadline = None;
                let state = match self.mode {
                    Some(mode) if !mode.is_debug() => SessionState::RunningNoStop,
                    _ => SessionState::Debugging,
                };
                self.set_state(state);
            }
            SessionState::Idle if self.config.passive && self.interface.is_some() => {
                self.mode = Some(LaunchMode::Debug);
                self.set_state(SessionState::Debugging);
            }
            _ => {}
        }
    }

    fn attach_session(&mut self, debugger_id: String) {
        if debugger_id.is_empty() {
            warn!("Backend reported an empty debugger id");
            return;
        }
        if self.sessions.contains_key(&debugger_id) {
            debug!(%debugger_id, "Backend identified itself again");
            return;
        }

        let language = self.language.clone().unwrap_or_default();
        let capabilities = self.registry.capabilities_of(&language);
        info!(%debugger_id, %language, "Backend attached");
        self.sessions.insert(
            debugger_id.clone(),
            BackendSession { language, capabilities, exit_reported: false },
        );
        self.emit(HubEvent::NewBackendAttached { debugger_id: debugger_id.clone() });

        if self.state == SessionState::Debugging {
            self.replay(&debugger_id);
        }
    }

    fn detach_session(&mut self, debugger_id: String) {
        let Some(session) = self.sessions.remove(&debugger_id) else {
            debug!(%debugger_id, "Connection closed before identifying itself");
            return;
        };
        info!(%debugger_id, "Backend detached");
        self.emit(HubEvent::BackendDetached { debugger_id: debugger_id.clone() });
        if !session.exit_reported {
            self.emit(HubEvent::ClientExit {
                debugger_id,
                status: -1,
                message: "connection closed unexpectedly".to_string(),
                unplanned: true,
            });
        }

        if !self.sessions.is_empty() {
            return;
        }

        info!("Last backend exited");
        self.emit(HubEvent::LastClientExited);
        if self.config.passive {
            // The passive interface stays up for the next inbound debuggee.
            self.reported_break_errors.clear();
            self.reported_watch_errors.clear();
            self.set_state(SessionState::Idle);
            return;
        }

        self.stop();
        if self.config.auto_relaunch {
            self.relaunch();
        }
    }
}
