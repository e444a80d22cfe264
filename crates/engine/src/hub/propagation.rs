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

//! Keeping attached backends in sync with the breakpoint and watchpoint stores.
//!
//! A changed entry is always retracted before its new version is sent, so no
//! backend ever holds a half-updated breakpoint.

use debughub_common::{Breakpoint, Watchpoint};
use tracing::debug;

use super::{DebugServer, SessionState};
use crate::{
    protocol::RemoteCommand,
    store::{BreakpointStore, StoreEvent, WatchpointStore},
};

impl DebugServer {
    /// Runs `edit` against the breakpoint store and propagates the result.
    pub fn edit_breakpoints<R>(&mut self, edit: impl FnOnce(&mut BreakpointStore) -> R) -> R {
        let result = edit(&mut self.breakpoints);
        self.drain_store_events();
        result
    }

    /// Runs `edit` against the watchpoint store and propagates the result.
    pub fn edit_watchpoints<R>(&mut self, edit: impl FnOnce(&mut WatchpointStore) -> R) -> R {
        let result = edit(&mut self.watchpoints);
        self.drain_store_events();
        result
    }

    fn drain_store_events(&mut self) {
        while let Ok(event) = self.breakpoint_events.try_recv() {
            self.on_breakpoint_event(event);
        }
        while let Ok(event) = self.watchpoint_events.try_recv() {
            self.on_watchpoint_event(event);
        }
    }

    fn on_breakpoint_event(&mut self, event: StoreEvent<Breakpoint>) {
        let debugging = self.state == SessionState::Debugging;
        match event {
            StoreEvent::BeforeChange { old, .. } | StoreEvent::BeforeRemove { old, .. } => {
                for breakpoint in old {
                    self.reported_break_errors.remove(&breakpoint.location());
                    if debugging {
                        self.send_store_command("", RemoteCommand::clear_breakpoint(&breakpoint));
                    }
                }
            }
            StoreEvent::Inserted { entries, .. } | StoreEvent::AfterChange { new: entries, .. } => {
                if debugging {
                    for breakpoint in &entries {
                        self.push_breakpoint("", breakpoint);
                    }
                }
            }
            StoreEvent::Removed { .. } => {}
        }
    }

    fn on_watchpoint_event(&mut self, event: StoreEvent<Watchpoint>) {
        let debugging = self.state == SessionState::Debugging;
        match event {
            StoreEvent::BeforeChange { old, .. } | StoreEvent::BeforeRemove { old, .. } => {
                for watchpoint in old {
                    self.reported_watch_errors.remove(&watchpoint.key());
                    if debugging {
                        self.send_store_command("", RemoteCommand::clear_watchpoint(&watchpoint));
                    }
                }
            }
            StoreEvent::Inserted { entries, .. } | StoreEvent::AfterChange { new: entries, .. } => {
                if debugging {
                    for watchpoint in &entries {
                        self.push_watchpoint("", watchpoint);
                    }
                }
            }
            StoreEvent::Removed { .. } => {}
        }
    }

    /// Sends a breakpoint with its enabled flag and ignore count.
    fn push_breakpoint(&mut self, debugger_id: &str, breakpoint: &Breakpoint) {
        self.send_store_command(debugger_id, RemoteCommand::set_breakpoint(breakpoint));
        if !breakpoint.enabled {
            self.send_store_command(
                debugger_id,
                RemoteCommand::BreakpointEnable {
                    file: breakpoint.file_path.clone(),
                    line: breakpoint.line_number,
                    enable: false,
                },
            );
        }
        if breakpoint.ignore_count > 0 {
            self.send_store_command(
                debugger_id,
                RemoteCommand::BreakpointIgnore {
                    file: breakpoint.file_path.clone(),
                    line: breakpoint.line_number,
                    count: breakpoint.ignore_count,
                },
            );
        }
    }

    /// Sends a watch expression with its enabled flag and ignore count.
    fn push_watchpoint(&mut self, debugger_id: &str, watchpoint: &Watchpoint) {
        self.send_store_command(debugger_id, RemoteCommand::set_watchpoint(watchpoint));
        if !watchpoint.enabled {
            let condition = watchpoint.condition();
            self.send_store_command(
                debugger_id,
                RemoteCommand::WatchpointEnable { condition, enable: false },
            );
        }
        if watchpoint.ignore_count > 0 {
            self.send_store_command(
                debugger_id,
                RemoteCommand::WatchpointIgnore {
                    condition: watchpoint.condition(),
                    count: watchpoint.ignore_count,
                },
            );
        }
    }

    /// Sends the whole store content to one newly attached backend.
    pub(super) fn replay(&mut self, debugger_id: &str) {
        debug!(
            debugger_id,
            breakpoints = self.breakpoints.len(),
            watchpoints = self.watchpoints.len(),
            "Replaying breakpoints and watch expressions"
        );
        for breakpoint in self.breakpoints.get_all() {
            self.push_breakpoint(debugger_id, &breakpoint);
        }
        for watchpoint in self.watchpoints.get_all() {
            self.push_watchpoint(debugger_id, &watchpoint);
        }
        if !self.config.multiprocess_no_debug.is_empty() {
            let patterns = self.config.multiprocess_no_debug.clone();
            self.send_store_command(debugger_id, RemoteCommand::NoDebugList { patterns });
        }
    }

    /// Sends a command the user did not issue directly; a missing interface is not an error.
    pub(super) fn send_store_command(&mut self, debugger_id: &str, command: RemoteCommand) {
        match self.interface.as_mut() {
            Some(interface) => interface.send(debugger_id, command),
            None => debug!(debugger_id, ?command, "No debugger interface, command dropped"),
        }
    }
}
