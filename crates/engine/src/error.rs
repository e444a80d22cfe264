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

//! Errors returned by the hub and its collaborators.

use thiserror::Error;

/// Errors that can occur while coordinating debugger backends.
///
/// Store misuse (out-of-range positions) is never an error: those calls are no-ops.
#[derive(Debug, Error)]
pub enum HubError {
    /// No interface is registered for the resolved language
    #[error("no debugger interface registered for language '{0}'")]
    UnsupportedLanguage(String),

    /// The hub waits for inbound connections and never spawns debuggees
    #[error("hub is in passive mode; launching is disabled")]
    PassiveMode,

    /// A user-issued command arrived while no interface is active
    #[error("no debugger interface is active")]
    NoInterface,

    /// A targeted command named a backend that is not attached
    #[error("no backend session with id '{0}'")]
    UnknownBackend(String),

    /// An admission decision referenced a ticket that is not pending
    #[error("no pending connection with ticket {0}")]
    UnknownTicket(u64),

    /// The interface event stream was already handed to another runtime
    #[error("hub is already driven by a runtime")]
    AlreadyRunning,

    /// The debuggee could not be started
    #[error("failed to start debuggee: {0}")]
    Start(String),

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(eyre::Report),

    /// Socket or process I/O failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias for hub results.
pub type HubResult<T> = Result<T, HubError>;
