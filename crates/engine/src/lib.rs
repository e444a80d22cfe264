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

//! Debugger coordination engine.
//!
//! The [`DebugServer`] hub owns the breakpoint and watch expression stores,
//! picks a [`DebuggerInterface`] per language from the [`InterfaceRegistry`]
//! and multiplexes any number of attached debuggees. [`HubRuntime`] drives it
//! on tokio.

pub mod adapters;

pub mod config;
pub use config::*;

pub mod error;
pub use error::*;

pub mod hub;
pub use hub::*;

pub mod interface;
pub use interface::*;

pub mod protocol;
pub use protocol::*;

pub mod registry;
pub use registry::*;

pub mod runtime;
pub use runtime::*;

pub mod store;
pub use store::*;

#[cfg(test)]
mod test_utils;
