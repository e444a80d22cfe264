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

use std::{
    fmt::Display,
    ops::{BitAnd, BitOr, BitOrAssign},
    str::FromStr,
};

use eyre::{bail, Error, Result};
use serde::{Deserialize, Serialize};

/// Feature bitset advertised by a language backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(u32);

impl Capabilities {
    /// No capabilities at all.
    pub const NONE: Self = Self(0);
    /// Interactive debugging.
    pub const DEBUGGER: Self = Self(1);
    /// Plain execution without stopping.
    pub const INTERPRETER: Self = Self(2);
    /// Profiling runs.
    pub const PROFILER: Self = Self(4);
    /// Coverage runs.
    pub const COVERAGE: Self = Self(8);
    /// Expression completion.
    pub const COMPLETER: Self = Self(16);
    /// Unit test execution.
    pub const UNITTEST: Self = Self(32);
    /// Interactive shell.
    pub const SHELL: Self = Self(64);
    /// Every known capability.
    pub const ALL: Self = Self(127);

    const NAMED: [(Self, &'static str); 7] = [
        (Self::DEBUGGER, "debugger"),
        (Self::INTERPRETER, "interpreter"),
        (Self::PROFILER, "profiler"),
        (Self::COVERAGE, "coverage"),
        (Self::COMPLETER, "completer"),
        (Self::UNITTEST, "unittest"),
        (Self::SHELL, "shell"),
    ];

    /// Raw bit value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Builds a set from raw bits, dropping unknown bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Returns true if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sets the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Names of the set capabilities, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl BitAnd for Capabilities {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Display for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", self.names().join("|"))
    }
}

impl FromStr for Capabilities {
    type Err = Error;

    /// Parses a comma (or `|`) separated list of capability names.
    /// `all` and `none` are accepted as shorthands.
    fn from_str(s: &str) -> Result<Self> {
        let mut caps = Self::NONE;
        for name in s.split([',', '|']).map(str::trim).filter(|n| !n.is_empty()) {
            let lower = name.to_ascii_lowercase();
            match lower.as_str() {
                "all" => caps |= Self::ALL,
                "none" => {}
                _ => match Self::NAMED.iter().find(|(_, n)| *n == lower) {
                    Some((flag, _)) => caps |= *flag,
                    None => bail!("Unknown capability: {name}"),
                },
            }
        }
        Ok(caps)
    }
}
