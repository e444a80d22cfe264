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

use std::{fmt::Display, path::PathBuf, str::FromStr};

use eyre::{bail, eyre, Error, Result};
use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// Trims a condition expression, mapping blank input to `None`.
pub(crate) fn normalize_condition(condition: &str) -> Option<String> {
    let trimmed = condition.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A line breakpoint in a debuggee source file.
///
/// The `(file_path, line_number)` pair is the identity of a breakpoint. Stores do not
/// enforce uniqueness of that pair; lookups return the first match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    /// Path to the source file.
    pub file_path: PathBuf,
    /// Line number in the source file (1-based).
    pub line_number: u32,
    /// Optional condition expression evaluated by the debuggee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Temporary breakpoints are cleared by the debuggee after the first hit.
    #[serde(default)]
    pub temporary: bool,
    /// Disabled breakpoints stay in the store but never trigger.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Number of hits to skip before the breakpoint triggers.
    #[serde(default)]
    pub ignore_count: u32,
}

impl Breakpoint {
    /// Creates an enabled, permanent, unconditional breakpoint.
    pub fn new(file_path: impl Into<PathBuf>, line_number: u32) -> Self {
        Self {
            file_path: file_path.into(),
            line_number,
            condition: None,
            temporary: false,
            enabled: true,
            ignore_count: 0,
        }
    }

    /// Attaches a condition. A blank condition clears it.
    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = normalize_condition(condition);
        self
    }

    /// Marks the breakpoint as temporary (or permanent).
    pub fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the ignore count.
    pub fn with_ignore_count(mut self, ignore_count: u32) -> Self {
        self.ignore_count = ignore_count;
        self
    }

    /// Returns the `(file, line)` identity of this breakpoint.
    pub fn location(&self) -> (PathBuf, u32) {
        (self.file_path.clone(), self.line_number)
    }

    /// Update the condition of the breakpoint.
    pub fn set_condition(&mut self, condition: &str) {
        self.condition = normalize_condition(condition);
    }
}

impl Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file_path.display(), self.line_number)?;
        if let Some(cond) = &self.condition {
            write!(f, " if {cond}")?;
        }
        Ok(())
    }
}

impl FromStr for Breakpoint {
    type Err = Error;

    /// Parses a breakpoint from a string.
    /// Format: `<path>:<line> [if <condition>]`
    /// Examples:
    /// - `src/app.py:42`
    /// - `src/app.py:42 if counter > 3`
    /// - `C:\work\app.py:7` (only the last colon separates the line number)
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("Empty breakpoint specification");
        }

        let (loc_str, condition) = match trimmed.find(" if ") {
            Some(if_pos) => (trimmed[..if_pos].trim(), normalize_condition(&trimmed[if_pos + 4..])),
            None => (trimmed, None),
        };

        let (path, line) = loc_str.rsplit_once(':').ok_or_else(|| {
            eyre!("Invalid breakpoint format. Expected <path>:<line> [if <condition>], got: {s}")
        })?;
        if path.is_empty() {
            bail!("Breakpoint file path is empty");
        }
        let line_number =
            line.trim().parse::<u32>().map_err(|e| eyre!("Invalid line number: {e}"))?;
        if line_number == 0 {
            bail!("Line numbers are 1-based, got 0");
        }

        Ok(Self { condition, ..Self::new(path, line_number) })
    }
}
