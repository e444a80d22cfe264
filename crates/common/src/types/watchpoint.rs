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

//! Watch expressions and their composite wire condition.
//!
//! Debuggees receive a watch expression as a single condition string. A special
//! trigger is encoded as a trailing marker:
//!
//! | trigger    | wire condition           |
//! |------------|--------------------------|
//! | `None`     | `x == 1`                 |
//! | `OnCreate` | `x == 1 ??created??`     |
//! | `OnChange` | `x == 1 ??changed??`     |

use std::fmt::Display;

use serde::{Deserialize, Serialize};

const CREATED_MARKER: &str = " ??created??";
const CHANGED_MARKER: &str = " ??changed??";

fn default_enabled() -> bool {
    true
}

/// Special trigger of a watch expression.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WatchTrigger {
    /// Break whenever the expression evaluates to true.
    #[default]
    None,
    /// Break when the watched variable is created.
    OnCreate,
    /// Break when the watched variable changes.
    OnChange,
}

impl WatchTrigger {
    fn marker(self) -> &'static str {
        match self {
            Self::None => "",
            Self::OnCreate => CREATED_MARKER,
            Self::OnChange => CHANGED_MARKER,
        }
    }

    /// Builds the composite wire condition for `expression`.
    pub fn compose(self, expression: &str) -> String {
        format!("{expression}{}", self.marker())
    }

    /// Splits a composite wire condition into its expression and trigger.
    pub fn split_condition(condition: &str) -> (String, Self) {
        if let Some(expression) = condition.strip_suffix(CREATED_MARKER) {
            (expression.to_string(), Self::OnCreate)
        } else if let Some(expression) = condition.strip_suffix(CHANGED_MARKER) {
            (expression.to_string(), Self::OnChange)
        } else {
            (condition.to_string(), Self::None)
        }
    }
}

impl Display for WatchTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::OnCreate => write!(f, "created"),
            Self::OnChange => write!(f, "changed"),
        }
    }
}

/// A watch expression. Its identity is the `(expression, trigger)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Watchpoint {
    /// Expression evaluated by the debuggee.
    pub expression: String,
    /// Special trigger.
    #[serde(default)]
    pub trigger: WatchTrigger,
    /// Temporary watchpoints are cleared by the debuggee after the first hit.
    #[serde(default)]
    pub temporary: bool,
    /// Disabled watchpoints stay in the store but never trigger.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Number of hits to skip before the watchpoint triggers.
    #[serde(default)]
    pub ignore_count: u32,
}

impl Watchpoint {
    /// Creates an enabled, permanent watchpoint without a special trigger.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            trigger: WatchTrigger::None,
            temporary: false,
            enabled: true,
            ignore_count: 0,
        }
    }

    /// Rebuilds a watchpoint from a composite wire condition.
    pub fn from_condition(condition: &str) -> Self {
        let (expression, trigger) = WatchTrigger::split_condition(condition);
        Self::new(expression).with_trigger(trigger)
    }

    /// Sets the special trigger.
    pub fn with_trigger(mut self, trigger: WatchTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Marks the watchpoint as temporary (or permanent).
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

    /// Returns the `(expression, trigger)` identity of this watchpoint.
    pub fn key(&self) -> (String, WatchTrigger) {
        (self.expression.clone(), self.trigger)
    }

    /// Returns the composite condition sent to debuggees.
    pub fn condition(&self) -> String {
        self.trigger.compose(&self.expression)
    }
}

impl Display for Watchpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.condition())
    }
}
