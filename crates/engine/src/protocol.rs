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

//! Message types exchanged between the hub, its interfaces and its front end.
//!
//! There are four directions of traffic:
//!
//! - [`RemoteCommand`]: hub to debuggee, through a `DebuggerInterface`
//! - [`BackendEvent`]: debuggee to hub, forwarded by an interface
//! - [`HubEvent`]: hub to front end, tagged with the originating backend id
//! - [`HubRequest`]: front end to hub
//!
//! All of them are plain serde enums. Interfaces choose their own wire encoding;
//! the hub itself never sees bytes.

use std::{collections::BTreeMap, net::IpAddr, path::PathBuf};

use debughub_common::{Breakpoint, Capabilities, Watchpoint};
use serde::{Deserialize, Serialize};

use crate::hub::SessionState;

/// One frame of a debuggee call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Source file of the frame
    pub file: PathBuf,
    /// Current line in `file`
    pub line: u32,
    /// Function name
    pub function: String,
    /// Formatted argument list
    #[serde(default)]
    pub args: String,
}

/// A debuggee thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    /// Thread id as reported by the debuggee
    pub id: u64,
    /// Thread name
    pub name: String,
    /// Whether the thread is currently running
    #[serde(default)]
    pub running: bool,
}

/// A variable as reported by the debuggee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableInfo {
    /// Variable name
    pub name: String,
    /// Type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Printable value
    pub value: String,
}

/// Command sent from the hub to one or all debuggees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum RemoteCommand {
    /// Load a script for debugging
    Load {
        /// Script to debug
        script: PathBuf,
        /// Command line arguments
        args: Vec<String>,
        /// Working directory of the debuggee
        working_dir: Option<PathBuf>,
        /// Also trace into the interpreter's own modules
        trace_interpreter: bool,
        /// Do not stop at the first line
        auto_continue: bool,
        /// Follow child processes
        enable_multiprocess: bool,
        /// Report call/return events
        enable_call_trace: bool,
    },
    /// Run a script without stopping
    Run {
        /// Script to run
        script: PathBuf,
        /// Command line arguments
        args: Vec<String>,
        /// Working directory of the debuggee
        working_dir: Option<PathBuf>,
    },
    /// Run a script under coverage measurement
    Coverage {
        /// Script to run
        script: PathBuf,
        /// Command line arguments
        args: Vec<String>,
        /// Working directory of the debuggee
        working_dir: Option<PathBuf>,
        /// Discard previously collected data
        erase: bool,
    },
    /// Run a script under the profiler
    Profile {
        /// Script to run
        script: PathBuf,
        /// Command line arguments
        args: Vec<String>,
        /// Working directory of the debuggee
        working_dir: Option<PathBuf>,
        /// Discard previously collected data
        erase: bool,
    },
    /// Environment variables applied before the script starts
    Environment {
        /// Variables to set
        vars: BTreeMap<String, String>,
    },
    /// Step into
    Step,
    /// Step over
    StepOver,
    /// Step out of the current frame
    StepOut,
    /// Quit the debuggee
    StepQuit,
    /// Resume execution
    Continue {
        /// Stop only at breakpoints, skipping watch expressions
        special: bool,
    },
    /// Resume until `line` in the current file is reached
    ContinueUntil {
        /// Target line
        line: u32,
    },
    /// Move the instruction pointer to `line`
    MoveIp {
        /// Target line
        line: u32,
    },
    /// Set or clear a breakpoint
    Breakpoint {
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
        /// `true` to set, `false` to clear
        set: bool,
        /// Condition expression
        condition: Option<String>,
        /// Clear after the first hit
        temporary: bool,
    },
    /// Enable or disable a breakpoint
    BreakpointEnable {
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
        /// New enabled flag
        enable: bool,
    },
    /// Set the ignore count of a breakpoint
    BreakpointIgnore {
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
        /// Hits to skip
        count: u32,
    },
    /// Set or clear a watch expression
    Watchpoint {
        /// Composite watch condition
        condition: String,
        /// `true` to set, `false` to clear
        set: bool,
        /// Clear after the first hit
        temporary: bool,
    },
    /// Enable or disable a watch expression
    WatchpointEnable {
        /// Composite watch condition
        condition: String,
        /// New enabled flag
        enable: bool,
    },
    /// Set the ignore count of a watch expression
    WatchpointIgnore {
        /// Composite watch condition
        condition: String,
        /// Hits to skip
        count: u32,
    },
    /// Answer to a pending raw input request
    RawInput {
        /// Text typed by the user
        input: String,
    },
    /// Request the thread list
    ThreadList,
    /// Switch the current thread
    SetThread {
        /// Thread to select
        thread_id: u64,
    },
    /// Request the current call stack
    ClientStack,
    /// Request the variables of a frame
    ClientVariables {
        /// Global rather than local scope
        global: bool,
        /// Frame index, 0 being the innermost
        frame: usize,
    },
    /// Request the members of one variable
    ClientVariable {
        /// Global rather than local scope
        global: bool,
        /// Access path from the scope to the variable
        path: Vec<String>,
        /// Frame index, 0 being the innermost
        frame: usize,
    },
    /// Request a disassembly of the current frame
    ClientDisassembly,
    /// Set the variable type filter
    SetFilter {
        /// Global rather than local scope
        global: bool,
        /// Filter expression
        filter: String,
    },
    /// Enable or disable call tracing
    CallTrace {
        /// New state
        enabled: bool,
    },
    /// Request the backend banner
    Banner,
    /// Request the backend capabilities
    Capabilities,
    /// Request completions for `text`
    Completion {
        /// Text to complete
        text: String,
    },
    /// Execute a statement in the current frame
    Statement {
        /// Statement source
        statement: String,
    },
    /// Programs that child processes must not debug
    NoDebugList {
        /// Program name patterns
        patterns: Vec<String>,
    },
}

impl RemoteCommand {
    /// Command that sets `breakpoint` in a debuggee.
    pub fn set_breakpoint(breakpoint: &Breakpoint) -> Self {
        Self::Breakpoint {
            file: breakpoint.file_path.clone(),
            line: breakpoint.line_number,
            set: true,
            condition: breakpoint.condition.clone(),
            temporary: breakpoint.temporary,
        }
    }

    /// Command that clears `breakpoint` in a debuggee.
    pub fn clear_breakpoint(breakpoint: &Breakpoint) -> Self {
        Self::Breakpoint {
            file: breakpoint.file_path.clone(),
            line: breakpoint.line_number,
            set: false,
            condition: None,
            temporary: false,
        }
    }

    /// Command that sets `watchpoint` in a debuggee.
    pub fn set_watchpoint(watchpoint: &Watchpoint) -> Self {
        Self::Watchpoint {
            condition: watchpoint.condition(),
            set: true,
            temporary: watchpoint.temporary,
        }
    }

    /// Command that clears `watchpoint` in a debuggee.
    pub fn clear_watchpoint(watchpoint: &Watchpoint) -> Self {
        Self::Watchpoint { condition: watchpoint.condition(), set: false, temporary: false }
    }
}

/// Event reported by a debuggee through its interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BackendEvent {
    /// The debuggee identified itself
    DebuggerId {
        /// Opaque backend id, unique per connection
        debugger_id: String,
    },
    /// Version banner
    Banner {
        /// Backend version
        version: String,
        /// Platform description
        platform: String,
        /// Interpreter description
        #[serde(default)]
        interpreter: String,
    },
    /// Capabilities of the backend
    Capabilities {
        /// Supported features
        capabilities: Capabilities,
        /// Language the backend debugs
        language: String,
    },
    /// Program output
    Output {
        /// Output text
        text: String,
        /// Whether the text was written to stderr
        #[serde(default)]
        stderr: bool,
    },
    /// Execution stopped at a line
    Line {
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
    },
    /// Current call stack
    Stack {
        /// Frames, innermost first
        frames: Vec<StackFrame>,
    },
    /// Thread list
    ThreadList {
        /// Id of the current thread
        current: u64,
        /// All threads
        threads: Vec<ThreadInfo>,
    },
    /// The current thread was switched
    ThreadSet,
    /// Variables of a frame
    Variables {
        /// Global rather than local scope
        global: bool,
        /// The variables
        variables: Vec<VariableInfo>,
    },
    /// Members of one variable
    Variable {
        /// Global rather than local scope
        global: bool,
        /// Access path of the variable
        path: Vec<String>,
        /// The members
        variables: Vec<VariableInfo>,
    },
    /// A statement finished executing
    Statement {
        /// The statement is incomplete and needs more input
        more: bool,
    },
    /// Disassembly of the current frame
    Disassembly {
        /// Disassembly listing
        lines: Vec<String>,
    },
    /// An exception was raised
    Exception {
        /// Exception type name
        exception_type: String,
        /// Exception message
        message: String,
        /// Stack at the raise point
        #[serde(default)]
        stack: Vec<StackFrame>,
    },
    /// The script could not be compiled
    SyntaxError {
        /// Error message
        message: String,
        /// File containing the error
        file: PathBuf,
        /// Line of the error
        line: u32,
        /// Column of the error
        #[serde(default)]
        column: u32,
    },
    /// A signal was caught
    Signal {
        /// Signal description
        message: String,
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
        /// Function name
        #[serde(default)]
        function: String,
    },
    /// The debuggee exited
    Exit {
        /// Exit status
        status: i32,
        /// Exit message
        #[serde(default)]
        message: String,
    },
    /// A temporary breakpoint was hit and cleared
    ClearBreak {
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
    },
    /// A breakpoint condition failed to evaluate
    BreakConditionError {
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
    },
    /// A temporary watch expression was hit and cleared
    ClearWatch {
        /// Composite watch condition
        condition: String,
    },
    /// A watch expression failed to evaluate
    WatchConditionError {
        /// Composite watch condition
        condition: String,
    },
    /// The debuggee waits for user input
    RawInput {
        /// Input prompt
        prompt: String,
        /// Whether typed text should be echoed
        #[serde(default = "default_echo")]
        echo: bool,
    },
    /// Completion candidates
    Completion {
        /// Candidates
        completions: Vec<String>,
        /// Text that was completed
        text: String,
    },
    /// A call or return was traced
    CallTrace {
        /// `true` for a call, `false` for a return
        is_call: bool,
        /// Caller location
        from: String,
        /// Callee location
        to: String,
    },
    /// A passively started debuggee is ready
    PassiveStartup {
        /// Script being debugged
        file: PathBuf,
        /// Whether exception reporting is active
        #[serde(default)]
        exceptions: bool,
    },
    /// The connection of this backend closed
    Disconnected,
}

fn default_echo() -> bool {
    true
}

/// An event tagged with the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEvent {
    /// Generation of the interface that reported the event
    pub generation: u64,
    /// Backend id; empty until the connection identified itself
    pub debugger_id: String,
    /// The event
    pub event: BackendEvent,
}

impl InterfaceEvent {
    /// Tags `event` with `debugger_id`, generation `0`.
    pub fn new(debugger_id: impl Into<String>, event: BackendEvent) -> Self {
        Self { generation: 0, debugger_id: debugger_id.into(), event }
    }

    /// Sets the interface generation.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}

/// Notification from the hub to its front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HubEvent {
    /// Program output
    ClientOutput {
        /// Originating backend
        debugger_id: String,
        /// Output text
        text: String,
        /// Written to stderr
        stderr: bool,
    },
    /// Execution stopped at a line
    ClientLine {
        /// Originating backend
        debugger_id: String,
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
    },
    /// Current call stack
    ClientStack {
        /// Originating backend
        debugger_id: String,
        /// Frames, innermost first
        frames: Vec<StackFrame>,
    },
    /// An exception was raised
    ClientException {
        /// Originating backend
        debugger_id: String,
        /// Exception type name
        exception_type: String,
        /// Exception message
        message: String,
        /// Stack at the raise point
        stack: Vec<StackFrame>,
    },
    /// The script could not be compiled
    ClientSyntaxError {
        /// Originating backend
        debugger_id: String,
        /// Error message
        message: String,
        /// File containing the error
        file: PathBuf,
        /// Line of the error
        line: u32,
        /// Column of the error
        column: u32,
    },
    /// Variables of a frame
    ClientVariables {
        /// Originating backend
        debugger_id: String,
        /// Global rather than local scope
        global: bool,
        /// The variables
        variables: Vec<VariableInfo>,
    },
    /// Members of one variable
    ClientVariable {
        /// Originating backend
        debugger_id: String,
        /// Global rather than local scope
        global: bool,
        /// Access path of the variable
        path: Vec<String>,
        /// The members
        variables: Vec<VariableInfo>,
    },
    /// Thread list
    ClientThreadList {
        /// Originating backend
        debugger_id: String,
        /// Id of the current thread
        current: u64,
        /// All threads
        threads: Vec<ThreadInfo>,
    },
    /// The current thread was switched
    ClientThreadSet {
        /// Originating backend
        debugger_id: String,
    },
    /// A statement finished executing
    ClientStatement {
        /// Originating backend
        debugger_id: String,
        /// More input is needed
        more: bool,
    },
    /// Disassembly listing
    ClientDisassembly {
        /// Originating backend
        debugger_id: String,
        /// Disassembly lines
        lines: Vec<String>,
    },
    /// A signal was caught
    ClientSignal {
        /// Originating backend
        debugger_id: String,
        /// Signal description
        message: String,
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
        /// Function name
        function: String,
    },
    /// A breakpoint condition failed to evaluate (reported once per location)
    BreakConditionError {
        /// Originating backend
        debugger_id: String,
        /// Source file
        file: PathBuf,
        /// Line number
        line: u32,
    },
    /// A watch expression failed to evaluate (reported once per expression)
    WatchConditionError {
        /// Originating backend
        debugger_id: String,
        /// Composite watch condition
        condition: String,
    },
    /// A backend exited
    ClientExit {
        /// Originating backend
        debugger_id: String,
        /// Exit status
        status: i32,
        /// Exit message
        message: String,
        /// The connection closed without an exit report
        unplanned: bool,
    },
    /// The last attached backend went away
    LastClientExited,
    /// A backend identified itself
    NewBackendAttached {
        /// The new backend
        debugger_id: String,
    },
    /// A backend connection closed
    BackendDetached {
        /// The departed backend
        debugger_id: String,
    },
    /// A backend waits for user input
    ClientRawInput {
        /// Originating backend
        debugger_id: String,
        /// Input prompt
        prompt: String,
        /// Echo typed text
        echo: bool,
    },
    /// Backend banner
    ClientBanner {
        /// Originating backend
        debugger_id: String,
        /// Backend version
        version: String,
        /// Platform description
        platform: String,
        /// Interpreter description
        interpreter: String,
    },
    /// Backend capabilities
    ClientCapabilities {
        /// Originating backend
        debugger_id: String,
        /// Supported features
        capabilities: Capabilities,
        /// Language the backend debugs
        language: String,
    },
    /// Completion candidates
    ClientCompletionList {
        /// Originating backend
        debugger_id: String,
        /// Candidates
        completions: Vec<String>,
        /// Text that was completed
        text: String,
    },
    /// A call or return was traced
    ClientCallTrace {
        /// Originating backend
        debugger_id: String,
        /// `true` for a call, `false` for a return
        is_call: bool,
        /// Caller location
        from: String,
        /// Callee location
        to: String,
    },
    /// A passively started debuggee is ready
    PassiveDebugStarted {
        /// Originating backend
        debugger_id: String,
        /// Script being debugged
        file: PathBuf,
        /// Exception reporting active
        exceptions: bool,
    },
    /// The hub moved to a new session state
    StateChanged {
        /// New state
        state: SessionState,
    },
    /// A peer outside the allow-list wants to connect
    ConnectionRequest {
        /// Ticket to pass to `resolve_connection`
        ticket: u64,
        /// Remote address
        peer: IpAddr,
    },
    /// A pending connection was refused
    ConnectionRejected {
        /// Ticket of the refused connection
        ticket: u64,
        /// Remote address
        peer: IpAddr,
    },
    /// A launch did not produce a debuggee
    LaunchFailed {
        /// Human readable reason
        reason: String,
    },
    /// A front-end request could not be served
    RequestFailed {
        /// Human readable reason
        message: String,
    },
}

/// How a launched script should be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LaunchMode {
    /// Interactive debugging
    Debug,
    /// Plain execution
    Run,
    /// Coverage measurement
    Coverage {
        /// Discard previous data
        erase: bool,
    },
    /// Profiling
    Profile {
        /// Discard previous data
        erase: bool,
    },
}

impl LaunchMode {
    /// Whether the debuggee stops at breakpoints in this mode.
    pub fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Everything the hub needs to start a debuggee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchRequest {
    /// Script (or project main script) to execute
    pub script: PathBuf,
    /// Command line arguments
    pub args: Vec<String>,
    /// Working directory; the script's directory when absent
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables
    pub environment: BTreeMap<String, String>,
    /// Language override; otherwise resolved from the script extension
    pub language: Option<String>,
    /// Start with the project's interpreter settings
    pub for_project: bool,
    /// Run the debuggee in a console window
    pub run_in_console: bool,
    /// Virtual environment to use
    pub venv_name: Option<String>,
    /// Interface specific configuration override
    pub config_override: Option<String>,
    /// Trace into the interpreter's own modules
    pub trace_interpreter: bool,
    /// Do not stop at the first line
    pub auto_continue: bool,
    /// Follow child processes
    pub enable_multiprocess: bool,
    /// Report call/return events
    pub enable_call_trace: bool,
}

impl LaunchRequest {
    /// Request for `script` with every option at its default.
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self { script: script.into(), ..Default::default() }
    }

    /// Builds the command that starts the script in `mode`.
    pub fn command(&self, mode: LaunchMode) -> RemoteCommand {
        let script = self.script.clone();
        let args = self.args.clone();
        let working_dir = self.working_dir.clone();
        match mode {
            LaunchMode::Debug => RemoteCommand::Load {
                script,
                args,
                working_dir,
                trace_interpreter: self.trace_interpreter,
                auto_continue: self.auto_continue,
                enable_multiprocess: self.enable_multiprocess,
                enable_call_trace: self.enable_call_trace,
            },
            LaunchMode::Run => RemoteCommand::Run { script, args, working_dir },
            LaunchMode::Coverage { erase } => {
                RemoteCommand::Coverage { script, args, working_dir, erase }
            }
            LaunchMode::Profile { erase } => {
                RemoteCommand::Profile { script, args, working_dir, erase }
            }
        }
    }
}

/// Request from the front end to the hub.
///
/// Positions refer to the breakpoint and watchpoint stores. An empty
/// `debugger_id` addresses every attached backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubRequest {
    /// Start a debugging session
    Load {
        /// What to start
        request: LaunchRequest,
    },
    /// Run a script without debugging
    Run {
        /// What to start
        request: LaunchRequest,
    },
    /// Run a script under coverage
    Coverage {
        /// What to start
        request: LaunchRequest,
        /// Discard previous data
        #[serde(default)]
        erase: bool,
    },
    /// Run a script under the profiler
    Profile {
        /// What to start
        request: LaunchRequest,
        /// Discard previous data
        #[serde(default)]
        erase: bool,
    },
    /// Stop every debuggee
    Stop,
    /// Append a breakpoint
    AddBreakpoint {
        /// The breakpoint
        breakpoint: Breakpoint,
    },
    /// Replace the breakpoint at `position`
    SetBreakpoint {
        /// Store position
        position: usize,
        /// Replacement
        breakpoint: Breakpoint,
    },
    /// Enable or disable the breakpoint at `position`
    EnableBreakpoint {
        /// Store position
        position: usize,
        /// New flag
        enabled: bool,
    },
    /// Change the condition of the breakpoint at `position`
    SetBreakpointCondition {
        /// Store position
        position: usize,
        /// New condition, empty to clear
        condition: String,
    },
    /// Make the breakpoint at `position` temporary or permanent
    SetBreakpointTemporary {
        /// Store position
        position: usize,
        /// New flag
        temporary: bool,
    },
    /// Change the ignore count of the breakpoint at `position`
    IgnoreBreakpoint {
        /// Store position
        position: usize,
        /// Hits to skip
        count: u32,
    },
    /// Delete breakpoints at `positions`
    DeleteBreakpoints {
        /// Store positions
        positions: Vec<usize>,
    },
    /// Delete every breakpoint
    ClearBreakpoints,
    /// Append a watch expression
    AddWatchpoint {
        /// The watch expression
        watchpoint: Watchpoint,
    },
    /// Replace the watch expression at `position`
    SetWatchpoint {
        /// Store position
        position: usize,
        /// Replacement
        watchpoint: Watchpoint,
    },
    /// Enable or disable the watch expression at `position`
    EnableWatchpoint {
        /// Store position
        position: usize,
        /// New flag
        enabled: bool,
    },
    /// Change the ignore count of the watch expression at `position`
    IgnoreWatchpoint {
        /// Store position
        position: usize,
        /// Hits to skip
        count: u32,
    },
    /// Delete watch expressions at `positions`
    DeleteWatchpoints {
        /// Store positions
        positions: Vec<usize>,
    },
    /// Delete every watch expression
    ClearWatchpoints,
    /// Step into
    Step {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Step over
    StepOver {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Step out
    StepOut {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Quit
    StepQuit {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Resume
    Continue {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Skip watch expressions
        #[serde(default)]
        special: bool,
    },
    /// Resume until a line
    ContinueUntil {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Target line
        line: u32,
    },
    /// Move the instruction pointer
    MoveIp {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Target line
        line: u32,
    },
    /// Answer a raw input request
    RawInput {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Typed text
        input: String,
    },
    /// Request the thread list
    ThreadList {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Switch threads
    SetThread {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Thread to select
        thread_id: u64,
    },
    /// Request the call stack
    Stack {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Request the variables of a frame
    Variables {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Global rather than local scope
        #[serde(default)]
        global: bool,
        /// Frame index
        #[serde(default)]
        frame: usize,
    },
    /// Request the members of one variable
    Variable {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Global rather than local scope
        #[serde(default)]
        global: bool,
        /// Access path
        path: Vec<String>,
        /// Frame index
        #[serde(default)]
        frame: usize,
    },
    /// Request a disassembly
    Disassembly {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Set the variable type filter
    SetFilter {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Global rather than local scope
        #[serde(default)]
        global: bool,
        /// Filter expression
        filter: String,
    },
    /// Enable or disable call tracing
    CallTrace {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// New state
        enabled: bool,
    },
    /// Request the banner
    Banner {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Request capabilities
    Capabilities {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
    },
    /// Request completions
    Completion {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Text to complete
        text: String,
    },
    /// Execute a statement
    Statement {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Statement source
        statement: String,
    },
    /// Pass environment variables to the debuggee
    Environment {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Variables to set
        vars: BTreeMap<String, String>,
    },
    /// Replace the list of programs child processes must not debug
    NoDebugList {
        /// Target backend
        #[serde(default)]
        debugger_id: String,
        /// Program patterns
        patterns: Vec<String>,
    },
    /// Accept or refuse a pending connection
    ResolveConnection {
        /// Ticket from `ConnectionRequest`
        ticket: u64,
        /// Accept the peer
        accept: bool,
    },
}
