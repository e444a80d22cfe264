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

//! Reference debugger interface speaking newline delimited JSON.
//!
//! Every line a debuggee writes is one [`BackendEvent`]; every line the hub
//! writes is one [`RemoteCommand`]. A connection is anonymous until it sends a
//! `debugger_id` event, after which targeted commands reach it.
//!
//! Broadcasts issued before any debuggee connected (the launch command, for
//! instance) are queued and flushed to the first connection.

use std::{process::Stdio, sync::Arc};

use parking_lot::Mutex;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader},
    net::tcp::{OwnedReadHalf, OwnedWriteHalf},
    process::{Child, Command},
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config::{HubConfig, LanguageConfig},
    error::{HubError, HubResult},
    interface::{
        BackendConnection, ClientStart, DebuggerInterface, EventSink, InterfaceContext,
        StartRequest,
    },
    protocol::{BackendEvent, RemoteCommand},
    registry::{InterfaceFactory, InterfaceRegistry, LanguageRegistration},
};

/// Registration name of this interface.
pub const NAME: &str = "json-lines";

#[derive(Debug)]
struct Connection {
    id: u64,
    debugger_id: Option<String>,
    writer: UnboundedSender<String>,
}

#[derive(Debug, Default)]
struct Routes {
    connections: Vec<Connection>,
    queued: Vec<String>,
    next_id: u64,
}

impl Routes {
    fn identify(&mut self, connection: u64, debugger_id: &str) {
        if let Some(entry) = self.connections.iter_mut().find(|c| c.id == connection) {
            entry.debugger_id = Some(debugger_id.to_string());
        }
    }

    fn remove(&mut self, connection: u64) {
        self.connections.retain(|c| c.id != connection);
    }
}

/// JSON-lines interface for one language.
#[derive(Debug)]
pub struct JsonLinesInterface {
    language: String,
    passive: bool,
    events: EventSink,
    config: LanguageConfig,
    routes: Arc<Mutex<Routes>>,
    child: Option<Child>,
    tasks: Vec<JoinHandle<()>>,
}

impl JsonLinesInterface {
    /// Creates an interface that starts debuggees as described by `config`.
    pub fn new(context: InterfaceContext, config: LanguageConfig) -> Self {
        Self {
            language: context.language,
            passive: context.passive,
            events: context.events,
            config,
            routes: Arc::default(),
            child: None,
            tasks: Vec::new(),
        }
    }

    fn spawn_debuggee(&self, request: &StartRequest) -> std::io::Result<Child> {
        let port = request.port.to_string();
        let script = request.original_path.to_string_lossy();
        let args = self.config.args.iter().map(|arg| {
            arg.replace("{host}", &request.host)
                .replace("{port}", &port)
                .replace("{script}", &script)
        });

        let mut command = Command::new(&self.config.command);
        command
            .args(args)
            .env("DEBUGHUB_HOST", &request.host)
            .env("DEBUGHUB_PORT", &port)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(venv) = &request.venv_name {
            command.env("DEBUGHUB_VENV", venv);
        }
        if let Some(config) = &request.config_override {
            command.env("DEBUGHUB_CONFIG", config);
        }
        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }
        command.spawn()
    }
}

impl DebuggerInterface for JsonLinesInterface {
    fn start_remote(&mut self, request: &StartRequest) -> HubResult<ClientStart> {
        if self.passive {
            return Err(HubError::PassiveMode);
        }
        if self.config.command.is_empty() {
            warn!(language = %self.language, "No debug client command configured");
            return Ok(ClientStart::not_started(""));
        }

        let mut child = match self.spawn_debuggee(request) {
            Ok(child) => child,
            Err(err) => {
                warn!(command = %self.config.command, %err, "Failed to spawn debug client");
                return Ok(ClientStart::not_started(self.config.command.clone()));
            }
        };

        if let Some(stdout) = child.stdout.take() {
            self.tasks.push(tokio::spawn(forward_output(stdout, false, self.events.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            self.tasks.push(tokio::spawn(forward_output(stderr, true, self.events.clone())));
        }

        let process = child.id();
        info!(language = %self.language, pid = ?process, "Spawned debug client");
        self.child = Some(child);
        Ok(ClientStart { process, networked: true, interpreter: self.config.command.clone() })
    }

    fn new_connection(&mut self, connection: BackendConnection) {
        let BackendConnection { stream, peer } = connection;
        let (reader, writer) = stream.into_split();
        let (lines_tx, lines_rx) = unbounded_channel();

        let id = {
            let mut routes = self.routes.lock();
            let id = routes.next_id;
            routes.next_id += 1;
            for line in std::mem::take(&mut routes.queued) {
                let _ = lines_tx.send(line);
            }
            routes.connections.push(Connection { id, debugger_id: None, writer: lines_tx });
            id
        };
        debug!(%peer, connection = id, "Backend connection opened");

        self.tasks.push(tokio::spawn(write_commands(writer, lines_rx)));
        self.tasks.push(tokio::spawn(read_events(
            reader,
            id,
            self.routes.clone(),
            self.events.clone(),
        )));
    }

    fn send(&mut self, debugger_id: &str, command: RemoteCommand) {
        let line = match serde_json::to_string(&command) {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, ?command, "Failed to encode command");
                return;
            }
        };

        let mut routes = self.routes.lock();
        if debugger_id.is_empty() {
            if routes.connections.is_empty() {
                routes.queued.push(line);
                return;
            }
            // Unidentified backends catch up through replay once they attach.
            for connection in routes.connections.iter().filter(|c| c.debugger_id.is_some()) {
                let _ = connection.writer.send(line.clone());
            }
            return;
        }

        match routes
            .connections
            .iter()
            .find(|c| c.debugger_id.as_deref() == Some(debugger_id))
        {
            Some(connection) => {
                let _ = connection.writer.send(line);
            }
            None => warn!(%debugger_id, "Command for unknown backend dropped"),
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.start_kill() {
                debug!(%err, "Debug client already exited");
            }
        }
        {
            let mut routes = self.routes.lock();
            routes.connections.clear();
            routes.queued.clear();
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn is_connected(&self) -> bool {
        !self.routes.lock().connections.is_empty()
    }

    fn debugger_ids(&self) -> Vec<String> {
        self.routes.lock().connections.iter().filter_map(|c| c.debugger_id.clone()).collect()
    }
}

impl Drop for JsonLinesInterface {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn write_commands(mut writer: OwnedWriteHalf, mut lines: UnboundedReceiver<String>) {
    while let Some(mut line) = lines.recv().await {
        line.push('\n');
        if let Err(err) = writer.write_all(line.as_bytes()).await {
            debug!(%err, "Backend connection closed while writing");
            break;
        }
    }
}

async fn read_events(
    reader: OwnedReadHalf,
    connection: u64,
    routes: Arc<Mutex<Routes>>,
    events: EventSink,
) {
    let mut lines = BufReader::new(reader).lines();
    let mut debugger_id = String::new();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(%err, connection, "Failed to read from backend");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<BackendEvent>(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(%err, %line, "Skipping malformed backend message");
                continue;
            }
        };
        if let BackendEvent::DebuggerId { debugger_id: reported } = &event {
            debugger_id = reported.clone();
            routes.lock().identify(connection, reported);
        }
        if !events.send(debugger_id.clone(), event) {
            return;
        }
    }

    routes.lock().remove(connection);
    events.send(debugger_id, BackendEvent::Disconnected);
}

async fn forward_output<R>(stream: R, stderr: bool, events: EventSink)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let event = BackendEvent::Output { text: format!("{line}\n"), stderr };
        if !events.send("", event) {
            break;
        }
    }
}

/// Registers one JSON-lines language per entry of `config.languages`.
///
/// Replaces an earlier registration of this interface. Returns whether any
/// language was registered.
pub fn register_from_config(
    registry: &mut InterfaceRegistry,
    config: &HubConfig,
) -> HubResult<bool> {
    let mut languages = Vec::with_capacity(config.languages.len());
    for (language, settings) in &config.languages {
        let capabilities = settings.capabilities().map_err(HubError::Config)?;
        let extensions = settings.extensions.clone();
        let settings = settings.clone();
        let factory: InterfaceFactory = Arc::new(move |context: InterfaceContext| {
            let interface = JsonLinesInterface::new(context, settings.clone());
            Box::new(interface) as Box<dyn DebuggerInterface>
        });
        let registration =
            LanguageRegistration::new(language.as_str(), capabilities, extensions, factory);
        languages.push(registration);
    }
    Ok(registry.register(NAME, move || languages, true))
}
