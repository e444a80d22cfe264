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

//! `serve` command - runs the hub behind a JSON-lines front end on stdio

use debughub_common::Breakpoint;
use debughub_engine::{
    adapters::register_from_config, DebugServer, HubConfig, HubEvent, HubRequest, HubRuntime,
    InterfaceRegistry,
};
use eyre::{Result, WrapErr};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing::{error, info, warn};

use crate::ServeArgs;

/// Apply command-line overrides to the loaded configuration
fn apply_overrides(config: &mut HubConfig, args: &ServeArgs) {
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.passive {
        config.passive = true;
    }
    if let Some(language) = &args.passive_language {
        config.passive_language = language.clone();
    }
    if let Some(language) = &args.language {
        config.default_language = language.clone();
    }
}

/// Parse the `--break` arguments
fn initial_breakpoints(values: &[String]) -> Result<Vec<Breakpoint>> {
    values
        .iter()
        .map(|value| {
            value.parse::<Breakpoint>().wrap_err_with(|| format!("Invalid --break value '{value}'"))
        })
        .collect()
}

/// Run the hub until stdin closes or Ctrl+C is pressed
pub async fn serve(mut config: HubConfig, args: &ServeArgs) -> Result<()> {
    apply_overrides(&mut config, args);
    config.validate()?;
    let breakpoints = initial_breakpoints(&args.breakpoints)?;

    let mut registry = InterfaceRegistry::new();
    if !register_from_config(&mut registry, &config)? {
        warn!("No languages configured, launching will fail");
    }

    let passive = config.passive;
    let (mut hub, mut events) = DebugServer::builder().config(config).registry(registry).build();
    if !breakpoints.is_empty() {
        info!(count = breakpoints.len(), "Adding breakpoints from the command line");
        hub.edit_breakpoints(|store| store.add_batch(breakpoints));
    }
    let handle = HubRuntime::spawn(hub).await?;
    info!(addr = %handle.addr(), passive, "Debug hub ready");

    let mut requests = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            line = requests.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<HubRequest>(line) {
                        Ok(request) => handle.request(request)?,
                        Err(e) => {
                            error!("Failed to parse front-end request: {}", e);
                            let message = format!("Invalid request: {e}");
                            let event = HubEvent::RequestFailed { message };
                            write_event(&mut stdout, &event).await?;
                        }
                    }
                }
                Ok(None) => {
                    info!("Front end closed stdin, shutting down...");
                    break;
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            },
            Some(event) = events.recv() => write_event(&mut stdout, &event).await?,
        }
    }

    let hub = handle.shutdown().await?;
    while let Ok(event) = events.try_recv() {
        write_event(&mut stdout, &event).await?;
    }
    info!(
        breakpoints = hub.breakpoints().len(),
        watchpoints = hub.watchpoints().len(),
        "Debug hub stopped"
    );

    Ok(())
}

async fn write_event(stdout: &mut Stdout, event: &HubEvent) -> Result<()> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
