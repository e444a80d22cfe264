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

//! Async driver for [`DebugServer`].
//!
//! The hub is not shared between tasks. One task owns it and feeds it everything
//! it reacts to: accepted backend sockets, events from interface reader tasks,
//! front-end requests and the launch deadline. Front ends talk to that task
//! through a [`HubHandle`] and listen on the event receiver returned by
//! [`DebugServerBuilder::build`](crate::hub::DebugServerBuilder::build).

use std::{collections::HashMap, net::SocketAddr};

use eyre::{eyre, Result};
use tokio::{
    net::TcpListener,
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    error::{HubError, HubResult},
    hub::{Admission, DebugServer},
    interface::BackendConnection,
    protocol::{HubRequest, InterfaceEvent},
};

/// Handle to a running hub
#[derive(Debug)]
pub struct HubHandle {
    /// Address debuggees connect to
    addr: SocketAddr,
    requests: UnboundedSender<HubRequest>,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<DebugServer>,
}

impl HubHandle {
    /// Get the listener address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the listener port
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Queue a front-end request
    pub fn request(&self, request: HubRequest) -> Result<()> {
        self.requests.send(request).map_err(|_| eyre!("Debug hub is no longer running"))
    }

    /// A sender for front ends that outlive this borrow
    pub fn requests(&self) -> UnboundedSender<HubRequest> {
        self.requests.clone()
    }

    /// Stop every debuggee, end the loop and return the hub
    pub async fn shutdown(self) -> Result<DebugServer> {
        if self.shutdown_tx.send(()).is_err() {
            warn!("Debug hub already shut down");
        }
        self.task.await.map_err(|e| eyre!("Debug hub task failed: {e}"))
    }
}

/// Spawns the task that drives a [`DebugServer`].
#[derive(Debug)]
pub struct HubRuntime;

impl HubRuntime {
    /// Binds the backend listener at the configured address and starts the loop.
    pub async fn spawn(mut hub: DebugServer) -> HubResult<HubHandle> {
        let interface_events = hub.take_interface_events().ok_or(HubError::AlreadyRunning)?;

        let addr = SocketAddr::new(hub.config().host, hub.config().port);
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        hub.set_listen_addr(addr);

        let (requests, requests_rx) = unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run(hub, listener, interface_events, requests_rx, shutdown_rx));

        info!("Debug hub listening on {}", addr);
        Ok(HubHandle { addr, requests, shutdown_tx, task })
    }
}

async fn run(
    mut hub: DebugServer,
    listener: TcpListener,
    mut interface_events: UnboundedReceiver<InterfaceEvent>,
    mut requests: UnboundedReceiver<HubRequest>,
    mut shutdown: oneshot::Receiver<()>,
) -> DebugServer {
    // Connections from unknown peers wait here for the front end's decision.
    let mut parked: HashMap<u64, BackendConnection> = HashMap::new();

    loop {
        let deadline = hub.launch_deadline();

        tokio::select! {
            _ = &mut shutdown => {
                info!("Debug hub shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "Inbound backend connection");
                    let connection = BackendConnection { stream, peer };
                    match hub.admit(peer.ip()) {
                        Admission::Allowed => hub.accept_connection(connection),
                        Admission::Pending(ticket) => {
                            parked.insert(ticket, connection);
                        }
                    }
                }
                Err(err) => warn!(%err, "Failed to accept backend connection"),
            },
            Some(event) = interface_events.recv() => hub.handle_interface_event(event),
            Some(request) = requests.recv() => match request {
                HubRequest::ResolveConnection { ticket, accept } => {
                    let connection = parked.remove(&ticket);
                    match hub.resolve_admission(ticket, accept) {
                        Some(_) if accept => {
                            if let Some(connection) = connection {
                                hub.accept_connection(connection);
                            }
                        }
                        Some(_) => {}
                        None => hub.report_failure(&HubError::UnknownTicket(ticket)),
                    }
                }
                request => {
                    if let Err(err) = hub.handle_request(request) {
                        hub.report_failure(&err);
                    }
                }
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                hub.expire_launch(Instant::now());
            }
        }
    }

    hub.stop();
    hub
}
