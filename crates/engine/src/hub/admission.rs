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

use std::{collections::HashMap, net::IpAddr};

use tracing::{info, warn};

use super::DebugServer;
use crate::protocol::HubEvent;

/// Outcome of [`DebugServer::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The peer is on the allow-list
    Allowed,
    /// The front end has to decide; the ticket identifies the request
    Pending(u64),
}

/// Peers allowed to connect, plus the requests awaiting a decision.
///
/// Accepted peers stay allowed for the lifetime of the process.
#[derive(Debug)]
pub(super) struct AllowList {
    allowed: Vec<IpAddr>,
    pending: HashMap<u64, IpAddr>,
    next_ticket: u64,
}

impl AllowList {
    pub(super) fn new(allowed: Vec<IpAddr>) -> Self {
        let allowed = allowed.into_iter().map(|ip| ip.to_canonical()).collect();
        Self { allowed, pending: HashMap::new(), next_ticket: 1 }
    }

    fn contains(&self, peer: IpAddr) -> bool {
        self.allowed.contains(&peer.to_canonical())
    }
}

impl DebugServer {
    /// Checks an inbound peer against the allow-list.
    ///
    /// Unknown peers get a ticket and the front end is asked through
    /// [`HubEvent::ConnectionRequest`].
    pub fn admit(&mut self, peer: IpAddr) -> Admission {
        if self.allow_list.contains(peer) {
            return Admission::Allowed;
        }
        let ticket = self.allow_list.next_ticket;
        self.allow_list.next_ticket += 1;
        self.allow_list.pending.insert(ticket, peer);
        info!(%peer, ticket, "Connection from unknown peer awaits approval");
        self.emit(HubEvent::ConnectionRequest { ticket, peer });
        Admission::Pending(ticket)
    }

    /// Settles a pending admission. Returns the peer, or `None` for an unknown ticket.
    pub fn resolve_admission(&mut self, ticket: u64, accept: bool) -> Option<IpAddr> {
        let Some(peer) = self.allow_list.pending.remove(&ticket) else {
            warn!(ticket, "Admission decision for unknown ticket");
            return None;
        };
        if accept {
            info!(%peer, "Peer added to the allow-list");
            if !self.allow_list.contains(peer) {
                self.allow_list.allowed.push(peer.to_canonical());
            }
        } else {
            info!(%peer, "Connection rejected");
            self.emit(HubEvent::ConnectionRejected { ticket, peer });
        }
        Some(peer)
    }

    /// Whether `peer` is admitted without asking
    pub fn is_allowed(&self, peer: IpAddr) -> bool {
        self.allow_list.contains(peer)
    }
}
