//! Per-peer knock progress.

use std::net::IpAddr;

/// Ports observed so far for one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnockSession {
    peer: IpAddr,
    knocks: Vec<u16>,
}

impl KnockSession {
    /// Start a session with its first knock.
    pub fn new(peer: IpAddr, port: u16) -> Self {
        Self {
            peer,
            knocks: vec![port],
        }
    }

    pub fn peer(&self) -> IpAddr {
        self.peer
    }

    pub fn knocks(&self) -> &[u16] {
        &self.knocks
    }

    pub fn push(&mut self, port: u16) {
        self.knocks.push(port);
    }

    /// Drop all progress and treat `port` as the first knock.
    pub fn restart(&mut self, port: u16) {
        self.knocks.clear();
        self.knocks.push(port);
    }
}
