//! Time-limited allowlist of peers that completed the knock sequence.

use std::net::IpAddr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// A peer with live (or not yet pruned) access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedPeer {
    pub ip: IpAddr,
    pub start: Instant,
    pub end: Instant,
}

impl AllowedPeer {
    /// An entry is live strictly before its end instant.
    pub fn is_live_at(&self, now: Instant) -> bool {
        now < self.end
    }

    /// Time left before expiry, zero when already expired.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.end.saturating_duration_since(now)
    }
}

/// Allowlist guarded by a single lock over the whole table.
///
/// Entries are kept in insertion order. Expiry is enforced lazily on every
/// read as well as eagerly by [`prune`](Allowlist::prune), so a stale entry
/// the sweeper has not reached yet is never reported as allowed.
#[derive(Debug, Default)]
pub struct Allowlist {
    peers: RwLock<Vec<AllowedPeer>>,
}

impl Allowlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_allowed(&self, peer: IpAddr) -> bool {
        self.is_allowed_at(peer, Instant::now())
    }

    pub fn is_allowed_at(&self, peer: IpAddr, now: Instant) -> bool {
        self.read()
            .iter()
            .any(|allowed| allowed.ip == peer && allowed.is_live_at(now))
    }

    /// Grant access for `duration`. Returns `false` when the peer already
    /// had a live entry or `now + duration` is not representable; in both
    /// cases nothing changes.
    pub fn grant(&self, peer: IpAddr, duration: Duration) -> bool {
        self.grant_at(peer, duration, Instant::now())
    }

    pub fn grant_at(&self, peer: IpAddr, duration: Duration, now: Instant) -> bool {
        let mut peers = self.write();

        if peers.iter().any(|allowed| allowed.ip == peer && allowed.is_live_at(now)) {
            tracing::debug!(peer = %peer, "Peer is already allowed, grant unchanged");
            return false;
        }

        let Some(end) = now.checked_add(duration) else {
            tracing::error!(peer = %peer, duration = ?duration, "Access duration overflows, grant refused");
            return false;
        };

        // A stale entry for the same peer would break uniqueness.
        peers.retain(|allowed| allowed.ip != peer);
        peers.push(AllowedPeer {
            ip: peer,
            start: now,
            end,
        });

        tracing::info!(
            peer = %peer,
            duration = %humantime::format_duration(duration),
            "Allowing peer"
        );
        metrics::record_grant();
        metrics::record_allowlist_size(peers.len());
        true
    }

    /// Remove every entry whose end is at or before `now`.
    pub fn prune(&self, now: Instant) {
        let mut peers = self.write();
        let before = peers.len();

        peers.retain(|allowed| {
            let live = allowed.is_live_at(now);
            if !live {
                tracing::info!(peer = %allowed.ip, "Removing expired peer");
            }
            live
        });

        let removed = before - peers.len();
        if removed > 0 {
            metrics::record_expired(removed);
            metrics::record_allowlist_size(peers.len());
        }
    }

    /// Snapshot of all entries in insertion order.
    pub fn list(&self) -> Vec<AllowedPeer> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Log the current allowlist with the remaining time of each entry.
    pub fn log_snapshot(&self) {
        let now = Instant::now();
        let peers = self.list();
        if peers.is_empty() {
            tracing::debug!("Allowed peers: none");
            return;
        }
        for allowed in peers {
            tracing::debug!(
                peer = %allowed.ip,
                expires_in_secs = allowed.remaining_at(now).as_secs(),
                "Allowed peer"
            );
        }
    }

    // Poisoning only means another thread panicked mid-operation; every
    // mutation above leaves the table consistent, so keep serving.
    fn read(&self) -> RwLockReadGuard<'_, Vec<AllowedPeer>> {
        self.peers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<AllowedPeer>> {
        self.peers.write().unwrap_or_else(PoisonError::into_inner)
    }
}
