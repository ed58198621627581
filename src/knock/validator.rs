//! Knock-session state machine.
//!
//! # State Transitions
//! ```text
//! (no session) --knock--> Partial([port])           first knock from a peer
//! Partial(k)   --knock--> Partial(k + port)          still a prefix
//! Partial(k)   --knock--> Partial([port])            diverged: reset
//! any          --knock--> Complete → grant, discard  whole sequence matched
//! allowed peer --knock--> AlreadyAllowed             no session mutation
//! ```
//!
//! A session never holds more than `sequence.len()` knocks.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::access::Allowlist;
use crate::knock::{KnockSequence, KnockSession};
use crate::observability::metrics;

/// Progress reported for an accepted knock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Partial,
    Complete,
}

/// Result of observing one knock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnockOutcome {
    /// The peer already holds a live grant; nothing was recorded.
    AlreadyAllowed,
    Accepted(Progress),
}

impl KnockOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            KnockOutcome::AlreadyAllowed => "already_allowed",
            KnockOutcome::Accepted(Progress::Partial) => "partial",
            KnockOutcome::Accepted(Progress::Complete) => "complete",
        }
    }
}

/// Tracks knock sessions per peer and promotes completed ones to the
/// allowlist.
///
/// Every observation for a peer runs under that peer's map entry lock, so
/// concurrent knocks from one peer are serialized while different peers
/// proceed in parallel. The allowlist lock is only ever taken inside an
/// entry lock, never the other way round.
pub struct SequenceValidator {
    sequence: Arc<KnockSequence>,
    sessions: DashMap<IpAddr, KnockSession>,
    allowlist: Arc<Allowlist>,
    access_duration: Duration,
}

impl SequenceValidator {
    pub fn new(
        sequence: Arc<KnockSequence>,
        allowlist: Arc<Allowlist>,
        access_duration: Duration,
    ) -> Self {
        Self {
            sequence,
            sessions: DashMap::new(),
            allowlist,
            access_duration,
        }
    }

    pub fn sequence(&self) -> &KnockSequence {
        &self.sequence
    }

    pub fn allowlist(&self) -> &Arc<Allowlist> {
        &self.allowlist
    }

    pub fn observe(&self, peer: IpAddr, port: u16) -> KnockOutcome {
        self.observe_at(peer, port, Instant::now())
    }

    pub fn observe_at(&self, peer: IpAddr, port: u16, now: Instant) -> KnockOutcome {
        let entry = self.sessions.entry(peer);

        if self.allowlist.is_allowed_at(peer, now) {
            tracing::debug!(peer = %peer, port, "Peer is already allowed");
            metrics::record_knock(KnockOutcome::AlreadyAllowed.as_label());
            return KnockOutcome::AlreadyAllowed;
        }

        let progress = match entry {
            Entry::Vacant(vacant) => {
                let session = KnockSession::new(peer, port);
                tracing::debug!(peer = %peer, knocks = ?session.knocks(), "Created knock session");
                if self.sequence.is_complete(session.knocks()) {
                    self.promote(peer, now)
                } else {
                    vacant.insert(session);
                    Progress::Partial
                }
            }
            Entry::Occupied(mut occupied) => {
                let session = occupied.get_mut();
                session.push(port);

                if !self.sequence.matches_prefix(session.knocks()) {
                    tracing::debug!(
                        peer = %peer,
                        knocks = ?session.knocks(),
                        "Knock diverged from sequence, restarting session"
                    );
                    session.restart(port);
                }

                if self.sequence.is_complete(session.knocks()) {
                    tracing::info!(peer = %peer, knocks = ?session.knocks(), "Knock session complete");
                    let progress = self.promote(peer, now);
                    occupied.remove();
                    progress
                } else {
                    tracing::debug!(peer = %peer, knocks = ?session.knocks(), "Knock session incomplete");
                    Progress::Partial
                }
            }
        };

        let outcome = KnockOutcome::Accepted(progress);
        metrics::record_knock(outcome.as_label());
        outcome
    }

    /// Number of peers with a session in progress.
    pub fn pending_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Copy of the in-progress session for `peer`, if any.
    pub fn session(&self, peer: IpAddr) -> Option<KnockSession> {
        self.sessions.get(&peer).map(|s| s.value().clone())
    }

    /// Grant access for a completed session. A refused grant leaves the
    /// peer without access, so it is reported as partial progress.
    fn promote(&self, peer: IpAddr, now: Instant) -> Progress {
        let granted = self.allowlist.grant_at(peer, self.access_duration, now);
        self.allowlist.log_snapshot();
        if granted {
            Progress::Complete
        } else {
            Progress::Partial
        }
    }
}
