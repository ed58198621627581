//! Port-knocking access control.
//!
//! A gated HTTP endpoint stays closed until a peer knocks on a configured,
//! ordered sequence of ports. Completing the sequence puts the peer's IP on
//! a time-limited allowlist.

pub mod access;
pub mod config;
pub mod http;
pub mod knock;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use access::Allowlist;
pub use config::KnockConfig;
pub use http::KnockServer;
pub use knock::{KnockOutcome, KnockSequence, SequenceValidator};
pub use lifecycle::Shutdown;
