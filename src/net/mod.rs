//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! KnockConfig (bind ip, base port, sequence length)
//!     → listener.rs (bind gate port + N knock ports, fail fast)
//!     → Hand off to HTTP layer
//!
//! Incoming request
//!     → peer.rs (source IP, port stripped, canonical form)
//! ```

pub mod listener;
pub mod peer;

pub use listener::{bind_listeners, BoundListeners, ListenerError};
pub use peer::{peer_from_request, PeerError};
