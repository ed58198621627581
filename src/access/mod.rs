//! Access grant subsystem.
//!
//! # Data Flow
//! ```text
//! Completed knock session
//!     → allowlist.rs grant (start = now, end = now + duration)
//!
//! Gate request
//!     → allowlist.rs is_allowed (lazy expiry check)
//!
//! sweeper.rs (fixed interval)
//!     → allowlist.rs prune(now)
//! ```
//!
//! # Design Decisions
//! - One lock over the whole table; prune iterates while grants and checks
//!   arrive from every listener
//! - Re-granting a live peer is a no-op, never an extension

pub mod allowlist;
pub mod sweeper;

pub use allowlist::{AllowedPeer, Allowlist};
pub use sweeper::ExpirySweeper;
