//! Knock sequence subsystem.
//!
//! # Data Flow
//! ```text
//! Knock on port k from peer P
//!     → validator.rs (allowlist short-circuit, per-peer entry lock)
//!     → session.rs (append k, compare against sequence.rs prefix)
//!     → complete: grant into access::Allowlist, drop session
//! ```

pub mod sequence;
pub mod session;
pub mod validator;

pub use sequence::{KnockSequence, SequenceError};
pub use session::KnockSession;
pub use validator::{KnockOutcome, Progress, SequenceValidator};
