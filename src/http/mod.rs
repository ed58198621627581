//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Gate port (base)
//!     → handlers.rs gate_handler → access::Allowlist::is_allowed
//!     → 200 granted | 403 denied | 500 peer unknown
//!
//! Knock port k (base+1 ..= base+N)
//!     → handlers.rs knock_handler → knock::SequenceValidator::observe(peer, k)
//!     → 200 acknowledgement (any method, any path)
//!
//! server.rs binds all N+1 listeners and serves them concurrently
//! alongside the expiry sweeper.
//! ```

pub mod handlers;
pub mod server;

pub use handlers::{GateState, KnockState};
pub use server::{KnockServer, ServerError};
