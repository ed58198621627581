//! Gate and knock request handlers.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::access::Allowlist;
use crate::knock::{KnockOutcome, Progress, SequenceValidator};
use crate::net::peer_from_request;
use crate::observability::metrics;

pub const ACCESS_GRANTED: &str = "Access granted!";
pub const ACCESS_DENIED: &str = "Access denied!";
pub const PEER_ERROR: &str = "Error getting peer";
pub const KNOCK_ACK: &str = "Knock, knock!";
pub const ALREADY_ALLOWED: &str = "You are already allowed access!";

/// State for the gated endpoint.
#[derive(Clone)]
pub struct GateState {
    pub allowlist: Arc<Allowlist>,
}

/// State for one knock listener.
#[derive(Clone)]
pub struct KnockState {
    pub validator: Arc<SequenceValidator>,
    /// Port this listener represents in the sequence.
    pub port: u16,
}

pub async fn gate_handler(State(state): State<GateState>, request: Request) -> Response {
    let peer = match peer_from_request(&request) {
        Ok(peer) => peer,
        Err(e) => {
            tracing::error!(error = %e, "Error getting peer");
            metrics::record_gate("error");
            return (StatusCode::INTERNAL_SERVER_ERROR, PEER_ERROR).into_response();
        }
    };

    if !state.allowlist.is_allowed(peer) {
        tracing::info!(peer = %peer, "Peer is not allowed");
        state.allowlist.log_snapshot();
        metrics::record_gate("denied");
        return (StatusCode::FORBIDDEN, ACCESS_DENIED).into_response();
    }

    metrics::record_gate("granted");
    (StatusCode::OK, ACCESS_GRANTED).into_response()
}

/// Every method and path is handled the same; only the port matters.
pub async fn knock_handler(State(state): State<KnockState>, request: Request) -> Response {
    let peer = match peer_from_request(&request) {
        Ok(peer) => peer,
        Err(e) => {
            tracing::error!(error = %e, port = state.port, "Error getting peer");
            return (StatusCode::INTERNAL_SERVER_ERROR, PEER_ERROR).into_response();
        }
    };

    let body = match state.validator.observe(peer, state.port) {
        KnockOutcome::AlreadyAllowed => ALREADY_ALLOWED,
        KnockOutcome::Accepted(Progress::Partial) => KNOCK_ACK,
        KnockOutcome::Accepted(Progress::Complete) => ACCESS_GRANTED,
    };

    (StatusCode::OK, body).into_response()
}
