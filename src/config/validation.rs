//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - KnockConfig → Result<(), Vec<ValidationError>>; the only outside input
//!   is the clock, to check durations can be added to it
//! - Runs before any listener binds; any error is fatal

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::config::schema::KnockConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("knock sequence is empty")]
    EmptySequence,
    #[error("port 0 is not a valid knock port")]
    ZeroKnockPort,
    #[error("port {0} appears more than once in the knock sequence")]
    DuplicatePort(u16),
    #[error("base port must not be 0")]
    ZeroBasePort,
    #[error("knock ports {base}+1..={base}+{len} exceed 65535")]
    PortRange { base: u16, len: usize },
    #[error("sequence port {0} is not served by any knock listener")]
    UnservedPort(u16),
    #[error("access duration must be greater than zero")]
    ZeroAccessDuration,
    #[error("access duration is too large to schedule an expiry")]
    AccessDurationTooLarge,
    #[error("sweeper interval must be greater than zero")]
    ZeroSweepInterval,
    #[error("sweeper interval is too large to schedule")]
    SweepIntervalTooLarge,
}

pub fn validate_config(config: &KnockConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let sequence = &config.knock.sequence;

    if sequence.is_empty() {
        errors.push(ValidationError::EmptySequence);
    }
    if sequence.contains(&0) {
        errors.push(ValidationError::ZeroKnockPort);
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for &port in sequence {
        if !seen.insert(port) && reported.insert(port) {
            errors.push(ValidationError::DuplicatePort(port));
        }
    }

    if config.listener.base_port == 0 {
        errors.push(ValidationError::ZeroBasePort);
    }

    match config.knock_ports() {
        Some(listeners) => {
            for &port in sequence {
                if port != 0 && !listeners.contains(&port) {
                    errors.push(ValidationError::UnservedPort(port));
                }
            }
        }
        None => errors.push(ValidationError::PortRange {
            base: config.listener.base_port,
            len: sequence.len(),
        }),
    }

    let access = config.knock.access_duration;
    if access.is_zero() {
        errors.push(ValidationError::ZeroAccessDuration);
    } else if !schedulable(access) {
        errors.push(ValidationError::AccessDurationTooLarge);
    }

    let interval = config.sweeper.interval;
    if interval.is_zero() {
        errors.push(ValidationError::ZeroSweepInterval);
    } else if !schedulable(interval) {
        errors.push(ValidationError::SweepIntervalTooLarge);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True when `Instant::now() + duration` stays representable for at least
/// another century of uptime.
fn schedulable(duration: Duration) -> bool {
    const HEADROOM: Duration = Duration::from_secs(100 * 365 * 24 * 3600);
    duration
        .checked_add(HEADROOM)
        .and_then(|d| Instant::now().checked_add(d))
        .is_some()
}
