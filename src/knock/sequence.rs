//! The configured knock sequence.
//!
//! A `KnockSequence` is built once at startup and never changes. It is the
//! ordered list of ports a peer has to hit before the gate opens.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Error produced when a knock sequence cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("knock sequence is empty")]
    Empty,
    #[error("invalid port in knock sequence: {0:?}")]
    InvalidPort(String),
    #[error("port 0 is not a valid knock port")]
    ZeroPort,
    #[error("port {0} appears more than once in the knock sequence")]
    DuplicatePort(u16),
}

/// Ordered list of distinct, non-zero ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnockSequence {
    ports: Vec<u16>,
}

impl KnockSequence {
    /// Build a sequence, rejecting empty lists, port 0 and duplicates.
    pub fn new(ports: Vec<u16>) -> Result<Self, SequenceError> {
        if ports.is_empty() {
            return Err(SequenceError::Empty);
        }

        let mut seen = HashSet::with_capacity(ports.len());
        for &port in &ports {
            if port == 0 {
                return Err(SequenceError::ZeroPort);
            }
            if !seen.insert(port) {
                return Err(SequenceError::DuplicatePort(port));
            }
        }

        Ok(Self { ports })
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Always false for a constructed sequence.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Compare `observed` positionally against the sequence truncated to the
    /// same length.
    pub fn matches_prefix(&self, observed: &[u16]) -> bool {
        observed.len() <= self.ports.len() && self.ports[..observed.len()] == *observed
    }

    /// True when `observed` is the whole sequence.
    pub fn is_complete(&self, observed: &[u16]) -> bool {
        observed == self.ports.as_slice()
    }
}

impl FromStr for KnockSequence {
    type Err = SequenceError;

    /// Parse a comma-delimited list such as `"8081,8082,8083"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(SequenceError::Empty);
        }

        let ports = s
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<u16>()
                    .map_err(|_| SequenceError::InvalidPort(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(ports)
    }
}

impl fmt::Display for KnockSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ports.iter().map(u16::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimited_sequence() {
        let seq: KnockSequence = "8081, 8082,8083".parse().unwrap();
        assert_eq!(seq.ports(), &[8081, 8082, 8083]);
        assert_eq!(seq.to_string(), "8081,8082,8083");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<KnockSequence>(), Err(SequenceError::Empty));
        assert_eq!(
            "8081,abc".parse::<KnockSequence>(),
            Err(SequenceError::InvalidPort("abc".into()))
        );
        assert_eq!(
            "8081,70000".parse::<KnockSequence>(),
            Err(SequenceError::InvalidPort("70000".into()))
        );
        assert_eq!(
            "8081,,8083".parse::<KnockSequence>(),
            Err(SequenceError::InvalidPort("".into()))
        );
        assert_eq!("0,8081".parse::<KnockSequence>(), Err(SequenceError::ZeroPort));
    }

    #[test]
    fn test_duplicate_ports_rejected() {
        assert_eq!(
            KnockSequence::new(vec![8081, 8082, 8081]),
            Err(SequenceError::DuplicatePort(8081))
        );
    }

    #[test]
    fn test_prefix_matching() {
        let seq = KnockSequence::new(vec![8083, 8081, 8082]).unwrap();
        assert!(seq.matches_prefix(&[]));
        assert!(seq.matches_prefix(&[8083]));
        assert!(seq.matches_prefix(&[8083, 8081]));
        assert!(!seq.matches_prefix(&[8081]));
        assert!(!seq.matches_prefix(&[8083, 8082]));
        assert!(!seq.matches_prefix(&[8083, 8081, 8082, 8083]));

        assert!(seq.is_complete(&[8083, 8081, 8082]));
        assert!(!seq.is_complete(&[8083, 8081]));
    }
}
