//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::knock::{KnockSequence, SequenceError};

/// Root configuration for the knock daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct KnockConfig {
    /// Bind address and gate port.
    pub listener: ListenerConfig,

    /// Knock sequence and grant duration.
    pub knock: SequenceConfig,

    /// Expiry sweeper settings.
    pub sweeper: SweeperConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl KnockConfig {
    /// Address of the gated endpoint.
    pub fn gate_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listener.bind_ip, self.listener.base_port)
    }

    /// Knock listener ports `base+1 ..= base+N`, or `None` if they overflow.
    pub fn knock_ports(&self) -> Option<Vec<u16>> {
        let base = self.listener.base_port;
        (1..=self.knock.sequence.len())
            .map(|i| u16::try_from(i).ok().and_then(|i| base.checked_add(i)))
            .collect()
    }

    pub fn knock_sequence(&self) -> Result<KnockSequence, SequenceError> {
        KnockSequence::new(self.knock.sequence.clone())
    }

    pub fn access_duration(&self) -> Duration {
        self.knock.access_duration
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweeper.interval
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP address every listener binds to.
    pub bind_ip: IpAddr,

    /// Gated port; knock ports follow it.
    pub base_port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            base_port: 8080,
        }
    }
}

/// Knock sequence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Ordered ports to knock on.
    pub sequence: Vec<u16>,

    /// How long a completed sequence grants access (e.g. `"5m"`).
    #[serde(with = "humantime_serde")]
    pub access_duration: Duration,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            sequence: vec![8081, 8082, 8083],
            access_duration: Duration::from_secs(300),
        }
    }
}

/// Expiry sweeper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweeperConfig {
    /// Interval between prune passes (e.g. `"1s"`).
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knock_ports_follow_base() {
        let config = KnockConfig::default();
        assert_eq!(config.knock_ports(), Some(vec![8081, 8082, 8083]));
        assert_eq!(config.gate_addr().port(), 8080);
    }

    #[test]
    fn test_knock_ports_overflow() {
        let mut config = KnockConfig::default();
        config.listener.base_port = 65534;
        assert_eq!(config.knock_ports(), None);
    }
}
