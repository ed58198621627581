//! Port-knocking daemon.
//!
//! ```text
//!            knock 1      knock 2      knock N
//!   peer ──▶ :base+1 ──▶ :base+2 ──▶ … :base+N
//!              │            │             │
//!              └────────────┴──────┬──────┘
//!                                  ▼
//!                        ┌───────────────────┐     ┌────────────────┐
//!                        │ SequenceValidator │────▶│   Allowlist    │◀── ExpirySweeper
//!                        └───────────────────┘     └───────┬────────┘     (every 1s)
//!                                                          │
//!   peer ──▶ :base ─────────── is_allowed? ────────────────┘
//!            200 Access granted! | 403 Access denied!
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use port_knock::config::{read_config, validate_config, ConfigError, KnockConfig};
use port_knock::lifecycle::signals::wait_for_signal;
use port_knock::observability::{logging, metrics};
use port_knock::{KnockSequence, KnockServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "port-knockd")]
#[command(about = "Port-knocking gate for an HTTP endpoint", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The base (gated) port; knock ports follow it.
    #[arg(long)]
    base_port: Option<u16>,

    /// Comma-separated sequence of ports to knock on.
    #[arg(long)]
    knock_sequence: Option<KnockSequence>,

    /// How long access lasts after a successful knock (e.g. 90s, 5m, 1500ms).
    #[arg(long, value_parser = humantime::parse_duration)]
    access_duration: Option<Duration>,

    /// Log level or tracing filter directive.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<KnockConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => KnockConfig::default(),
        };

        if let Some(port) = self.base_port {
            config.listener.base_port = port;
        }
        if let Some(sequence) = self.knock_sequence {
            config.knock.sequence = sequence.ports().to_vec();
        }
        if let Some(duration) = self.access_duration {
            config.knock.access_duration = duration;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.into_config()?;

    logging::init(&config.observability.log_level);
    tracing::info!("port-knockd v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        base_port = config.listener.base_port,
        knock_sequence = ?config.knock.sequence,
        access_duration = %humantime::format_duration(config.access_duration()),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let server = KnockServer::new(config)?;
    server.run(shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(args: &[&str]) -> Result<KnockConfig, ConfigError> {
        let argv = std::iter::once("port-knockd").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn test_access_duration_keeps_sub_second_precision() {
        let config = config_from(&["--access-duration", "1500ms"]).unwrap();
        assert_eq!(config.access_duration(), Duration::from_millis(1500));

        let config = config_from(&["--access-duration", "500ms"]).unwrap();
        assert_eq!(config.access_duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_access_duration_units() {
        let config = config_from(&["--access-duration", "2m 30s"]).unwrap();
        assert_eq!(config.access_duration(), Duration::from_secs(150));
    }

    #[test]
    fn test_zero_access_duration_rejected() {
        assert!(matches!(
            config_from(&["--access-duration", "0s"]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_bare_number_rejected() {
        assert!(Cli::try_parse_from(["port-knockd", "--access-duration", "300"]).is_err());
    }

    #[test]
    fn test_overrides_apply_to_defaults() {
        let config = config_from(&["--base-port", "9000", "--knock-sequence", "9002,9001"]).unwrap();
        assert_eq!(config.listener.base_port, 9000);
        assert_eq!(config.knock.sequence, vec![9002, 9001]);
        assert_eq!(config.access_duration(), Duration::from_secs(300));
    }
}
