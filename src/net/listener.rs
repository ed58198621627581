//! Listener binding for the gate and knock ports.
//!
//! # Responsibilities
//! - Derive the N+1 ports from one configuration
//! - Bind every port before any traffic is served
//! - Report which port failed

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::KnockConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// Knock ports do not fit above the base port.
    #[error("knock ports above base port {0} exceed 65535")]
    PortRange(u16),
}

/// All listeners for one server, bound and ready.
#[derive(Debug)]
pub struct BoundListeners {
    pub gate: TcpListener,
    /// Knock listeners paired with the port they represent.
    pub knocks: Vec<(u16, TcpListener)>,
}

/// Bind the gate port and every knock port.
///
/// If any bind fails the listeners bound so far are dropped and the error
/// is returned.
pub async fn bind_listeners(config: &KnockConfig) -> Result<BoundListeners, ListenerError> {
    let ports = config
        .knock_ports()
        .ok_or(ListenerError::PortRange(config.listener.base_port))?;

    let gate = bind(config.gate_addr()).await?;

    let mut knocks = Vec::with_capacity(ports.len());
    for port in ports {
        let addr = SocketAddr::new(config.listener.bind_ip, port);
        knocks.push((port, bind(addr).await?));
    }

    Ok(BoundListeners { gate, knocks })
}

async fn bind(addr: SocketAddr) -> Result<TcpListener, ListenerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;

    tracing::info!(address = %addr, "Listener bound");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config(base_port: u16) -> KnockConfig {
        let mut config = KnockConfig::default();
        config.listener.bind_ip = "127.0.0.1".parse().unwrap();
        config.listener.base_port = base_port;
        config.knock.sequence = vec![base_port + 2, base_port + 1];
        config
    }

    #[tokio::test]
    async fn test_binds_gate_and_knock_ports() {
        let bound = bind_listeners(&local_config(29400)).await.unwrap();

        assert_eq!(bound.gate.local_addr().unwrap().port(), 29400);
        let ports: Vec<u16> = bound.knocks.iter().map(|(p, _)| *p).collect();
        assert_eq!(ports, vec![29401, 29402]);
        for (port, listener) in &bound.knocks {
            assert_eq!(listener.local_addr().unwrap().port(), *port);
        }
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_port() {
        let _held = TcpListener::bind("127.0.0.1:29412").await.unwrap();

        let err = bind_listeners(&local_config(29410)).await.unwrap_err();
        match err {
            ListenerError::Bind { addr, .. } => assert_eq!(addr.port(), 29412),
            other => panic!("unexpected error: {other}"),
        }
    }
}
