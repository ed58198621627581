//! Shared utilities for integration testing.

use std::net::IpAddr;
use std::time::Duration;
use tokio::task::JoinHandle;

use port_knock::config::{validate_config, KnockConfig};
use port_knock::http::ServerError;
use port_knock::net::bind_listeners;
use port_knock::{KnockServer, Shutdown};

pub struct TestServer {
    pub base_port: u16,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn url(&self, port: u16) -> String {
        format!("http://127.0.0.1:{}/", port)
    }

    pub fn gate_url(&self) -> String {
        self.url(self.base_port)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server returned error");
    }
}

pub fn local_config(base_port: u16, offsets: &[u16], access_duration: Duration) -> KnockConfig {
    let mut config = KnockConfig::default();
    config.listener.bind_ip = "127.0.0.1".parse().unwrap();
    config.listener.base_port = base_port;
    config.knock.sequence = offsets.iter().map(|o| base_port + o).collect();
    config.knock.access_duration = access_duration;
    config.sweeper.interval = Duration::from_millis(100);
    validate_config(&config).expect("test config must be valid");
    config
}

/// Bind all listeners, then serve in the background.
pub async fn start_server(config: KnockConfig) -> TestServer {
    let base_port = config.listener.base_port;
    let listeners = bind_listeners(&config).await.unwrap();
    let server = KnockServer::new(config).unwrap();
    let shutdown = Shutdown::new();

    let handle = tokio::spawn(server.serve(listeners, shutdown.clone()));

    TestServer {
        base_port,
        shutdown,
        handle,
    }
}

/// Client with no connection reuse, optionally bound to a source address.
pub fn client(source: Option<IpAddr>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy();
    if let Some(ip) = source {
        builder = builder.local_address(ip);
    }
    builder.build().unwrap()
}

pub async fn get(client: &reqwest::Client, url: &str) -> (u16, String) {
    let res = client.get(url).send().await.expect("server unreachable");
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}
