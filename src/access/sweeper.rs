//! Background expiry sweeper.
//!
//! # Responsibilities
//! - Periodically prune expired allowlist entries
//! - Stop promptly on the shutdown signal

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};

use crate::access::Allowlist;
use crate::lifecycle::ShutdownSignal;

pub struct ExpirySweeper {
    allowlist: Arc<Allowlist>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(allowlist: Arc<Allowlist>, interval: Duration) -> Self {
        Self { allowlist, interval }
    }

    /// Run until `shutdown` fires (or its coordinator is dropped).
    ///
    /// A pass is synchronous, so a signal arriving mid-pass is observed as
    /// soon as that pass returns.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(interval = %humantime::format_duration(self.interval), "Expiry sweeper starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.allowlist.prune(Instant::now());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Expiry sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use std::net::{IpAddr, Ipv4Addr};

    const PEER: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 7));

    #[tokio::test]
    async fn test_sweeper_prunes_expired_entries() {
        let allowlist = Arc::new(Allowlist::new());
        allowlist.grant(PEER, Duration::from_millis(20));

        let shutdown = Shutdown::new();
        let sweeper = ExpirySweeper::new(allowlist.clone(), Duration::from_millis(10));
        let handle = tokio::spawn(sweeper.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(allowlist.is_empty());

        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let allowlist = Arc::new(Allowlist::new());
        let shutdown = Shutdown::new();
        let sweeper = ExpirySweeper::new(allowlist, Duration::from_secs(3600));
        let handle = tokio::spawn(sweeper.run(shutdown.subscribe()));

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
