//! Knock server setup.
//!
//! # Responsibilities
//! - Build one Axum router for the gate and one per knock port
//! - Share the allowlist and validator across every router
//! - Bind all listeners before serving any of them
//! - Run listeners and the expiry sweeper until shutdown

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tower_http::trace::TraceLayer;

use crate::access::{Allowlist, ExpirySweeper};
use crate::config::KnockConfig;
use crate::http::handlers::{gate_handler, knock_handler, GateState, KnockState};
use crate::knock::{KnockSequence, SequenceError, SequenceValidator};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::net::{bind_listeners, BoundListeners, ListenerError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("server IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Port-knocking server: one gated listener plus one listener per
/// sequence position, all sharing the same peer state.
pub struct KnockServer {
    config: KnockConfig,
    allowlist: Arc<Allowlist>,
    validator: Arc<SequenceValidator>,
}

impl KnockServer {
    /// Create a server from a validated configuration.
    pub fn new(config: KnockConfig) -> Result<Self, SequenceError> {
        let sequence = Arc::new(config.knock_sequence()?);
        let allowlist = Arc::new(Allowlist::new());
        let validator = Arc::new(SequenceValidator::new(
            sequence,
            allowlist.clone(),
            config.access_duration(),
        ));

        Ok(Self {
            config,
            allowlist,
            validator,
        })
    }

    pub fn config(&self) -> &KnockConfig {
        &self.config
    }

    pub fn sequence(&self) -> &KnockSequence {
        self.validator.sequence()
    }

    pub fn allowlist(&self) -> &Arc<Allowlist> {
        &self.allowlist
    }

    pub fn validator(&self) -> &Arc<SequenceValidator> {
        &self.validator
    }

    /// Router for the gated endpoint.
    pub fn gate_router(&self) -> Router {
        Router::new()
            .fallback(gate_handler)
            .with_state(GateState {
                allowlist: self.allowlist.clone(),
            })
            .layer(TraceLayer::new_for_http())
    }

    /// Router for the knock listener on `port`.
    pub fn knock_router(&self, port: u16) -> Router {
        Router::new()
            .fallback(knock_handler)
            .with_state(KnockState {
                validator: self.validator.clone(),
                port,
            })
            .layer(TraceLayer::new_for_http())
    }

    /// Bind every listener, then serve until `shutdown` fires.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), ServerError> {
        let listeners = bind_listeners(&self.config).await?;
        self.serve(listeners, shutdown).await
    }

    /// Serve already-bound listeners until `shutdown` fires.
    ///
    /// If any task fails the others are told to shut down and the first
    /// error is returned once all of them have stopped.
    pub async fn serve(self, listeners: BoundListeners, shutdown: Shutdown) -> Result<(), ServerError> {
        tracing::info!(
            sequence = %self.sequence(),
            access_duration = %humantime::format_duration(self.config.access_duration()),
            "Knock server starting"
        );

        let mut tasks: JoinSet<Result<(), std::io::Error>> = JoinSet::new();

        let sweeper = ExpirySweeper::new(self.allowlist.clone(), self.config.sweep_interval());
        let sweeper_shutdown = shutdown.subscribe();
        tasks.spawn(async move {
            sweeper.run(sweeper_shutdown).await;
            Ok(())
        });

        tasks.spawn(serve_listener(listeners.gate, self.gate_router(), shutdown.subscribe()));
        for (port, listener) in listeners.knocks {
            tasks.spawn(serve_listener(listener, self.knock_router(port), shutdown.subscribe()));
        }

        let mut first_error: Option<ServerError> = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(ServerError::from).and_then(|r| r.map_err(ServerError::from));
            if let Err(e) = result {
                tracing::error!(error = %e, "Server task failed, shutting down");
                shutdown.trigger();
                first_error.get_or_insert(e);
            }
        }

        tracing::info!("Knock server stopped");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn serve_listener(
    listener: TcpListener,
    router: Router,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server listening");

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown.triggered())
        .await?;

    tracing::info!(address = %addr, "HTTP server stopped");
    Ok(())
}
