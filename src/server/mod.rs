//! Metrics server
//!
//! Serves the Prometheus pull endpoint. Every `GET /metrics` runs one
//! collection cycle; nothing is cached between scrapes.
//!
//! ```text
//! GET /          landing page
//! GET /health    liveness (JSON)
//! GET /metrics   text exposition of a fresh collection cycle
//! ```

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::collector::Collector;
use crate::config::Config;
use crate::error::Error;
use crate::metrics::ExporterMetrics;
use crate::upstream::DoctolibClient;

pub use api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Collection orchestrator
    pub collector: Arc<Collector>,

    /// Descriptors and self-metrics
    pub metrics: Arc<ExporterMetrics>,

    /// Server start time
    pub start_time: Instant,
}

// ============================================================================
// Exporter Server
// ============================================================================

/// Main exporter server
pub struct ExporterServer {
    bind_address: SocketAddr,
    state: AppState,
}

impl ExporterServer {
    /// Create a server talking to the configured upstream
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        config.validate()?;

        let client = DoctolibClient::new(&config.upstream).map_err(Error::from)?;
        let metrics = Arc::new(ExporterMetrics::new().map_err(Error::from)?);
        let collector = Collector::new(Arc::new(client), &config.collection, Arc::clone(&metrics));

        Ok(Self::from_parts(
            config.server.bind_address,
            Arc::new(collector),
            metrics,
        ))
    }

    /// Create a server from prebuilt components
    pub fn from_parts(
        bind_address: SocketAddr,
        collector: Arc<Collector>,
        metrics: Arc<ExporterMetrics>,
    ) -> Self {
        Self {
            bind_address,
            state: AppState {
                collector,
                metrics,
                start_time: Instant::now(),
            },
        }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Build the router with request tracing
    pub fn build_router(&self) -> Router {
        create_router(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.bind_address;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!("Listening on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("Exporter shutdown complete");
        Ok(())
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid configuration or failed component setup
    #[error("Initialization error: {0}")]
    Init(#[from] Error),

    /// Failed to bind to address
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Server error
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
