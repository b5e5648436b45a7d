use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use octofhir_direct_grant::{DirectGrantState, GrantProcessor, direct_grant_handler};
use octofhir_direct_grant_memory::{InMemoryClientRegistry, InMemoryTokenIssuer};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    handlers,
    middleware::{TrustedProxyAuth, trusted_proxy_middleware},
};

pub struct DirectGrantServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the application with in-memory collaborators populated from `cfg`.
pub fn build_app(cfg: &ServerConfig) -> anyhow::Result<Router> {
    let registry = InMemoryClientRegistry::from_clients(cfg.registered_clients())
        .context("invalid client registration")?;
    let issuer = InMemoryTokenIssuer::new(cfg.issuer.clone());

    tracing::info!(clients = registry.len(), "Client registry initialized");

    let processor = GrantProcessor::new(Arc::new(registry), Arc::new(issuer), cfg.grant.clone());
    build_router(cfg, Arc::new(processor))
}

/// Builds the router around an existing processor.
pub fn build_router(cfg: &ServerConfig, processor: Arc<GrantProcessor>) -> anyhow::Result<Router> {
    let auth = TrustedProxyAuth::from_settings(&cfg.authentication)
        .context("invalid authentication header configuration")?;

    let app = Router::new()
        .route(&cfg.server.endpoint_path, post(direct_grant_handler))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(auth),
            trusted_proxy_middleware,
        ))
        .with_state(DirectGrantState::new(processor))
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            cfg.server.request_timeout,
        ));

    Ok(app)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: ServerConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = ServerConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: ServerConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<DirectGrantServer> {
        let app = build_app(&self.config)?;

        Ok(DirectGrantServer {
            addr: self.addr,
            app,
        })
    }
}

impl DirectGrantServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
