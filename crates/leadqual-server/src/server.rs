//! HTTP server setup and lifecycle

use crate::routes;
use anyhow::{Context, Result};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use leadqual_core::config::{Config, ServerSettings};
use leadqual_core::{Orchestrator, Router, Services, VLLMClient, VectorStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub router: Router,
    pub store: Arc<dyn VectorStore>,
    pub metrics: Option<Arc<VLLMClient>>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        orchestrator: Orchestrator,
        router: Router,
        store: Arc<dyn VectorStore>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            router,
            store,
            metrics: None,
            request_timeout,
        }
    }

    pub fn with_metrics(mut self, client: Arc<VLLMClient>) -> Self {
        self.metrics = Some(client);
        self
    }

    pub fn from_services(services: &Services, config: &Config) -> Result<Self> {
        let orchestrator = services.orchestrator(config)?;
        let router = services.router(config);
        Ok(Self::new(
            orchestrator,
            router,
            services.store.clone(),
            Duration::from_secs(config.server.request_timeout_secs),
        )
        .with_metrics(services.client.clone()))
    }
}

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);
    if origin == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("invalid CORS origin: {}", origin))?;
    Ok(layer.allow_origin(origin))
}

/// Build the router with all routes and middleware
pub fn build_app(state: AppState, settings: &ServerSettings) -> Result<axum::Router> {
    // Handlers enforce their own deadline; this only catches requests that hang past it
    let backstop = state.request_timeout + Duration::from_secs(settings.shutdown_grace_secs);

    Ok(axum::Router::new()
        .route("/query", post(routes::query_handler))
        .route("/agent", post(routes::agent_handler))
        .route("/health", get(routes::health_handler))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            backstop,
        ))
        .layer(cors_layer(&settings.cors_origin)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Serve until Ctrl-C, then drain in-flight requests for the grace period
pub async fn start_server(state: AppState, settings: &ServerSettings) -> Result<()> {
    let app = build_app(state, settings)?;
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
        }
    }

    let grace = Duration::from_secs(settings.shutdown_grace_secs);
    tracing::info!("Shutting down, waiting up to {:?} for in-flight requests", grace);
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!("Graceful shutdown timed out, aborting");
            server.abort();
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}
