//! Server initialization and routing

use crate::api;
use crate::config::{Config, CorsConfig};
use crate::email::{MailDelivery, SmtpDeliveryClient};
use crate::middleware::{normalize_error_response, ObservabilityLayer};
use crate::service::RelayService;
use crate::state::HasRelay;
use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay_service: Arc<RelayService>,
}

impl AppState {
    pub fn new(config: Arc<Config>, delivery: Arc<dyn MailDelivery>) -> Self {
        let relay_service = Arc::new(RelayService::new(config.clone(), delivery));
        Self {
            config,
            relay_service,
        }
    }
}

impl HasRelay for AppState {
    fn config(&self) -> &Config {
        &self.config
    }

    fn relay_service(&self) -> &RelayService {
        &self.relay_service
    }
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let config = Arc::new(config);

    let delivery = SmtpDeliveryClient::from_config(&config.relay)
        .context("Failed to create SMTP delivery client")?;
    info!(
        relay = %format!("{}:{}", config.relay.host, config.relay.port),
        form_mode = ?config.form.mode,
        "SMTP delivery client ready"
    );

    let state = AppState::new(config.clone(), Arc::new(delivery));

    let mut app = build_router(state);
    if prometheus_handle.is_some() {
        app = app.merge(metrics_router(prometheus_handle));
    }

    let http_addr = config.http_addr();
    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;
    info!("HTTP server started on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Build the HTTP router with generic state type
///
/// Generic over the state so tests can plug in a fake delivery client.
pub fn build_router<S: HasRelay>(state: S) -> Router {
    let cors = cors_layer(&state.config().cors);

    Router::new()
        .route("/health", get(api::health::health))
        .route("/api/v1/send_mail", post(api::mail::send_mail::<S>))
        .with_state(state)
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(ObservabilityLayer)
}

fn metrics_router(handle: Option<PrometheusHandle>) -> Router {
    Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(handle))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight requests");
}
