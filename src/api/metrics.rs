//! Prometheus /metrics endpoint

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics
///
/// Only routed when metrics are enabled, but answers 404 if the recorder was
/// never installed.
pub async fn metrics_handler(State(handle): State<Arc<Option<PrometheusHandle>>>) -> Response {
    match handle.as_ref() {
        Some(h) => (
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            h.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
