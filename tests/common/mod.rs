//! Common test utilities
//!
//! Drives the production router with a recording delivery client in place of
//! the SMTP transport, so no network access is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use mail_relay::config::{
    Config, CorsConfig, FormConfig, FormMode, RelayConfig, TelemetryConfig,
};
use mail_relay::domain::OutboundMessage;
use mail_relay::email::{DeliveryError, MailDelivery};
use mail_relay::server::{build_router, AppState};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Create a test config for the given form mode
pub fn test_config(mode: FormMode) -> Config {
    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        relay: RelayConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "relay@example.com".to_string(),
            password: "app-password".to_string(),
            from_email: "relay@example.com".to_string(),
            to_email: "inbox@example.com".to_string(),
            timeout_secs: 20,
        },
        form: FormConfig {
            mode,
            ..FormConfig::default()
        },
        cors: CorsConfig::default(),
        telemetry: TelemetryConfig::default(),
    }
}

/// Delivery client that records every message and answers with a fixed result
pub struct RecordingDelivery {
    sent: Mutex<Vec<OutboundMessage>>,
    failure: Option<DeliveryError>,
}

impl RecordingDelivery {
    pub fn succeeding() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn failing(error: DeliveryError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailDelivery for RecordingDelivery {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Router plus a handle on the fake delivery client
pub struct TestApp {
    pub router: Router,
    pub delivery: Arc<RecordingDelivery>,
}

impl TestApp {
    pub fn new(config: Config, delivery: RecordingDelivery) -> Self {
        let delivery = Arc::new(delivery);
        let state = AppState::new(Arc::new(config), delivery.clone());
        Self {
            router: build_router(state),
            delivery,
        }
    }

    pub fn strict() -> Self {
        Self::new(test_config(FormMode::Strict), RecordingDelivery::succeeding())
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.request(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        self.request(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.request(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}
