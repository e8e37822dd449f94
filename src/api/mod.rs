//! REST API handlers and shared response types

pub mod health;
pub mod mail;
pub mod metrics;

use serde::{Deserialize, Serialize};

/// Success body `{"ok": true}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
