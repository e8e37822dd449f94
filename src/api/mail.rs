//! Contact form submission endpoint

use crate::api::OkResponse;
use crate::domain::FormFields;
use crate::error::AppError;
use crate::state::HasRelay;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request, State},
    response::{IntoResponse, Response},
    Json,
};

/// Extractor accepting either a JSON object or a URL-encoded form body.
///
/// The content type is not consulted: JSON is tried first and anything that
/// does not parse as a JSON object is read as form data.
pub struct JsonOrForm(pub FormFields);

impl<S> FromRequest<S> for JsonOrForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(Self(FormFields::from_body(&body)))
    }
}

/// POST /api/v1/send_mail
///
/// Answers `{"ok": true}` both for delivered mail and for honeypot hits.
pub async fn send_mail<S: HasRelay>(
    State(state): State<S>,
    JsonOrForm(fields): JsonOrForm,
) -> Result<Json<OkResponse>, AppError> {
    state.relay_service().submit(&fields).await?;
    Ok(Json(OkResponse::ok()))
}
