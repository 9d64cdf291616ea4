//! Mapping of adapter errors onto HTTP responses

use agentmetrics_domain::AdapterError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::responses::Status;

/// Error returned by handlers, rendered as a Kubernetes `Status`.
#[derive(Debug)]
pub struct ApiError(pub AdapterError);

impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AdapterError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let reason = match code {
            StatusCode::BAD_REQUEST => "BadRequest",
            _ => "InternalError",
        };
        warn!(
            error = %self.0,
            error_type = self.0.label(),
            status = code.as_u16(),
            "Request failed"
        );

        (code, Json(Status::failure(code.as_u16(), reason, self.0.to_string()))).into_response()
    }
}
