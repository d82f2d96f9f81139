use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracklift::{error::MigrationError, MigrationFailure};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or undecodable callback parameters (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A run that aborted; its partial report is returned to the caller.
    #[error(transparent)]
    Migration(#[from] MigrationFailure),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Migration(failure) => match failure.error {
                MigrationError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
                MigrationError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
                MigrationError::CatalogUnavailable(_)
                | MigrationError::UpstreamSearchFailure { .. }
                | MigrationError::PlaylistCreationFailure(_)
                | MigrationError::UpstreamWriteFailure { .. } => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(message) => json!({
                "error": message,
                "kind": "bad_request",
                "report": null,
            }),
            ApiError::Migration(failure) => json!({
                "error": failure.error.to_string(),
                "kind": failure.error.kind(),
                "report": failure.report,
            }),
        };
        (status, Json(body)).into_response()
    }
}
