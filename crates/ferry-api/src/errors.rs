use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ferry_core::FerryError;
use serde_json::json;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Maps core errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub FerryError);

impl From<FerryError> for ApiError {
    fn from(err: FerryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            FerryError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_input", msg),
            FerryError::NotFound(_) => {
                json_error(StatusCode::NOT_FOUND, "not_found", "Message not found")
            }
            FerryError::StoreUnavailable(err) => {
                tracing::error!(error = %err, "queue store failure");
                json_error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    err.to_string(),
                )
            }
            FerryError::Codec(err) => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "codec_error", err.to_string())
            }
            err @ FerryError::WorkerStopped(_) => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string())
            }
            err @ FerryError::CorruptRecord { .. } => {
                tracing::error!(error = %err, "corrupt record in queue store");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "corrupt_record", err.to_string())
            }
        }
    }
}
