use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ferry_core::{FerryError, QueueLengths};

use crate::ApiState;
use crate::dto::{CommandAccepted, CommandRequest, MessageStatusResponse};
use crate::errors::{ApiError, json_error};

#[tracing::instrument(skip_all)]
pub(crate) async fn submit_command(
    State(state): State<ApiState>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "invalid_body",
                rejection.body_text(),
            ));
        }
    };

    let message_id = match request.message_id {
        Some(serde_json::Value::String(id)) if !id.is_empty() => id,
        _ => {
            return Err(FerryError::InvalidInput("message_id is required".to_string()).into());
        }
    };

    let envelope = state.producer.submit(message_id, request.payload).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CommandAccepted {
            status: "queued".to_string(),
            message_id: envelope.message_id().to_string(),
        }),
    )
        .into_response())
}

#[tracing::instrument(skip_all)]
pub(crate) async fn queue_status(
    State(state): State<ApiState>,
) -> Result<Json<QueueLengths>, ApiError> {
    Ok(Json(state.producer.queue_lengths().await?))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn message_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<MessageStatusResponse>, ApiError> {
    let view = state.producer.status(&id).await?;
    Ok(Json(MessageStatusResponse {
        message_id: view.message_id,
        status: view.status.to_string(),
        updated_at: view.updated_at,
    }))
}
