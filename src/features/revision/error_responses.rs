use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::data::models::RevisionError;

impl IntoResponse for RevisionError {
    fn into_response(self) -> Response {
        let status = match &self {
            RevisionError::ScheduleNotFound(_) | RevisionError::NoScheduleForItem { .. } => {
                StatusCode::NOT_FOUND
            }
            RevisionError::DuplicateSchedule { .. }
            | RevisionError::InconsistentState(_)
            | RevisionError::ConcurrentModification(_) => StatusCode::CONFLICT,
            RevisionError::InvalidCheckpoint(_)
            | RevisionError::InvalidEffectiveness(_)
            | RevisionError::InvalidDifficulty(_)
            | RevisionError::ValidationError(_) => StatusCode::BAD_REQUEST,
            RevisionError::DatabaseError(_)
            | RevisionError::PoolError(_)
            | RevisionError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            RevisionError::DatabaseError(e) => {
                log::error!("Database error: {}", e);
                format!("Database error: {}", e)
            }
            RevisionError::SerializationError(e) => {
                log::error!("Stored schedule could not be decoded: {}", e);
                format!("Serialization error: {}", e)
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}
