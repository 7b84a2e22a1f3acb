//! Error types for the observer API.
//!
//! [`ObserverError`] converts into an HTTP response with a JSON body
//! `{"error": ..., "status": ...}`. Engine errors keep their message and
//! get the status that matches their kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use surgitrack_core::error::EngineError;

/// Errors that can occur in the observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// An engine operation was rejected.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ObserverError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Engine(e) => match e {
                EngineError::UnknownRoom { .. }
                | EngineError::UnknownItem { .. }
                | EngineError::UnknownOperation { .. } => StatusCode::NOT_FOUND,
                EngineError::InvalidInterval { .. }
                | EngineError::InvalidProfile { .. }
                | EngineError::EventBeforeOperationStart { .. }
                | EngineError::DuplicateOperation { .. } => StatusCode::BAD_REQUEST,
                EngineError::NoActiveOperation { .. } | EngineError::IllegalTransition { .. } => {
                    StatusCode::CONFLICT
                }
                EngineError::TimeOverflow | EngineError::Evaluation { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}
