use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Malformed or out of range input, detected before reaching the store.
    #[error("{msg}")]
    ValidationError { msg: String },
    #[error("{msg}")]
    NotFound { msg: String },
    #[error("MongoDB Error: '{msg}'")]
    MongoError { msg: String },
    #[error("Bson Serialization Error: '{msg}'")]
    BsonError { msg: String },
    #[error("Reqwest Error: '{msg}'")]
    ReqwestError { msg: String },
    #[error("Parse Error: '{msg}'")]
    ParseError { msg: String },
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError { msg: msg.into() }
    }

    pub fn player_not_found(id: &str) -> Self {
        AppError::NotFound {
            msg: format!("no player found with id '{}'", id),
        }
    }

    /// The error kind reported to clients in the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError { .. } => "ValidationError",
            AppError::NotFound { .. } => "NotFound",
            _ => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Store and transport details stay in the logs.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
