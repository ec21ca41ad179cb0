use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParksError {
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Could not generate a unique {kind} code from base '{base}'")]
    CodeExhausted { kind: &'static str, base: String },

    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ParksError>;

impl ParksError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ParksError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ParksError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ParksError::Validation(_) | ParksError::InvalidPolygon(_) | ParksError::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            ParksError::NotFound { .. } => StatusCode::NOT_FOUND,
            ParksError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for ParksError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = message.clone().unwrap_or_else(|| code.to_string());
                if detail.contains("FOREIGN KEY") {
                    ParksError::Conflict(
                        "record is referenced by, or references, a missing record".to_string(),
                    )
                } else {
                    ParksError::Conflict(detail)
                }
            }
            _ => ParksError::Database(err),
        }
    }
}

impl From<JsonRejection> for ParksError {
    fn from(rejection: JsonRejection) -> Self {
        ParksError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ParksError {
    fn from(rejection: QueryRejection) -> Self {
        ParksError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ParksError {
    fn from(rejection: PathRejection) -> Self {
        ParksError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ParksError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
