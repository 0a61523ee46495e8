//! Error types for the catalog server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::BookId;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Book with id {0} not found")]
    BookNotFound(BookId),

    #[error("Book with id {0} is already borrowed")]
    AlreadyBorrowed(BookId),

    #[error("Book with id {0} is already returned")]
    AlreadyReturned(BookId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request")]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Could not generate a free book id after {attempts} attempts")]
    IdGenerationExhausted { attempts: u32 },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body.
///
/// `path` and `correlation_id` are completed by the correlation middleware,
/// which is the only place that knows the request URI.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub details: Option<Vec<String>>,
    pub correlation_id: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::BookNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyBorrowed(_) | AppError::AlreadyReturned(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Redis(_)
            | AppError::IdGenerationExhausted { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<Vec<String>> {
        match self {
            AppError::InvalidRequest(errors) => {
                let mut details: Vec<String> = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| match &e.message {
                            Some(message) => format!("{}: {}", field, message),
                            None => format!("{}: {}", field, e.code),
                        })
                    })
                    .collect();
                details.sort();
                Some(details)
            }
            _ => None,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::IdGenerationExhausted { attempts } => {
                tracing::error!("Book id generation gave up after {} attempts", attempts);
                "Internal server error".to_string()
            }
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            timestamp: Utc::now(),
            path: String::new(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: self.public_message(),
            details: self.details(),
            correlation_id: None,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Malformed or mistyped JSON bodies get the same error body as any other
/// invalid input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
