//! HTTP error responses.
//!
//! Every failure leaves the server as `{"error": message}` with a status
//! derived from the typed error behind it.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use lingolife_core::error::StoreError;
use lingolife_dictionary::DictionaryError;

use crate::auth::AuthError;

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a store failure. Client errors keep their own message; backend
    /// failures are logged and reported as `context`.
    pub fn from_store(err: StoreError, context: &str) -> Self {
        match err {
            StoreError::Validation(msg) => Self::bad_request(msg),
            StoreError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            StoreError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            StoreError::Unavailable(_) => {
                tracing::error!(error = %err, "{context}");
                Self::internal(context)
            }
        }
    }

    /// Map a dictionary failure.
    pub fn from_dictionary(err: anyhow::Error) -> Self {
        let Some(e) = err.downcast_ref::<DictionaryError>() else {
            tracing::error!(error = %err, "dictionary lookup failed");
            return Self::internal(format!("Failed to fetch from Youdao API: {err}"));
        };
        match e {
            DictionaryError::MissingQuery => Self::bad_request(e.to_string()),
            DictionaryError::NoResult => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            DictionaryError::NotConfigured | DictionaryError::Api { .. } => {
                tracing::warn!(error = %e, "dictionary lookup failed");
                Self::internal(e.to_string())
            }
            DictionaryError::Http { .. }
            | DictionaryError::Timeout(_)
            | DictionaryError::Network(_) => {
                tracing::error!(error = %e, "dictionary lookup failed");
                Self::internal(format!("Failed to fetch from Youdao API: {e}"))
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::MissingToken | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::FORBIDDEN,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Hashing(_) | AuthError::Signing(_) => {
                tracing::error!(error = %err, "credential processing failed");
                return Self::internal("Internal server error");
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
