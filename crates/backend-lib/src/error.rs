// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// No account exists for the submitted email
    #[error("Invalid email or password")]
    CredentialNotFound,

    /// The account exists but the password does not match
    #[error("Invalid email or password")]
    InvalidCredential,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Unauthorized")]
    Forbidden,

    /// Reserved for callers that must tell a rejected token apart from a
    /// missing one. The session guards never raise it: token failures
    /// collapse to "no session" and surface as `AuthenticationRequired`.
    #[error("Invalid session token")]
    TokenInvalid,

    /// The user store could not be reached or read
    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::CredentialNotFound
            | AppError::InvalidCredential
            | AppError::AuthenticationRequired
            | AppError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Internal(_) | AppError::Io(_) | AppError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    ///
    /// Both credential failures share a code so the response does not reveal
    /// whether the email exists.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::CredentialNotFound | AppError::InvalidCredential => "AUTH_001",
            AppError::AuthenticationRequired => "AUTH_002",
            AppError::Forbidden => "AUTH_003",
            AppError::TokenInvalid => "AUTH_004",
            AppError::ServiceUnavailable(_) => "SVC_001",
            AppError::Conflict(_) => "CONFLICT_001",
            AppError::InvalidInput(_) | AppError::Validation(_) => "VAL_001",
            AppError::Config(_) => "CFG_001",
            AppError::Internal(_) => "INT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::CredentialNotFound | AppError::InvalidCredential => {
                "Invalid email or password".to_string()
            },
            AppError::AuthenticationRequired | AppError::TokenInvalid => {
                "Authentication required".to_string()
            },
            AppError::Forbidden => "Unauthorized".to_string(),
            AppError::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Conflict(msg) | AppError::InvalidInput(msg) => msg.clone(),
            AppError::Validation(err) => err.to_string(),
            AppError::Config(_) | AppError::Internal(_) | AppError::Io(_) => {
                "An internal server error occurred".to_string()
            },
            AppError::Json(_) => "Invalid request format".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        } else {
            tracing::debug!(code = error_code, error = %self, "request rejected");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(what) => AppError::Conflict(what),
            StorageError::UsernameTaken(_) => AppError::Conflict(err.to_string()),
            StorageError::Unavailable(_) | StorageError::Corrupt(_) => {
                AppError::ServiceUnavailable(err.to_string())
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {err}"))
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_app_error_display() {
        assert_eq!(
            AppError::CredentialNotFound.to_string(),
            AppError::InvalidCredential.to_string()
        );
        assert_eq!(
            AppError::AuthenticationRequired.to_string(),
            "Authentication required"
        );

        let io_error = AppError::Io(IoError::new(ErrorKind::NotFound, "File not found"));
        assert!(io_error.to_string().contains("IO error"));
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::InvalidCredential.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::CredentialNotFound.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::ServiceUnavailable("db down".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Conflict("email".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_credential_failures_are_indistinguishable() {
        let not_found = AppError::CredentialNotFound;
        let invalid = AppError::InvalidCredential;
        assert_eq!(not_found.error_code(), invalid.error_code());
        assert_eq!(not_found.sanitized_message(), invalid.sanitized_message());
        assert_eq!(not_found.status_code(), invalid.status_code());
    }

    #[test]
    fn test_storage_errors_never_map_to_credential_failures() {
        let unavailable: AppError =
            StorageError::Unavailable(IoError::new(ErrorKind::Other, "disk gone")).into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let corrupt: AppError = StorageError::Corrupt("bad json".to_string()).into();
        assert_eq!(corrupt.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let conflict: AppError = StorageError::Conflict("email already in use".to_string()).into();
        assert!(matches!(conflict, AppError::Conflict(_)));

        let taken: AppError = StorageError::UsernameTaken("sam".to_string()).into();
        assert_eq!(taken.status_code(), StatusCode::CONFLICT);
        assert_eq!(taken.sanitized_message(), "User with this username already exists: sam");
    }

    #[test]
    fn test_token_invalid_reads_like_missing_session() {
        let invalid = AppError::TokenInvalid;
        assert_eq!(invalid.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.error_code(), "AUTH_004");
        assert_eq!(
            invalid.sanitized_message(),
            AppError::AuthenticationRequired.sanitized_message()
        );
    }

    #[test]
    fn test_error_from_impls() {
        let io_err = IoError::new(ErrorKind::PermissionDenied, "Permission denied");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));

        let app_err: AppError = "Str error".into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let response = AppError::InvalidCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "AUTH_001");
        assert_eq!(body["error"]["message"], "Invalid email or password");
    }
}
