//! # Error Handling for Resource Listeners
//!
//! Every verb on a [`ResourceListener`](crate::ResourceListener) returns
//! `Result<_, ApiError>`. The error renders itself as a structured problem
//! body (`status`, `title`, `detail`) so handlers never have to build one by hand.
//!
//! Database errors are logged with `tracing` and replaced with a generic message
//! before they reach the client.
//!
//! ```rust,ignore
//! async fn handler(State(listener): State<ResourceListener<Task>>) -> Result<Json<Model>, ApiError> {
//!     let task = listener.fetch(id).await?; // 404 if missing
//!     Ok(Json(task))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

use crate::filtering::InvalidParameter;

/// API error returned by every resource verb.
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found - the entity does not exist
    NotFound {
        /// Resource name (e.g. "task")
        resource: String,
        /// Identifier that was looked up
        id: Option<String>,
    },

    /// 400 Bad Request - malformed pagination, ordering or filter input
    InvalidParameter {
        /// User-facing error message
        message: String,
    },

    /// 403 Forbidden - the entity refused the operation
    Forbidden {
        /// User-facing error message
        message: String,
    },

    /// 405 Method Not Allowed - verb deliberately not implemented
    MethodNotSupported {
        /// User-facing error message
        message: String,
    },

    /// 409 Conflict - unique constraint violation
    Conflict {
        /// User-facing error message
        message: String,
    },

    /// 422 Unprocessable Entity - payload could not be hydrated into an entity
    UnprocessableEntity {
        /// User-facing error message
        message: String,
    },

    /// 500 Internal Server Error - backend failure (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - anything else
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 404 Not Found error
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    /// Create a 400 error for malformed list or payload parameters
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a 405 error for verbs that are not defined on a resource
    pub fn method_not_supported(message: impl Into<String>) -> Self {
        Self::MethodNotSupported {
            message: message.into(),
        }
    }

    /// Create a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a 422 error for payloads the hydrator rejected
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::UnprocessableEntity {
            message: message.into(),
        }
    }

    /// Create a 500 error from a database error. The details are logged, never sent.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 500 error with optional internal details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::MethodNotSupported { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with id '{id}' was not found"),
                None => format!("{resource} not found"),
            },
            Self::InvalidParameter { message }
            | Self::Forbidden { message }
            | Self::MethodNotSupported { message }
            | Self::Conflict { message }
            | Self::UnprocessableEntity { message }
            | Self::Database { message, .. }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// The structured problem value sent to clients
    #[must_use]
    pub fn problem(&self) -> Problem {
        let status = self.status_code();
        Problem {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            detail: self.user_message(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API problem"
                );
            }
        }
    }
}

/// Problem body sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Problem {
    /// Numeric HTTP status
    pub status: u16,
    /// Reason phrase for the status
    pub title: String,
    /// What went wrong
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();
        (self.status_code(), Json(self.problem())).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// `RecordNotFound` becomes 404, unique violations 409, everything else 500.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        if let DbErr::RecordNotFound(msg) = &err {
            let resource = msg.split_whitespace().next().unwrap_or("Resource");
            return Self::NotFound {
                resource: resource.to_string(),
                id: None,
            };
        }
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            tracing::debug!(detail = %detail, "Unique constraint violation");
            return Self::conflict("Duplicate entry");
        }
        Self::database(err)
    }
}

impl From<InvalidParameter> for ApiError {
    fn from(err: InvalidParameter) -> Self {
        Self::invalid_parameter(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_with_id() {
        let err = ApiError::not_found("task", Some("123".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "task with id '123' was not found");
    }

    #[test]
    fn test_not_found_without_id() {
        let err = ApiError::not_found("task", None);
        assert_eq!(err.user_message(), "task not found");
    }

    #[test]
    fn test_method_not_supported() {
        let err = ApiError::method_not_supported("The DELETE method has not been defined for collections");
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_problem_body() {
        let problem = ApiError::forbidden("Cannot delete project with id 7").problem();
        assert_eq!(problem.status, 403);
        assert_eq!(problem.title, "Forbidden");
        assert_eq!(problem.detail, "Cannot delete project with id 7");
    }

    #[test]
    fn test_database_error_is_sanitized() {
        let err = ApiError::database(DbErr::Type("column mismatch in tasks".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "A database error occurred");
        assert!(!err.problem().detail.contains("tasks"));
    }

    #[test]
    fn test_dberr_record_not_found_becomes_404() {
        let api_err: ApiError = DbErr::RecordNotFound("task not found".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(api_err.user_message(), "task not found");
    }

    #[test]
    fn test_other_dberr_become_500() {
        for db_err in [
            DbErr::Custom("Any custom error".to_string()),
            DbErr::Type("Type error".to_string()),
            DbErr::Json("JSON error".to_string()),
        ] {
            let api_err: ApiError = db_err.into();
            assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_invalid_parameter_conversion() {
        let api_err: ApiError = InvalidParameter::UnknownFilterType("like".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::BAD_REQUEST);
        assert!(api_err.user_message().contains("like"));
    }

    #[test]
    fn test_all_status_codes() {
        let cases = vec![
            (ApiError::not_found("Test", None), 404),
            (ApiError::invalid_parameter("Test"), 400),
            (ApiError::forbidden("Test"), 403),
            (ApiError::method_not_supported("Test"), 405),
            (ApiError::conflict("Test"), 409),
            (ApiError::unprocessable("Test"), 422),
            (ApiError::internal("Test", None), 500),
        ];
        for (err, expected) in cases {
            assert_eq!(err.problem().status, expected);
        }
    }
}
