use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::users::{
    dto::MessageResponse,
    repo::{StoreError, UniqueField},
    services::UserServiceError,
};

pub const USER_NOT_FOUND: &str = "User not found";
pub const ERROR_RETRIEVING_USERS: &str = "Unable to retrieve users";
pub const INVALID_LIMIT_PARAM: &str = "Invalid limit parameter; must be a number";
pub const INVALID_OFFSET_PARAM: &str = "Invalid offset parameter; must be a number";
pub const INVALID_ID_PARAM: &str = "Invalid UUID parameter; must be a UUID";
pub const ERROR_PARSING_JSON: &str = "Unable to parse request body as JSON";
pub const USER_CREATION_ERROR: &str = "Unable to create user";
pub const USER_UPDATE_ERROR: &str = "Unable to update user";
pub const USER_DELETE_ERROR: &str = "Unable to delete user";
pub const USER_DELETION_SUCCESS: &str = "User successfully deleted";
pub const INTERNAL_SERVER_ERROR: &str = "An internal server error has occurred";
pub const EMAIL_ALREADY_EXISTS: &str = "Email already exists";
pub const USERNAME_ALREADY_EXISTS: &str = "Username already exists";
pub const UNIQUE_CONSTRAINT_VIOLATION: &str = "Unique constraint violation";

/// The endpoint an error came from; picks the wording and status of opaque
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn failure(self) -> ApiError {
        let (status, message) = match self {
            Operation::List => (StatusCode::INTERNAL_SERVER_ERROR, ERROR_RETRIEVING_USERS),
            Operation::Get => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR),
            Operation::Create => (StatusCode::BAD_REQUEST, USER_CREATION_ERROR),
            Operation::Update => (StatusCode::BAD_REQUEST, USER_UPDATE_ERROR),
            Operation::Delete => (StatusCode::INTERNAL_SERVER_ERROR, USER_DELETE_ERROR),
        };
        ApiError::OperationFailed { status, message }
    }
}

/// Everything a handler can answer with besides success.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),
    #[error("malformed request body")]
    BadRequest,
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("unique constraint violation on {0:?}")]
    Conflict(UniqueField),
    #[error("user not found")]
    NotFound,
    #[error("operation failed: {message}")]
    OperationFailed {
        status: StatusCode,
        message: &'static str,
    },
}

impl ApiError {
    /// Maps a service outcome for `op` onto the response taxonomy.
    pub fn from_service(op: Operation, err: UserServiceError) -> Self {
        match err {
            UserServiceError::Store(StoreError::NotFound) => ApiError::NotFound,
            UserServiceError::Store(StoreError::Conflict(field)) => ApiError::Conflict(field),
            other => {
                error!(?op, error = %other, "user operation failed");
                op.failure()
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParam(_)
            | ApiError::BadRequest
            | ApiError::ValidationFailed(_)
            | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::OperationFailed { status, .. } => *status,
        }
    }

    /// Client-facing text. Never carries infrastructure error details.
    pub fn message(&self) -> &str {
        match self {
            ApiError::InvalidParam(message) => *message,
            ApiError::BadRequest => ERROR_PARSING_JSON,
            ApiError::ValidationFailed(message) => message.as_str(),
            ApiError::Conflict(UniqueField::Username) => USERNAME_ALREADY_EXISTS,
            ApiError::Conflict(UniqueField::Email) => EMAIL_ALREADY_EXISTS,
            ApiError::Conflict(UniqueField::Other(_)) => UNIQUE_CONSTRAINT_VIOLATION,
            ApiError::NotFound => USER_NOT_FOUND,
            ApiError::OperationFailed { message, .. } => *message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(MessageResponse {
                message: self.message().to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(err: StoreError) -> UserServiceError {
        UserServiceError::Store(err)
    }

    #[test]
    fn not_found_is_404_for_every_operation() {
        for op in [Operation::Get, Operation::Update, Operation::Delete] {
            let err = ApiError::from_service(op, store(StoreError::NotFound));
            assert_eq!(err.status(), StatusCode::NOT_FOUND);
            assert_eq!(err.message(), USER_NOT_FOUND);
        }
    }

    #[test]
    fn conflicts_name_the_field() {
        let username = ApiError::from_service(
            Operation::Create,
            store(StoreError::Conflict(UniqueField::Username)),
        );
        assert_eq!(username.status(), StatusCode::BAD_REQUEST);
        assert_eq!(username.message(), USERNAME_ALREADY_EXISTS);

        let email =
            ApiError::from_service(Operation::Update, store(StoreError::Conflict(UniqueField::Email)));
        assert_eq!(email.message(), EMAIL_ALREADY_EXISTS);

        let other = ApiError::from_service(
            Operation::Create,
            store(StoreError::Conflict(UniqueField::Other("users_pkey".into()))),
        );
        assert_eq!(other.message(), UNIQUE_CONSTRAINT_VIOLATION);
    }

    #[test]
    fn opaque_failures_use_verb_specific_wording() {
        let cases = [
            (Operation::List, StatusCode::INTERNAL_SERVER_ERROR, ERROR_RETRIEVING_USERS),
            (Operation::Get, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR),
            (Operation::Create, StatusCode::BAD_REQUEST, USER_CREATION_ERROR),
            (Operation::Update, StatusCode::BAD_REQUEST, USER_UPDATE_ERROR),
            (Operation::Delete, StatusCode::INTERNAL_SERVER_ERROR, USER_DELETE_ERROR),
        ];
        for (op, status, message) in cases {
            let err = ApiError::from_service(op, store(StoreError::Database(sqlx::Error::PoolTimedOut)));
            assert_eq!(err.status(), status);
            assert_eq!(err.message(), message);
        }
    }

    #[test]
    fn hashing_failure_is_opaque() {
        let err = ApiError::from_service(
            Operation::Create,
            UserServiceError::Hashing("argon2 exploded".into()),
        );
        assert_eq!(err.message(), USER_CREATION_ERROR);
        assert!(!err.message().contains("argon2"));
    }
}
