//! Error types for the lending server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::enums::RequestStatus;

/// Stable error codes returned to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NotFound = 4,
    BadValue = 5,
    NotPending = 10,
    NotApproved = 11,
    NotIssuedOrOverdue = 12,
    NotApprovedOrPending = 13,
    NotEligible = 14,
    AlreadyTransitioned = 15,
    AlreadyReviewed = 16,
    InsufficientInventory = 20,
    LimitExceeded = 21,
    DuplicateActiveRequest = 22,
    PreconditionFailed = 30,
}

/// A status precondition that did not hold for the requested transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("request is {0}, expected pending")]
    NotPending(RequestStatus),

    #[error("request is {0}, expected approved")]
    NotApproved(RequestStatus),

    #[error("request is {0}, expected issued or overdue")]
    NotIssuedOrOverdue(RequestStatus),

    #[error("request is {0}, expected pending or approved")]
    NotApprovedOrPending(RequestStatus),

    #[error("not eligible: {0}")]
    NotEligible(String),

    #[error("request was modified by a concurrent transition")]
    AlreadyTransitioned,

    #[error("{0} review has already been decided")]
    AlreadyReviewed(String),
}

impl TransitionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransitionError::NotPending(_) => ErrorCode::NotPending,
            TransitionError::NotApproved(_) => ErrorCode::NotApproved,
            TransitionError::NotIssuedOrOverdue(_) => ErrorCode::NotIssuedOrOverdue,
            TransitionError::NotApprovedOrPending(_) => ErrorCode::NotApprovedOrPending,
            TransitionError::NotEligible(_) => ErrorCode::NotEligible,
            TransitionError::AlreadyTransitioned => ErrorCode::AlreadyTransitioned,
            TransitionError::AlreadyReviewed(_) => ErrorCode::AlreadyReviewed,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("Insufficient inventory for resource {resource_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        resource_id: i32,
        requested: i32,
        available: i32,
    },

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Requestor already has an active request for resource {0}")]
    DuplicateActiveRequest(i32),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Error code and HTTP status exposed to callers
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_) | AppError::Authorization(_) => ErrorCode::NotAuthorized,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::InvalidTransition(e) => e.code(),
            AppError::InsufficientInventory { .. } => ErrorCode::InsufficientInventory,
            AppError::LimitExceeded(_) => ErrorCode::LimitExceeded,
            AppError::DuplicateActiveRequest(_) => ErrorCode::DuplicateActiveRequest,
            AppError::PreconditionFailed(_) => ErrorCode::PreconditionFailed,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::InsufficientInventory { .. }
            | AppError::LimitExceeded(_)
            | AppError::DuplicateActiveRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
