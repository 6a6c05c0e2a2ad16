use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::cart::CartError;
use crate::domain::delivery::DeliveryError;
use crate::domain::order::OrderError;
use crate::domain::review::ReviewError;
use crate::domain::seller::CertificationError;
use crate::domain::UnknownVariant;
use crate::store::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Error Taxonomy
// ============================================================================
//
// Every failure a caller can observe maps to one ErrorKind. Domain errors
// stay specific to their aggregate; ServiceError is what handlers return.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    AlreadyAssigned,
    Forbidden,
    AlreadyResponded,
    Duplicate,
    UploadFailed,
    Validation,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::AlreadyAssigned => "already_assigned",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::AlreadyResponded => "already_responded",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::UploadFailed => "upload_failed",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("{kind} {id} kept changing underneath the update")]
    Conflict { kind: &'static str, id: Uuid },

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Certification(#[from] CertificationError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        ServiceError::NotFound { kind, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::Conflict { .. } => ErrorKind::Conflict,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::Validation(_) => ErrorKind::Validation,

            ServiceError::Order(e) => match e {
                OrderError::InvalidTransition { .. } | OrderError::InvalidPaymentTransition { .. } => {
                    ErrorKind::InvalidTransition
                }
                OrderError::Forbidden(_) => ErrorKind::Forbidden,
                OrderError::ItemNotFound(_) => ErrorKind::NotFound,
                OrderError::NotInitialized => ErrorKind::Internal,
                _ => ErrorKind::Validation,
            },

            ServiceError::Delivery(e) => match e {
                DeliveryError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
                DeliveryError::AlreadyAssigned(_) => ErrorKind::AlreadyAssigned,
                DeliveryError::Forbidden(_) => ErrorKind::Forbidden,
                DeliveryError::Duplicate(_) => ErrorKind::Duplicate,
                DeliveryError::OrderNotShippable(_) => ErrorKind::InvalidTransition,
                DeliveryError::NotInitialized => ErrorKind::Internal,
            },

            ServiceError::Review(e) => match e {
                ReviewError::Forbidden(_) => ErrorKind::Forbidden,
                ReviewError::Duplicate(_) => ErrorKind::Duplicate,
                ReviewError::AlreadyResponded => ErrorKind::AlreadyResponded,
                ReviewError::AlreadyPublished => ErrorKind::InvalidTransition,
                ReviewError::NotInitialized => ErrorKind::Internal,
                _ => ErrorKind::Validation,
            },

            ServiceError::Certification(e) => match e {
                CertificationError::Forbidden(_) => ErrorKind::Forbidden,
                CertificationError::NotClaimed(_) | CertificationError::AlreadyApproved(_) => {
                    ErrorKind::InvalidTransition
                }
                CertificationError::NotInitialized => ErrorKind::Internal,
                _ => ErrorKind::Validation,
            },

            ServiceError::Cart(_) => ErrorKind::Validation,

            ServiceError::Store(e) => match e {
                StoreError::Missing { .. } => ErrorKind::NotFound,
                StoreError::AlreadyExists { .. } => ErrorKind::Duplicate,
                _ => ErrorKind::Internal,
            },
        }
    }
}

impl From<UnknownVariant> for ServiceError {
    fn from(err: UnknownVariant) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl IsTransient for ServiceError {
    fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Conflict { .. })
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorKind,
    message: &'a str,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InvalidTransition
            | ErrorKind::AlreadyAssigned
            | ErrorKind::AlreadyResponded
            | ErrorKind::Duplicate
            | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::UploadFailed => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(error = %self, "Request failed");
        }

        // Storage internals are not echoed back to callers
        let message = match kind {
            ErrorKind::Internal => "internal error".to_string(),
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: kind,
            message: &message,
        })
    }
}
