//! Unified error handling for the back office.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sav_core::models::{InterventionError, PaymentError};
use sav_core::{SignatureError, TransitionError, ValidationError};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Resource not found (or owned by another store).
    #[error("Not found: {0}")]
    NotFound(String),

    /// No valid session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The record's state forbids the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Not found error for a record kind and id.
    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::NotFound(format!("{kind} {id}"))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<InterventionError> for AppError {
    fn from(err: InterventionError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotPositive | PaymentError::Overpayment { .. } => {
                Self::BadRequest(err.to_string())
            }
            PaymentError::Cancelled | PaymentError::AlreadyPaid => Self::Conflict(err.to_string()),
        }
    }
}

impl From<SignatureError> for AppError {
    fn from(err: SignatureError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Store(_) | Self::Internal(_))
            && !matches!(self, Self::Store(StoreError::InvalidId(_)))
        {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Store(StoreError::NotFound { .. } | StoreError::InvalidId(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Store(StoreError::Conflict { .. }) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(StoreError::RateLimited(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(StoreError::NotFound { .. } | StoreError::InvalidId(_)) => {
                "Not found".to_string()
            }
            Self::Store(StoreError::Conflict { .. }) => "Already exists".to_string(),
            Self::Store(_) => "Document store unavailable".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Tag Sentry events with the logged-in store.
pub fn set_sentry_store(magasin: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(magasin.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_store() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::not_found("order", "abc");
        assert_eq!(err.to_string(), "Not found: order abc");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_map_by_kind() {
        assert_eq!(
            get_status(StoreError::not_found("orders", "x").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(StoreError::InvalidId("..".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(StoreError::Unauthorized.into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(StoreError::RateLimited(5).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_domain_errors_map_to_client_errors() {
        assert_eq!(
            get_status(PaymentError::NotPositive.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(PaymentError::Cancelled.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(InterventionError::SignatureRequired.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ValidationError::Required("name").into()),
            StatusCode::BAD_REQUEST
        );
    }
}
