use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotCancellable(String),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Invalid callback signature")]
    InvalidSignature,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    #[error("Order was placed but payment setup failed")]
    PaymentSetupFailed { order_id: Uuid },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable discriminator carried in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotCancellable(_) => "ORDER_NOT_CANCELLABLE",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::InvalidSignature => "INVALID_SIGNATURE",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound => "NOT_FOUND",
            AppError::PaymentSetupFailed { .. } => "PAYMENT_SETUP_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::EmptyCart => AppError::BadRequest(e.to_string()),
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::NotFound => AppError::NotFound,
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::Conflict(msg) => AppError::NotCancellable(msg),
            DomainError::InvalidSignature => AppError::InvalidSignature,
            DomainError::PaymentSetupFailed { order_id, .. } => {
                AppError::PaymentSetupFailed { order_id }
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::NotCancellable(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PaymentSetupFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::PaymentSetupFailed { order_id } => json!({
                "error": self.to_string(),
                "code": self.code(),
                "orderId": order_id
            }),
            AppError::Internal(_) => json!({
                "error": "Internal server error",
                "code": self.code()
            }),
            _ => json!({
                "error": self.to_string(),
                "code": self.code()
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
