use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Order not found")]
    NotFound,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid callback signature")]
    InvalidSignature,
    #[error("Order {order_id} was placed but payment setup failed: {reason}")]
    PaymentSetupFailed { order_id: Uuid, reason: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure reported by a payment gateway adapter.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0} credentials are not configured")]
    NotConfigured(&'static str),
    #[error("Amount cannot be charged: {0}")]
    InvalidAmount(String),
    #[error("Provider unreachable: {0}")]
    Transport(String),
    #[error("Provider rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    #[error("Could not record provider reference: {0}")]
    Persistence(String),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    #[error("Failed to build message: {0}")]
    Message(String),
    #[error("Delivery failed: {0}")]
    Transport(String),
}
