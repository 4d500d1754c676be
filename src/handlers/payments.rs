//! Inbound payment provider callbacks. Both are authenticated by signature
//! only; the caller identity headers play no part here.

use actix_web::{web, HttpResponse};
use log::warn;
use serde_json::json;

use super::AppState;
use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::infrastructure::payment::{HostedWebhook, WalletIpn};

/// POST /payments/wallet/ipn
#[utoipa::path(
    post,
    path = "/payments/wallet/ipn",
    request_body = WalletIpn,
    responses(
        (status = 204, description = "Notification processed"),
        (status = 400, description = "Notification does not reference an order"),
        (status = 401, description = "Invalid signature"),
        (status = 404, description = "Order not found"),
    ),
    tag = "payments"
)]
pub async fn wallet_ipn(
    state: web::Data<AppState>,
    body: web::Json<WalletIpn>,
) -> Result<HttpResponse, AppError> {
    let ipn = body.into_inner();
    if !state.wallet.verify_ipn(&ipn) {
        warn!("Wallet IPN for order {} failed signature check", ipn.order_id);
        return Err(DomainError::InvalidSignature.into());
    }
    let confirmation = ipn
        .confirmation()
        .ok_or_else(|| AppError::BadRequest(format!("unknown orderId '{}'", ipn.order_id)))?;

    // Declined, duplicate and mismatched callbacks are still acknowledged.
    state.confirmations.confirm(confirmation).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /payments/hosted/webhook
#[utoipa::path(
    post,
    path = "/payments/hosted/webhook",
    request_body = HostedWebhook,
    responses(
        (status = 200, description = "Webhook processed"),
        (status = 400, description = "Webhook lacks orderCode or amount"),
        (status = 401, description = "Invalid signature"),
        (status = 404, description = "Order not found"),
    ),
    tag = "payments"
)]
pub async fn hosted_webhook(
    state: web::Data<AppState>,
    body: web::Json<HostedWebhook>,
) -> Result<HttpResponse, AppError> {
    let webhook = body.into_inner();
    if !state.hosted.verify_webhook(&webhook) {
        warn!(
            "Hosted checkout webhook for code {:?} failed signature check",
            webhook.order_code()
        );
        return Err(DomainError::InvalidSignature.into());
    }
    let confirmation = webhook
        .confirmation()
        .ok_or_else(|| AppError::BadRequest("webhook lacks orderCode or amount".to_string()))?;

    state.confirmations.confirm(confirmation).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
