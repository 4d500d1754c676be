use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use super::AppState;
use crate::application::checkout_service::CheckoutResult;
use crate::auth::Identity;
use crate::domain::order::{PaymentMethod, ShippingDetails};
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
}

/// POST /checkout
///
/// Converts the caller's cart into a `PENDING` order and starts payment.
/// A 502 means the order exists but the provider could not be reached; the
/// body carries its `orderId`.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = CheckoutResult),
        (status = 400, description = "Empty cart or missing shipping details"),
        (status = 401, description = "Missing or malformed identity"),
        (status = 502, description = "Order placed but payment setup failed"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "checkout"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let shipping = ShippingDetails::new(
        &body.shipping_name,
        &body.shipping_phone,
        &body.shipping_address,
    )?;

    let result = state
        .checkout
        .checkout(identity.0.user_id, shipping, body.payment_method)
        .await?;
    Ok(HttpResponse::Created().json(result))
}
