use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::AppState;
use crate::auth::Identity;
use crate::domain::order::{Order, OrderItem, OrderStatus, PaymentMethod};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    /// Unit price at checkout, as a decimal string, e.g. "9.99"
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: String,
    pub payment_method: PaymentMethod,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price.to_string(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount.to_string(),
            payment_method: order.payment_method,
            shipping_name: order.shipping.name,
            shipping_phone: order.shipping.phone,
            shipping_address: order.shipping.address,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub order_id: Uuid,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// The caller's own orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Orders placed by the caller", body = [OrderResponse]),
        (status = 401, description = "Missing or malformed identity"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_own_orders(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<HttpResponse, AppError> {
    let orders = state.orders.list_own_orders(identity.0).await?;
    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{id}
///
/// Returns the order together with its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 403, description = "Order belongs to another customer"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order = state.orders.get_order(identity.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/cancel
///
/// Cancels one of the caller's orders while it is still `PENDING`.
#[utoipa::path(
    post,
    path = "/orders/cancel",
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 400, description = "Order is no longer PENDING"),
        (status = 403, description = "Order belongs to another customer"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CancelOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order = state.orders.cancel(identity.0, body.order_id).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
