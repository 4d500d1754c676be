use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::orders::OrderResponse;
use super::AppState;
use crate::auth::Identity;
use crate::domain::order::OrderStatus;
use crate::errors::AppError;

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_id: Uuid,
    pub status: OrderStatus,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /admin/orders
#[utoipa::path(
    get,
    path = "/admin/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of all orders", body = ListOrdersResponse),
        (status = 403, description = "Administrator privilege required"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "admin"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = state.orders.list_orders(identity.0, page, limit).await?;
    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// POST /admin/orders/status
///
/// Moves an order to any status. Moving it to `CANCELLED` notifies the operator.
#[utoipa::path(
    post,
    path = "/admin/orders/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 403, description = "Administrator privilege required"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "admin"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let order = state
        .orders
        .update_status(identity.0, body.order_id, body.status)
        .await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
