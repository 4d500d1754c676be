use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Checkout API",
        version = "0.1.0",
        description = "Cart checkout, order lifecycle and payment provider callbacks. \
                       Caller identity is forwarded in the X-User-Id and X-User-Role headers."
    ),
    paths(
        handlers::checkout::checkout,
        handlers::orders::list_own_orders,
        handlers::orders::get_order,
        handlers::orders::cancel_order,
        handlers::admin::list_orders,
        handlers::admin::update_status,
        handlers::payments::wallet_ipn,
        handlers::payments::hosted_webhook,
    ),
    components(schemas(
        handlers::checkout::CheckoutRequest,
        crate::application::checkout_service::CheckoutResult,
        handlers::orders::OrderResponse,
        handlers::orders::OrderItemResponse,
        handlers::orders::CancelOrderRequest,
        handlers::admin::ListOrdersResponse,
        handlers::admin::UpdateStatusRequest,
        crate::domain::order::OrderStatus,
        crate::domain::order::PaymentMethod,
        crate::infrastructure::payment::WalletIpn,
        crate::infrastructure::payment::HostedWebhook,
    )),
    tags(
        (name = "checkout", description = "Cart to order conversion"),
        (name = "orders", description = "Customer order views and cancellation"),
        (name = "admin", description = "Operator order management"),
        (name = "payments", description = "Provider payment confirmations"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi())
}
