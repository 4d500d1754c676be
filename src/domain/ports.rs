use async_trait::async_trait;
use uuid::Uuid;

use super::errors::{DomainError, GatewayError, NotificationError};
use super::order::{ListResult, Order, OrderStatus, PaymentMethod, ShippingDetails};
use super::payment::{PaymentInitiation, PaymentRequest};
use super::status::StatusChange;

pub trait OrderRepository: Send + Sync + 'static {
    /// Reads the user's cart at current catalog prices, inserts the order and
    /// its items, and clears the cart, all in one transaction. Fails with
    /// `EmptyCart` when there is nothing to buy.
    fn place_order(
        &self,
        user_id: Uuid,
        shipping: &ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<Order, DomainError>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;

    fn find_by_provider_order_code(&self, code: i64) -> Result<Option<Order>, DomainError>;

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError>;

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError>;

    /// Compare-and-set on status. With `expected = Some(s)` the update only
    /// applies while the stored status is still `s`; `Ok(None)` reports that
    /// it was not. The returned change carries the status that was actually
    /// replaced. Returns `NotFound` for an unknown order.
    fn update_status(
        &self,
        id: Uuid,
        expected: Option<OrderStatus>,
        status: OrderStatus,
    ) -> Result<Option<StatusChange>, DomainError>;

    fn assign_provider_order_code(&self, id: Uuid, code: i64) -> Result<(), DomainError>;
}

/// Process-wide key/value settings, read fresh on every call.
pub trait SettingsStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationSender: Send + Sync + 'static {
    async fn send(&self, recipient: &str, message: &OutboundMessage)
        -> Result<(), NotificationError>;
}
