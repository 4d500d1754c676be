use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use uuid::Uuid;

use super::order::{Order, OrderItem};

/// What a gateway adapter needs to start collecting payment for a persisted order.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub items: Vec<OrderItem>,
    pub return_url: String,
    pub cancel_url: String,
}

impl PaymentRequest {
    /// `base_url` is the public storefront origin; the customer lands on
    /// `/checkout/result` or `/checkout/cancel` once the provider is done.
    pub fn for_order(order: &Order, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            order_id: order.id,
            amount: order.total_amount.clone(),
            items: order.items.clone(),
            return_url: format!("{base}/checkout/result?orderId={}", order.id),
            cancel_url: format!("{base}/checkout/cancel?orderId={}", order.id),
        }
    }
}

/// Outcome of a successful `initiate_payment`. No redirect means payment is
/// settled locally or will resolve without the customer leaving the site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentInitiation {
    pub redirect_url: Option<String>,
}

impl PaymentInitiation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self {
            redirect_url: Some(url.into()),
        }
    }
}

/// Amount in whole currency units, as payment providers exchange it.
pub fn whole_units(amount: &BigDecimal) -> Option<i64> {
    amount.with_scale_round(0, RoundingMode::HalfUp).to_i64()
}

/// How a provider callback points at one of our orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderReference {
    OrderId(Uuid),
    OrderCode(i64),
}

/// A provider callback whose signature has already been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub provider: &'static str,
    pub reference: ProviderReference,
    pub amount: i64,
    pub succeeded: bool,
    pub transaction: String,
}
