use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Internal(format!("unknown order status '{s}'")))
    }
}

/// How the customer chose to pay. Serialized on the wire as `COD`, `WALLET`
/// or `HOSTED`; stored in the database under the long form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    #[serde(rename = "COD")]
    CashOnDelivery,
    #[serde(rename = "WALLET")]
    WalletRedirect,
    #[serde(rename = "HOSTED")]
    HostedCheckout,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "CASH_ON_DELIVERY",
            PaymentMethod::WalletRedirect => "WALLET_REDIRECT",
            PaymentMethod::HostedCheckout => "HOSTED_CHECKOUT",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH_ON_DELIVERY" => Ok(PaymentMethod::CashOnDelivery),
            "WALLET_REDIRECT" => Ok(PaymentMethod::WalletRedirect),
            "HOSTED_CHECKOUT" => Ok(PaymentMethod::HostedCheckout),
            other => Err(DomainError::Internal(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

/// Longest phone number the `orders.shipping_phone` column holds.
pub const SHIPPING_PHONE_MAX_CHARS: usize = 50;

/// Shipping details captured verbatim at checkout. Not linked to any address book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl ShippingDetails {
    /// Trims every field and rejects blanks and over-long phone numbers.
    pub fn new(name: &str, phone: &str, address: &str) -> Result<Self, DomainError> {
        let field = |label: &str, value: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(DomainError::InvalidInput(format!("{label} is required")))
            } else {
                Ok(value.to_string())
            }
        };

        let phone = field("shippingPhone", phone)?;
        if phone.chars().count() > SHIPPING_PHONE_MAX_CHARS {
            return Err(DomainError::InvalidInput(format!(
                "shippingPhone must be at most {SHIPPING_PHONE_MAX_CHARS} characters"
            )));
        }

        Ok(Self {
            name: field("shippingName", name)?,
            phone,
            address: field("shippingAddress", address)?,
        })
    }
}

/// A cart line joined with the catalog as it stands at checkout time.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl CartLine {
    pub fn subtotal(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

pub fn order_total(lines: &[CartLine]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::zero(), |total, line| total + line.subtotal())
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    /// Unit price frozen at order time.
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub provider_order_code: Option<i64>,
    pub shipping: ShippingDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}
