//! Order status transition rules.
//!
//! Operators may move an order to any status. Customers may only cancel their
//! own orders, and only while they are still `PENDING`. Payment providers may
//! only settle a `PENDING` order.

use uuid::Uuid;

use super::errors::DomainError;
use super::order::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl Transition {
    /// True when the order enters `CANCELLED` from some other status.
    pub fn cancels(&self) -> bool {
        self.to == OrderStatus::Cancelled && self.from != OrderStatus::Cancelled
    }
}

/// Outcome of a stored status update: the status the row actually held just
/// before the write, and the order as written.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub order: Order,
}

impl StatusChange {
    pub fn transition(&self) -> Transition {
        Transition {
            from: self.from,
            to: self.order.status,
        }
    }
}

/// Operators are trusted: every target status is allowed, including moving an
/// order back out of `CANCELLED`.
pub fn admin_transition(order: &Order, to: OrderStatus) -> Transition {
    Transition {
        from: order.status,
        to,
    }
}

pub fn customer_cancel(order: &Order, user_id: Uuid) -> Result<Transition, DomainError> {
    if !order.is_owned_by(user_id) {
        return Err(DomainError::Forbidden(
            "order belongs to another customer".to_string(),
        ));
    }
    if order.status != OrderStatus::Pending {
        return Err(DomainError::Conflict(format!(
            "order is {} and can no longer be cancelled",
            order.status
        )));
    }
    Ok(Transition {
        from: OrderStatus::Pending,
        to: OrderStatus::Cancelled,
    })
}

/// `None` means the order has already left `PENDING` and the confirmation is
/// acknowledged without changing anything.
pub fn payment_confirmation(order: &Order) -> Option<Transition> {
    (order.status == OrderStatus::Pending).then_some(Transition {
        from: OrderStatus::Pending,
        to: OrderStatus::Paid,
    })
}
