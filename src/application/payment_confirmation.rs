use std::sync::Arc;

use log::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::payment::{whole_units, PaymentConfirmation, ProviderReference};
use crate::domain::ports::OrderRepository;
use crate::domain::status::{self, StatusChange};
use crate::runtime::blocking;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationOutcome {
    Paid(Order),
    /// The order had already left `PENDING`; nothing changed.
    AlreadySettled(OrderStatus),
    /// The provider reported a failed or abandoned payment.
    Declined,
    AmountMismatch { expected: Option<i64>, reported: i64 },
}

/// Settles `PENDING` orders from verified provider callbacks.
pub struct PaymentConfirmationService {
    repo: Arc<dyn OrderRepository>,
}

impl PaymentConfirmationService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    pub async fn confirm(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<ConfirmationOutcome, DomainError> {
        let repo = Arc::clone(&self.repo);
        let reference = confirmation.reference;
        let order = blocking(move || match reference {
            ProviderReference::OrderId(id) => repo.find_by_id(id),
            ProviderReference::OrderCode(code) => repo.find_by_provider_order_code(code),
        })
        .await?
        .ok_or(DomainError::NotFound)?;

        if !confirmation.succeeded {
            info!(
                "{} reported unsuccessful payment {} for order {}",
                confirmation.provider, confirmation.transaction, order.id
            );
            return Ok(ConfirmationOutcome::Declined);
        }

        let expected = whole_units(&order.total_amount);
        if expected != Some(confirmation.amount) {
            warn!(
                "{} confirmed {} for order {} but its total is {}; leaving it {}",
                confirmation.provider,
                confirmation.amount,
                order.id,
                order.total_amount,
                order.status
            );
            return Ok(ConfirmationOutcome::AmountMismatch {
                expected,
                reported: confirmation.amount,
            });
        }

        let Some(transition) = status::payment_confirmation(&order) else {
            info!(
                "Ignoring {} confirmation for order {} already {}",
                confirmation.provider, order.id, order.status
            );
            return Ok(ConfirmationOutcome::AlreadySettled(order.status));
        };

        let repo = Arc::clone(&self.repo);
        let id = order.id;
        let updated = blocking(move || repo.update_status(id, Some(transition.from), transition.to))
            .await?;
        match updated {
            Some(StatusChange { order, .. }) => {
                info!(
                    "Order {} paid via {} (transaction {})",
                    order.id, confirmation.provider, confirmation.transaction
                );
                Ok(ConfirmationOutcome::Paid(order))
            }
            None => {
                let repo = Arc::clone(&self.repo);
                let current = blocking(move || repo.find_by_id(id))
                    .await?
                    .ok_or(DomainError::NotFound)?;
                Ok(ConfirmationOutcome::AlreadySettled(current.status))
            }
        }
    }
}
