use std::sync::Arc;

use log::info;
use uuid::Uuid;

use super::notifier::Notifier;
use crate::domain::caller::Caller;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, Order, OrderStatus};
use crate::domain::ports::OrderRepository;
use crate::domain::status::{self, StatusChange, Transition};
use crate::runtime::blocking;

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    notifier: Notifier,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, notifier: Notifier) -> Self {
        Self { repo, notifier }
    }

    /// Owners see their own orders; administrators see every order.
    pub async fn get_order(&self, caller: Caller, id: Uuid) -> Result<Order, DomainError> {
        let order = self.load(id).await?;
        if !caller.is_admin && !order.is_owned_by(caller.user_id) {
            return Err(DomainError::Forbidden(
                "order belongs to another customer".to_string(),
            ));
        }
        Ok(order)
    }

    pub async fn list_own_orders(&self, caller: Caller) -> Result<Vec<Order>, DomainError> {
        let repo = Arc::clone(&self.repo);
        blocking(move || repo.list_for_user(caller.user_id)).await
    }

    pub async fn list_orders(
        &self,
        caller: Caller,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        caller.require_admin()?;
        let repo = Arc::clone(&self.repo);
        blocking(move || repo.list(page, limit)).await
    }

    /// Operator override: any order may be moved to any status.
    pub async fn update_status(
        &self,
        caller: Caller,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        caller.require_admin()?;
        let current = self.load(id).await?;
        let requested = status::admin_transition(&current, status);

        let change = self
            .apply(id, None, requested)
            .await?
            .ok_or(DomainError::NotFound)?;
        info!(
            "Admin {} moved order {} from {} to {}",
            caller.user_id, id, change.from, change.order.status
        );
        Ok(change.order)
    }

    /// Self-service cancellation of a still-`PENDING` order.
    pub async fn cancel(&self, caller: Caller, id: Uuid) -> Result<Order, DomainError> {
        let current = self.load(id).await?;
        let transition = status::customer_cancel(&current, caller.user_id)?;

        let change = self
            .apply(id, Some(transition.from), transition)
            .await?
            .ok_or_else(|| {
                DomainError::Conflict("order changed status while being cancelled".to_string())
            })?;
        info!("User {} cancelled order {}", caller.user_id, id);
        Ok(change.order)
    }

    async fn load(&self, id: Uuid) -> Result<Order, DomainError> {
        let repo = Arc::clone(&self.repo);
        blocking(move || repo.find_by_id(id))
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// The cancellation notice follows the status the store actually
    /// replaced, not the one read before the write.
    async fn apply(
        &self,
        id: Uuid,
        expected: Option<OrderStatus>,
        transition: Transition,
    ) -> Result<Option<StatusChange>, DomainError> {
        let repo = Arc::clone(&self.repo);
        let change = blocking(move || repo.update_status(id, expected, transition.to)).await?;
        if let Some(change) = &change {
            if change.transition().cancels() {
                self.notifier.order_cancelled(&change.order);
            }
        }
        Ok(change)
    }
}
