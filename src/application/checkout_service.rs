use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::notifier::Notifier;
use crate::domain::errors::DomainError;
use crate::domain::order::{PaymentMethod, ShippingDetails};
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::{OrderRepository, PaymentGateway};
use crate::runtime::blocking;

/// One adapter per payment method.
#[derive(Clone)]
pub struct PaymentGateways {
    pub cash_on_delivery: Arc<dyn PaymentGateway>,
    pub wallet_redirect: Arc<dyn PaymentGateway>,
    pub hosted_checkout: Arc<dyn PaymentGateway>,
}

impl PaymentGateways {
    pub fn for_method(&self, method: PaymentMethod) -> &Arc<dyn PaymentGateway> {
        match method {
            PaymentMethod::CashOnDelivery => &self.cash_on_delivery,
            PaymentMethod::WalletRedirect => &self.wallet_redirect,
            PaymentMethod::HostedCheckout => &self.hosted_checkout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order_id: Uuid,
    /// Where the customer must go to pay; `null` when nothing is left to do online.
    pub pay_url: Option<String>,
}

pub struct CheckoutService {
    repo: Arc<dyn OrderRepository>,
    gateways: PaymentGateways,
    notifier: Notifier,
    public_base_url: String,
}

impl CheckoutService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        gateways: PaymentGateways,
        notifier: Notifier,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            gateways,
            notifier,
            public_base_url: public_base_url.into(),
        }
    }

    /// Turns the user's cart into a `PENDING` order and starts payment.
    ///
    /// The order is committed before any provider is contacted. If payment
    /// setup then fails the order is kept and `PaymentSetupFailed` carries its
    /// ID so the caller can retry payment or cancel.
    pub async fn checkout(
        &self,
        user_id: Uuid,
        shipping: ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<CheckoutResult, DomainError> {
        let repo = Arc::clone(&self.repo);
        let order =
            blocking(move || repo.place_order(user_id, &shipping, payment_method)).await?;
        info!(
            "Order {} placed by user {} for {} via {}",
            order.id, user_id, order.total_amount, payment_method
        );

        self.notifier.order_created(&order);

        let gateway = self.gateways.for_method(payment_method);
        let request = PaymentRequest::for_order(&order, &self.public_base_url);
        match gateway.initiate_payment(&request).await {
            Ok(initiation) => Ok(CheckoutResult {
                order_id: order.id,
                pay_url: initiation.redirect_url,
            }),
            Err(e) => {
                warn!(
                    "Payment setup via {} failed for order {}: {}",
                    gateway.name(),
                    order.id,
                    e
                );
                Err(DomainError::PaymentSetupFailed {
                    order_id: order.id,
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::application::notifier::NOTIFICATION_EMAIL_KEY;
    use crate::application::testing::{
        price, shipping, FakeGateway, FakeSender, FakeSettings, InMemoryOrderRepository,
    };
    use crate::domain::order::OrderStatus;

    struct Harness {
        repo: Arc<InMemoryOrderRepository>,
        cod: Arc<FakeGateway>,
        wallet: Arc<FakeGateway>,
        hosted: Arc<FakeGateway>,
        service: CheckoutService,
    }

    fn harness_with(wallet: FakeGateway, sender: FakeSender) -> Harness {
        let repo = Arc::new(InMemoryOrderRepository::default());
        let cod = Arc::new(FakeGateway::local());
        let wallet = Arc::new(wallet);
        let hosted = Arc::new(FakeGateway::redirecting("https://pay.example/hosted/1"));
        let settings = FakeSettings::with(&[(NOTIFICATION_EMAIL_KEY, "ops@example.com")]);
        let notifier = Notifier::new(Arc::new(settings), Arc::new(sender));
        let service = CheckoutService::new(
            repo.clone(),
            PaymentGateways {
                cash_on_delivery: cod.clone(),
                wallet_redirect: wallet.clone(),
                hosted_checkout: hosted.clone(),
            },
            notifier,
            "https://shop.example/",
        );
        Harness {
            repo,
            cod,
            wallet,
            hosted,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with(
            FakeGateway::redirecting("https://wallet.example/pay/abc"),
            FakeSender::new().0,
        )
    }

    #[tokio::test]
    async fn cash_on_delivery_creates_pending_order_and_empties_cart() {
        let h = harness();
        let user = Uuid::new_v4();
        let mug = h.repo.add_product("Mug", "100");
        let pot = h.repo.add_product("Teapot", "250");
        h.repo.add_to_cart(user, mug, 2);
        h.repo.add_to_cart(user, pot, 1);

        let result = h
            .service
            .checkout(user, shipping(), PaymentMethod::CashOnDelivery)
            .await
            .unwrap();

        assert_eq!(result.pay_url, None);
        let orders = h.repo.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, result.order_id);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[0].total_amount, BigDecimal::from(450));
        assert!(h.repo.cart(user).is_empty());
        assert_eq!(h.cod.requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_side_effects() {
        let h = harness();

        for method in [
            PaymentMethod::CashOnDelivery,
            PaymentMethod::WalletRedirect,
            PaymentMethod::HostedCheckout,
        ] {
            let err = h
                .service
                .checkout(Uuid::new_v4(), shipping(), method)
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::EmptyCart));
        }

        assert!(h.repo.orders().is_empty());
        assert!(h.cod.requests().is_empty());
        assert!(h.wallet.requests().is_empty());
        assert!(h.hosted.requests().is_empty());
    }

    #[tokio::test]
    async fn wallet_checkout_returns_provider_redirect() {
        let h = harness();
        let user = Uuid::new_v4();
        let mug = h.repo.add_product("Mug", "100");
        h.repo.add_to_cart(user, mug, 3);

        let result = h
            .service
            .checkout(user, shipping(), PaymentMethod::WalletRedirect)
            .await
            .unwrap();

        assert_eq!(result.pay_url.as_deref(), Some("https://wallet.example/pay/abc"));
        let requests = h.wallet.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].order_id, result.order_id);
        assert_eq!(requests[0].amount, price("300"));
        assert_eq!(
            requests[0].return_url,
            format!("https://shop.example/checkout/result?orderId={}", result.order_id)
        );
    }

    #[tokio::test]
    async fn gateway_rejection_keeps_the_pending_order() {
        let h = harness_with(FakeGateway::rejecting("insufficient funds"), FakeSender::new().0);
        let user = Uuid::new_v4();
        let mug = h.repo.add_product("Mug", "100");
        h.repo.add_to_cart(user, mug, 1);

        let err = h
            .service
            .checkout(user, shipping(), PaymentMethod::WalletRedirect)
            .await
            .unwrap_err();

        let DomainError::PaymentSetupFailed { order_id, reason } = err else {
            panic!("expected payment setup failure, got {err:?}");
        };
        assert!(reason.contains("insufficient funds"));
        let stored = h.repo.find_by_id(order_id).unwrap().expect("order kept");
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(h.repo.cart(user).is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_leaves_cart_untouched_and_skips_payment() {
        let h = harness();
        let user = Uuid::new_v4();
        let mug = h.repo.add_product("Mug", "100");
        h.repo.add_to_cart(user, mug, 2);
        h.repo.fail_placement();

        let err = h
            .service
            .checkout(user, shipping(), PaymentMethod::HostedCheckout)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(h.repo.cart(user), vec![(mug, 2)]);
        assert!(h.repo.orders().is_empty());
        assert!(h.hosted.requests().is_empty());
    }

    #[tokio::test]
    async fn later_price_change_does_not_touch_the_order() {
        let h = harness();
        let user = Uuid::new_v4();
        let mug = h.repo.add_product("Mug", "100");
        h.repo.add_to_cart(user, mug, 2);

        let result = h
            .service
            .checkout(user, shipping(), PaymentMethod::CashOnDelivery)
            .await
            .unwrap();
        h.repo.set_price(mug, "999");

        let order = h.repo.find_by_id(result.order_id).unwrap().unwrap();
        assert_eq!(order.items[0].price, price("100"));
        assert_eq!(order.total_amount, price("200"));
    }

    #[tokio::test]
    async fn order_created_notification_is_sent() {
        let (sender, mut sent) = FakeSender::new();
        let h = harness_with(FakeGateway::local(), sender);
        let user = Uuid::new_v4();
        let mug = h.repo.add_product("Mug", "100");
        h.repo.add_to_cart(user, mug, 1);

        let result = h
            .service
            .checkout(user, shipping(), PaymentMethod::CashOnDelivery)
            .await
            .unwrap();

        let (recipient, message) = tokio::time::timeout(Duration::from_secs(5), sent.recv())
            .await
            .expect("notification dispatched")
            .expect("channel open");
        assert_eq!(recipient, "ops@example.com");
        assert!(message.subject.contains(&result.order_id.to_string()));
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_checkout() {
        let h = harness_with(FakeGateway::local(), FakeSender::failing());
        let user = Uuid::new_v4();
        let mug = h.repo.add_product("Mug", "100");
        h.repo.add_to_cart(user, mug, 1);

        let result = h
            .service
            .checkout(user, shipping(), PaymentMethod::CashOnDelivery)
            .await;

        assert!(result.is_ok());
        assert_eq!(h.repo.orders().len(), 1);
    }
}
