//! In-memory port implementations for application tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, GatewayError, NotificationError};
use crate::domain::order::{
    order_total, CartLine, ListResult, Order, OrderItem, OrderStatus, PaymentMethod,
    ShippingDetails,
};
use crate::domain::payment::{PaymentInitiation, PaymentRequest};
use crate::domain::ports::{
    NotificationSender, OrderRepository, OutboundMessage, PaymentGateway, SettingsStore,
};
use crate::domain::status::StatusChange;

pub fn price(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).expect("valid decimal")
}

pub fn shipping() -> ShippingDetails {
    ShippingDetails::new("Ana", "0901234567", "1 Main St").expect("valid shipping")
}

pub fn sample_order(status: OrderStatus) -> Order {
    let id = Uuid::new_v4();
    Order {
        id,
        user_id: Uuid::new_v4(),
        status,
        total_amount: price("200"),
        payment_method: PaymentMethod::CashOnDelivery,
        provider_order_code: None,
        shipping: shipping(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        items: vec![OrderItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Green tea".to_string(),
            quantity: 2,
            price: price("100"),
        }],
    }
}

#[derive(Default)]
struct Store {
    products: HashMap<Uuid, (String, BigDecimal)>,
    carts: HashMap<Uuid, Vec<(Uuid, i32)>>,
    orders: Vec<Order>,
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    store: Mutex<Store>,
    fail_place: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn add_product(&self, name: &str, unit_price: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .lock()
            .unwrap()
            .products
            .insert(id, (name.to_string(), price(unit_price)));
        id
    }

    pub fn set_price(&self, product_id: Uuid, unit_price: &str) {
        let mut store = self.store.lock().unwrap();
        if let Some(product) = store.products.get_mut(&product_id) {
            product.1 = price(unit_price);
        }
    }

    pub fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) {
        self.store
            .lock()
            .unwrap()
            .carts
            .entry(user_id)
            .or_default()
            .push((product_id, quantity));
    }

    pub fn cart(&self, user_id: Uuid) -> Vec<(Uuid, i32)> {
        self.store
            .lock()
            .unwrap()
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.store.lock().unwrap().orders.clone()
    }

    pub fn insert(&self, order: Order) {
        self.store.lock().unwrap().orders.push(order);
    }

    /// Makes `place_order` fail as if the transaction aborted.
    pub fn fail_placement(&self) {
        self.fail_place.store(true, Ordering::SeqCst);
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn place_order(
        &self,
        user_id: Uuid,
        shipping: &ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<Order, DomainError> {
        let mut store = self.store.lock().unwrap();
        let lines: Vec<CartLine> = store
            .carts
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|(product_id, quantity)| {
                store.products.get(product_id).map(|(name, unit_price)| CartLine {
                    product_id: *product_id,
                    product_name: name.clone(),
                    quantity: *quantity,
                    unit_price: unit_price.clone(),
                })
            })
            .collect();
        if lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        if self.fail_place.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("transaction aborted".to_string()));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            status: OrderStatus::Pending,
            total_amount: order_total(&lines),
            payment_method,
            provider_order_code: None,
            shipping: shipping.clone(),
            created_at: now,
            updated_at: now,
            items: lines
                .into_iter()
                .map(|line| OrderItem {
                    id: Uuid::new_v4(),
                    product_id: line.product_id,
                    product_name: line.product_name,
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect(),
        };
        store.orders.push(order.clone());
        store.carts.remove(&user_id);
        Ok(order)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.orders().into_iter().find(|o| o.id == id))
    }

    fn find_by_provider_order_code(&self, code: i64) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders()
            .into_iter()
            .find(|o| o.provider_order_code == Some(code)))
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .orders()
            .into_iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .collect())
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let orders = self.orders();
        let total = orders.len() as i64;
        let items = orders
            .into_iter()
            .rev()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }

    fn update_status(
        &self,
        id: Uuid,
        expected: Option<OrderStatus>,
        status: OrderStatus,
    ) -> Result<Option<StatusChange>, DomainError> {
        let mut store = self.store.lock().unwrap();
        let order = store
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DomainError::NotFound)?;
        if expected.is_some_and(|e| e != order.status) {
            return Ok(None);
        }
        let from = order.status;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(Some(StatusChange {
            from,
            order: order.clone(),
        }))
    }

    fn assign_provider_order_code(&self, id: Uuid, code: i64) -> Result<(), DomainError> {
        let mut store = self.store.lock().unwrap();
        let order = store
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DomainError::NotFound)?;
        order.provider_order_code = Some(code);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSettings {
    values: HashMap<String, String>,
    fail: bool,
}

impl FakeSettings {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            values: HashMap::new(),
            fail: true,
        }
    }
}

impl SettingsStore for FakeSettings {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        if self.fail {
            return Err(DomainError::Internal("settings unavailable".to_string()));
        }
        Ok(self.values.get(key).cloned())
    }
}

pub struct FakeSender {
    sent: Option<mpsc::UnboundedSender<(String, OutboundMessage)>>,
}

impl FakeSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, OutboundMessage)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sent: Some(tx) }, rx)
    }

    /// A sender whose relay is always unreachable.
    pub fn failing() -> Self {
        Self { sent: None }
    }
}

#[async_trait]
impl NotificationSender for FakeSender {
    async fn send(
        &self,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<(), NotificationError> {
        match &self.sent {
            Some(tx) => {
                let _ = tx.send((recipient.to_string(), message.clone()));
                Ok(())
            }
            None => Err(NotificationError::Transport(
                "connection refused".to_string(),
            )),
        }
    }
}

/// Gateway that answers every request with a fixed outcome and remembers
/// what it was asked.
pub struct FakeGateway {
    outcome: Result<Option<String>, String>,
    requests: Mutex<Vec<PaymentRequest>>,
}

impl FakeGateway {
    pub fn redirecting(url: &str) -> Self {
        Self {
            outcome: Ok(Some(url.to_string())),
            requests: Mutex::default(),
        }
    }

    pub fn local() -> Self {
        Self {
            outcome: Ok(None),
            requests: Mutex::default(),
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.outcome {
            Ok(url) => Ok(PaymentInitiation {
                redirect_url: url.clone(),
            }),
            Err(message) => Err(GatewayError::Rejected {
                code: "1001".to_string(),
                message: message.clone(),
            }),
        }
    }
}
