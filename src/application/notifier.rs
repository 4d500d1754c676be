use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::domain::order::Order;
use crate::domain::ports::{NotificationSender, OutboundMessage, SettingsStore};

pub const NOTIFICATION_EMAIL_KEY: &str = "NOTIFICATION_EMAIL";
pub const SYSTEM_NAME_KEY: &str = "SYSTEM_NAME";
const DEFAULT_SYSTEM_NAME: &str = "Storefront";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Created,
    Cancelled,
}

/// Best-effort operator alerts. Every dispatch runs as a detached task and
/// failures end in the log, never with the caller.
#[derive(Clone)]
pub struct Notifier {
    settings: Arc<dyn SettingsStore>,
    sender: Arc<dyn NotificationSender>,
}

impl Notifier {
    pub fn new(settings: Arc<dyn SettingsStore>, sender: Arc<dyn NotificationSender>) -> Self {
        Self { settings, sender }
    }

    pub fn order_created(&self, order: &Order) -> JoinHandle<()> {
        self.dispatch(OrderEvent::Created, order.clone())
    }

    pub fn order_cancelled(&self, order: &Order) -> JoinHandle<()> {
        self.dispatch(OrderEvent::Cancelled, order.clone())
    }

    fn dispatch(&self, event: OrderEvent, order: Order) -> JoinHandle<()> {
        let settings = Arc::clone(&self.settings);
        let sender = Arc::clone(&self.sender);

        tokio::spawn(async move {
            let lookup = tokio::task::spawn_blocking(move || {
                let recipient = settings.get(NOTIFICATION_EMAIL_KEY);
                let shop_name = settings.get(SYSTEM_NAME_KEY);
                (recipient, shop_name)
            })
            .await;

            let (recipient, shop_name) = match lookup {
                Ok(values) => values,
                Err(e) => {
                    error!("Notification settings lookup panicked for order {}: {}", order.id, e);
                    return;
                }
            };

            let recipient = match recipient {
                Ok(Some(address)) if !address.trim().is_empty() => address,
                Ok(_) => {
                    debug!("No notification address configured; skipping {:?} alert", event);
                    return;
                }
                Err(e) => {
                    warn!("Could not read notification address for order {}: {}", order.id, e);
                    return;
                }
            };

            let shop_name = shop_name.ok().flatten().unwrap_or_else(|| {
                DEFAULT_SYSTEM_NAME.to_string()
            });

            let message = render(event, &shop_name, &order);
            match sender.send(&recipient, &message).await {
                Ok(()) => info!("Sent {:?} notification for order {}", event, order.id),
                Err(e) => error!(
                    "Failed to send {:?} notification for order {}: {}",
                    event, order.id, e
                ),
            }
        })
    }
}

pub fn render(event: OrderEvent, shop_name: &str, order: &Order) -> OutboundMessage {
    let subject = match event {
        OrderEvent::Created => format!("[{shop_name}] New order {}", order.id),
        OrderEvent::Cancelled => format!("[{shop_name}] Order {} cancelled", order.id),
    };

    let headline = match event {
        OrderEvent::Created => "A new order has been placed.",
        OrderEvent::Cancelled => "An order has been cancelled.",
    };
    let mut lines = vec![
        headline.to_string(),
        String::new(),
        format!("Order:    {}", order.id),
        format!("Status:   {}", order.status),
        format!("Payment:  {}", order.payment_method),
        format!("Total:    {}", order.total_amount),
        format!("Customer: {}", order.shipping.name),
        format!("Phone:    {}", order.shipping.phone),
        format!("Address:  {}", order.shipping.address),
    ];
    if !order.items.is_empty() {
        lines.push(String::new());
        lines.push("Items:".to_string());
        lines.extend(order.items.iter().map(|item| {
            format!("  {} x {} @ {}", item.quantity, item.product_name, item.price)
        }));
    }
    let body = lines.join("\n") + "\n";

    OutboundMessage { subject, body }
}
