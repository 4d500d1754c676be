pub mod admin;
pub mod checkout;
pub mod orders;
pub mod payments;

use std::sync::Arc;

use crate::application::checkout_service::CheckoutService;
use crate::application::order_service::OrderService;
use crate::application::payment_confirmation::PaymentConfirmationService;
use crate::infrastructure::payment::{HostedCheckoutGateway, WalletRedirectGateway};

/// Everything the HTTP handlers reach through `web::Data`.
pub struct AppState {
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub confirmations: PaymentConfirmationService,
    /// Kept concretely so callbacks can be verified with the same credentials.
    pub wallet: Arc<WalletRedirectGateway>,
    pub hosted: Arc<HostedCheckoutGateway>,
}
