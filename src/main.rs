use std::sync::Arc;

use actix_web::web;
use dotenvy::dotenv;
use storefront_checkout::application::checkout_service::{CheckoutService, PaymentGateways};
use storefront_checkout::application::notifier::Notifier;
use storefront_checkout::application::order_service::OrderService;
use storefront_checkout::application::payment_confirmation::PaymentConfirmationService;
use storefront_checkout::config::AppConfig;
use storefront_checkout::domain::ports::{NotificationSender, OrderRepository};
use storefront_checkout::infrastructure::mailer::{LogNotificationSender, SmtpNotificationSender};
use storefront_checkout::infrastructure::order_repo::DieselOrderRepository;
use storefront_checkout::infrastructure::payment::{
    CashOnDeliveryGateway, HostedCheckoutGateway, WalletRedirectGateway,
};
use storefront_checkout::infrastructure::settings_repo::DieselSettingsStore;
use storefront_checkout::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().expect("Invalid configuration");

    let pool = create_pool(&config.database_url).expect("Failed to create DB pool");
    run_migrations(&pool).expect("Failed to run database migrations");

    if config.allow_mock_payments {
        log::warn!("ALLOW_MOCK_PAYMENTS is enabled: wallet checkout succeeds without credentials");
    }
    if config.hosted_checkout.is_none() {
        log::warn!("Hosted checkout credentials missing; HOSTED payments will fail");
    }

    let repo: Arc<dyn OrderRepository> = Arc::new(DieselOrderRepository::new(pool.clone()));
    let settings = Arc::new(DieselSettingsStore::new(pool));

    let sender: Arc<dyn NotificationSender> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpNotificationSender::new(smtp).expect("Invalid SMTP settings")),
        None => {
            log::info!("SMTP not configured; order notifications go to the log");
            Arc::new(LogNotificationSender)
        }
    };
    let notifier = Notifier::new(settings, sender);

    let wallet = Arc::new(
        WalletRedirectGateway::new(
            config.wallet.clone(),
            &config.public_base_url,
            config.payment_timeout,
            config.allow_mock_payments,
        )
        .expect("Failed to build wallet client"),
    );
    let hosted = Arc::new(
        HostedCheckoutGateway::new(
            config.hosted_checkout.clone(),
            Arc::clone(&repo),
            config.payment_timeout,
        )
        .expect("Failed to build hosted checkout client"),
    );
    let gateways = PaymentGateways {
        cash_on_delivery: Arc::new(CashOnDeliveryGateway),
        wallet_redirect: wallet.clone(),
        hosted_checkout: hosted.clone(),
    };

    let state = web::Data::new(AppState {
        checkout: CheckoutService::new(
            Arc::clone(&repo),
            gateways,
            notifier.clone(),
            config.public_base_url.clone(),
        ),
        orders: OrderService::new(Arc::clone(&repo), notifier),
        confirmations: PaymentConfirmationService::new(repo),
        wallet,
        hosted,
    });

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
