//! Hosted-checkout adapter for a bank-transfer style payment page. The
//! provider identifies orders by a compact integer code rather than our UUID,
//! so each attempt allocates one and stores it on the order first.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::{
    provider_amount, provider_item_price, sign_hmac_sha256, truncate_chars, verify_hmac_sha256,
};
use crate::config::HostedCheckoutConfig;
use crate::domain::errors::GatewayError;
use crate::domain::payment::{
    PaymentConfirmation, PaymentInitiation, PaymentRequest, ProviderReference,
};
use crate::domain::ports::{OrderRepository, PaymentGateway};
use crate::runtime::blocking;

pub const DESCRIPTION_MAX_CHARS: usize = 25;
pub const ITEM_NAME_MAX_CHARS: usize = 50;
const SUCCESS_CODE: &str = "00";
/// Largest integer the provider accepts (2^53 - 1).
const MAX_ORDER_CODE: i64 = 9_007_199_254_740_991;

/// Millisecond clock (mod 10^12) followed by three random digits.
pub fn generate_order_code() -> i64 {
    let millis = Utc::now().timestamp_millis().rem_euclid(1_000_000_000_000);
    let suffix = rand::thread_rng().gen_range(0..1000);
    (millis * 1000 + suffix).clamp(1, MAX_ORDER_CODE)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutItem {
    pub name: String,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkRequest {
    pub order_code: i64,
    pub amount: i64,
    pub description: String,
    pub items: Vec<CheckoutItem>,
    pub cancel_url: String,
    pub return_url: String,
    pub signature: String,
}

impl PaymentLinkRequest {
    pub fn build(
        request: &PaymentRequest,
        order_code: i64,
        checksum_key: &str,
    ) -> Result<Self, GatewayError> {
        let amount = provider_amount(&request.amount)?;
        let items = request
            .items
            .iter()
            .map(|item| {
                Ok(CheckoutItem {
                    name: truncate_chars(&item.product_name, ITEM_NAME_MAX_CHARS),
                    quantity: item.quantity,
                    price: provider_item_price(&item.price)?,
                })
            })
            .collect::<Result<Vec<_>, GatewayError>>()?;
        let description = truncate_chars(&format!("Order {order_code}"), DESCRIPTION_MAX_CHARS);

        let canonical = format!(
            "amount={}&cancelUrl={}&description={}&orderCode={}&returnUrl={}",
            amount, request.cancel_url, description, order_code, request.return_url
        );
        Ok(Self {
            order_code,
            amount,
            description,
            items,
            cancel_url: request.cancel_url.clone(),
            return_url: request.return_url.clone(),
            signature: sign_hmac_sha256(checksum_key, &canonical),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutUrl {
    checkout_url: String,
}

#[derive(Debug, Deserialize)]
struct PaymentLinkResponse {
    code: String,
    #[serde(default)]
    desc: String,
    data: Option<CheckoutUrl>,
}

/// Payment result pushed by the provider.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HostedWebhook {
    pub code: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub success: bool,
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    pub signature: String,
}

impl HostedWebhook {
    /// `data` fields sorted by key, rendered `k=v` and joined with `&`.
    pub fn canonical(&self) -> String {
        let mut keys: Vec<&String> = self.data.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| {
                let value = match &self.data[key] {
                    Value::Null => String::new(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{key}={value}")
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn order_code(&self) -> Option<i64> {
        self.data.get("orderCode").and_then(Value::as_i64)
    }

    pub fn amount(&self) -> Option<i64> {
        self.data.get("amount").and_then(Value::as_i64)
    }

    pub fn confirmation(&self) -> Option<PaymentConfirmation> {
        Some(PaymentConfirmation {
            provider: "hosted-checkout",
            reference: ProviderReference::OrderCode(self.order_code()?),
            amount: self.amount()?,
            succeeded: self.is_success(),
            transaction: self
                .data
                .get("reference")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
            && self
                .data
                .get("code")
                .and_then(Value::as_str)
                .map_or(true, |code| code == SUCCESS_CODE)
    }
}

pub struct HostedCheckoutGateway {
    client: reqwest::Client,
    config: Option<HostedCheckoutConfig>,
    repo: Arc<dyn OrderRepository>,
}

impl HostedCheckoutGateway {
    pub fn new(
        config: Option<HostedCheckoutConfig>,
        repo: Arc<dyn OrderRepository>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            repo,
        })
    }

    pub fn verify_webhook(&self, webhook: &HostedWebhook) -> bool {
        let Some(config) = &self.config else {
            warn!("Hosted checkout webhook received but no credentials are configured");
            return false;
        };
        verify_hmac_sha256(&config.checksum_key, &webhook.canonical(), &webhook.signature)
    }
}

#[async_trait]
impl PaymentGateway for HostedCheckoutGateway {
    fn name(&self) -> &'static str {
        "hosted-checkout"
    }

    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, GatewayError> {
        let config = self
            .config
            .as_ref()
            .ok_or(GatewayError::NotConfigured("hosted checkout"))?;

        let order_code = generate_order_code();
        let repo = Arc::clone(&self.repo);
        let order_id = request.order_id;
        blocking(move || repo.assign_provider_order_code(order_id, order_code))
            .await
            .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        let body = PaymentLinkRequest::build(request, order_code, &config.checksum_key)?;
        let response = self
            .client
            .post(&config.endpoint)
            .header("x-client-id", &config.client_id)
            .header("x-api-key", &config.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let parsed: PaymentLinkResponse = serde_json::from_str(&text).map_err(|e| {
            GatewayError::InvalidResponse(format!("HTTP {status}: {e}"))
        })?;

        if !status.is_success() || parsed.code != SUCCESS_CODE {
            return Err(GatewayError::Rejected {
                code: parsed.code,
                message: parsed.desc,
            });
        }
        let checkout_url = parsed
            .data
            .map(|data| data.checkout_url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("checkoutUrl missing".to_string()))?;

        info!(
            "Hosted checkout link created for order {} (code {})",
            request.order_id, order_code
        );
        Ok(PaymentInitiation::redirect(checkout_url))
    }
}
