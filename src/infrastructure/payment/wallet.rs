//! Wallet-redirect adapter: the customer is sent to the wallet provider's
//! hosted QR/app page and the provider reports back through an IPN callback.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{provider_amount, sign_hmac_sha256, verify_hmac_sha256};
use crate::config::WalletConfig;
use crate::domain::errors::GatewayError;
use crate::domain::payment::{
    PaymentConfirmation, PaymentInitiation, PaymentRequest, ProviderReference,
};
use crate::domain::ports::PaymentGateway;

/// Fields covered by the create-payment signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentFields {
    pub access_key: String,
    pub amount: i64,
    pub extra_data: String,
    pub ipn_url: String,
    pub order_id: String,
    pub order_info: String,
    pub partner_code: String,
    pub redirect_url: String,
    pub request_id: String,
    pub request_type: String,
}

impl CreatePaymentFields {
    /// The provider's canonical string: fixed key order, `&`-joined.
    pub fn canonical(&self) -> String {
        format!(
            "accessKey={}&amount={}&extraData={}&ipnUrl={}&orderId={}&orderInfo={}&partnerCode={}&redirectUrl={}&requestId={}&requestType={}",
            self.access_key,
            self.amount,
            self.extra_data,
            self.ipn_url,
            self.order_id,
            self.order_info,
            self.partner_code,
            self.redirect_url,
            self.request_id,
            self.request_type,
        )
    }

    pub fn sign(&self, secret_key: &str) -> String {
        sign_hmac_sha256(secret_key, &self.canonical())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentBody<'a> {
    partner_code: &'a str,
    access_key: &'a str,
    request_id: &'a str,
    amount: i64,
    order_id: &'a str,
    order_info: &'a str,
    redirect_url: &'a str,
    ipn_url: &'a str,
    request_type: &'a str,
    extra_data: &'a str,
    lang: &'static str,
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentResponse {
    result_code: i64,
    #[serde(default)]
    message: String,
    pay_url: Option<String>,
}

/// Provider-initiated payment result notification.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletIpn {
    pub partner_code: String,
    pub order_id: String,
    pub request_id: String,
    pub amount: i64,
    pub order_info: String,
    pub order_type: String,
    pub trans_id: i64,
    pub result_code: i64,
    pub message: String,
    pub pay_type: String,
    pub response_time: i64,
    #[serde(default)]
    pub extra_data: String,
    pub signature: String,
}

impl WalletIpn {
    pub fn canonical(&self, access_key: &str) -> String {
        format!(
            "accessKey={}&amount={}&extraData={}&message={}&orderId={}&orderInfo={}&orderType={}&partnerCode={}&payType={}&requestId={}&responseTime={}&resultCode={}&transId={}",
            access_key,
            self.amount,
            self.extra_data,
            self.message,
            self.order_id,
            self.order_info,
            self.order_type,
            self.partner_code,
            self.pay_type,
            self.request_id,
            self.response_time,
            self.result_code,
            self.trans_id,
        )
    }

    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// `None` when the callback names an order ID we could never have issued.
    pub fn confirmation(&self) -> Option<PaymentConfirmation> {
        let order_id = Uuid::parse_str(&self.order_id).ok()?;
        Some(PaymentConfirmation {
            provider: "wallet-redirect",
            reference: ProviderReference::OrderId(order_id),
            amount: self.amount,
            succeeded: self.is_success(),
            transaction: self.trans_id.to_string(),
        })
    }
}

pub struct WalletRedirectGateway {
    client: reqwest::Client,
    config: Option<WalletConfig>,
    ipn_url: String,
    allow_mock: bool,
}

impl WalletRedirectGateway {
    pub fn new(
        config: Option<WalletConfig>,
        public_base_url: &str,
        timeout: Duration,
        allow_mock: bool,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            ipn_url: format!("{}/payments/wallet/ipn", public_base_url.trim_end_matches('/')),
            allow_mock,
        })
    }

    pub fn verify_ipn(&self, ipn: &WalletIpn) -> bool {
        let Some(config) = &self.config else {
            warn!("Wallet IPN received but no wallet credentials are configured");
            return false;
        };
        ipn.partner_code == config.partner_code
            && verify_hmac_sha256(&config.secret_key, &ipn.canonical(&config.access_key), &ipn.signature)
    }

    fn fields(&self, config: &WalletConfig, request: &PaymentRequest, amount: i64) -> CreatePaymentFields {
        CreatePaymentFields {
            access_key: config.access_key.clone(),
            amount,
            extra_data: String::new(),
            ipn_url: self.ipn_url.clone(),
            order_id: request.order_id.to_string(),
            order_info: format!("Payment for order {}", request.order_id),
            partner_code: config.partner_code.clone(),
            redirect_url: request.return_url.clone(),
            request_id: request_id(request.order_id),
            request_type: config.request_type.clone(),
        }
    }
}

/// Fresh per attempt so the provider can tell retries apart.
fn request_id(order_id: Uuid) -> String {
    format!("{}-{}", order_id, Utc::now().timestamp_millis())
}

#[async_trait]
impl PaymentGateway for WalletRedirectGateway {
    fn name(&self) -> &'static str {
        "wallet-redirect"
    }

    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, GatewayError> {
        let Some(config) = &self.config else {
            if self.allow_mock {
                warn!(
                    "Wallet credentials missing; mock payment success for order {}",
                    request.order_id
                );
                return Ok(PaymentInitiation::redirect(request.return_url.clone()));
            }
            return Err(GatewayError::NotConfigured("wallet"));
        };

        let amount = provider_amount(&request.amount)?;
        let fields = self.fields(config, request, amount);
        let body = CreatePaymentBody {
            partner_code: &fields.partner_code,
            access_key: &fields.access_key,
            request_id: &fields.request_id,
            amount,
            order_id: &fields.order_id,
            order_info: &fields.order_info,
            redirect_url: &fields.redirect_url,
            ipn_url: &fields.ipn_url,
            request_type: &fields.request_type,
            extra_data: &fields.extra_data,
            lang: "en",
            signature: fields.sign(&config.secret_key),
        };

        let response = self.client.post(&config.endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let parsed: CreatePaymentResponse = serde_json::from_str(&text).map_err(|e| {
            GatewayError::InvalidResponse(format!("HTTP {status}: {e}"))
        })?;

        if !status.is_success() || parsed.result_code != 0 {
            return Err(GatewayError::Rejected {
                code: parsed.result_code.to_string(),
                message: parsed.message,
            });
        }
        let pay_url = parsed
            .pay_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("payUrl missing".to_string()))?;

        info!(
            "Wallet payment {} created for order {}",
            fields.request_id, request.order_id
        );
        Ok(PaymentInitiation::redirect(pay_url))
    }
}
