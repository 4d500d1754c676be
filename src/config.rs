use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("{section} is partially configured; missing {missing}")]
    Partial {
        section: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub endpoint: String,
    pub partner_code: String,
    pub access_key: String,
    pub secret_key: String,
    pub request_type: String,
}

#[derive(Debug, Clone)]
pub struct HostedCheckoutConfig {
    pub endpoint: String,
    pub client_id: String,
    pub api_key: String,
    pub checksum_key: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub public_base_url: String,
    /// Lets wallet checkout succeed without credentials. Development only.
    pub allow_mock_payments: bool,
    pub payment_timeout: Duration,
    pub wallet: Option<WalletConfig>,
    pub hosted_checkout: Option<HostedCheckoutConfig>,
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    /// Reads configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(var("PORT"), "PORT", 8080u16)?;
        let public_base_url =
            var("PUBLIC_BASE_URL").unwrap_or_else(|| format!("http://localhost:{port}"));
        let allow_mock_payments = parse_or(var("ALLOW_MOCK_PAYMENTS"), "ALLOW_MOCK_PAYMENTS", false)?;
        let payment_timeout =
            Duration::from_secs(parse_or(var("PAYMENT_TIMEOUT_SECS"), "PAYMENT_TIMEOUT_SECS", 15u64)?);

        let wallet = section(
            "wallet",
            [
                ("WALLET_ENDPOINT", var("WALLET_ENDPOINT")),
                ("WALLET_PARTNER_CODE", var("WALLET_PARTNER_CODE")),
                ("WALLET_ACCESS_KEY", var("WALLET_ACCESS_KEY")),
                ("WALLET_SECRET_KEY", var("WALLET_SECRET_KEY")),
            ],
        )?
        .map(|[endpoint, partner_code, access_key, secret_key]| WalletConfig {
            endpoint,
            partner_code,
            access_key,
            secret_key,
            request_type: var("WALLET_REQUEST_TYPE")
                .unwrap_or_else(|| "captureWallet".to_string()),
        });

        let hosted_checkout = section(
            "hosted checkout",
            [
                ("HOSTED_CHECKOUT_ENDPOINT", var("HOSTED_CHECKOUT_ENDPOINT")),
                ("HOSTED_CHECKOUT_CLIENT_ID", var("HOSTED_CHECKOUT_CLIENT_ID")),
                ("HOSTED_CHECKOUT_API_KEY", var("HOSTED_CHECKOUT_API_KEY")),
                ("HOSTED_CHECKOUT_CHECKSUM_KEY", var("HOSTED_CHECKOUT_CHECKSUM_KEY")),
            ],
        )?
        .map(|[endpoint, client_id, api_key, checksum_key]| HostedCheckoutConfig {
            endpoint,
            client_id,
            api_key,
            checksum_key,
        });

        let smtp = section(
            "smtp",
            [
                ("SMTP_HOST", var("SMTP_HOST")),
                ("SMTP_USERNAME", var("SMTP_USERNAME")),
                ("SMTP_PASSWORD", var("SMTP_PASSWORD")),
                ("SMTP_FROM", var("SMTP_FROM")),
            ],
        )?;
        let smtp = match smtp {
            Some([host, username, password, from_address]) => Some(SmtpConfig {
                host,
                port: parse_or(var("SMTP_PORT"), "SMTP_PORT", 587u16)?,
                username,
                password,
                from_address,
            }),
            None => None,
        };

        Ok(Self {
            host,
            port,
            database_url,
            public_base_url,
            allow_mock_payments,
            payment_timeout,
            wallet,
            hosted_checkout,
            smtp,
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// All-or-nothing credential group: `None` when every variable is absent,
/// an error when only some are set.
fn section<const N: usize>(
    section: &'static str,
    vars: [(&'static str, Option<String>); N],
) -> Result<Option<[String; N]>, ConfigError> {
    if vars.iter().all(|(_, value)| value.is_none()) {
        return Ok(None);
    }
    if let Some((missing, _)) = vars.iter().find(|(_, value)| value.is_none()) {
        return Err(ConfigError::Partial { section, missing });
    }
    Ok(Some(vars.map(|(_, value)| value.unwrap_or_default())))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/shop")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.public_base_url, "http://localhost:8080");
        assert!(!cfg.allow_mock_payments);
        assert_eq!(cfg.payment_timeout, Duration::from_secs(15));
        assert!(cfg.wallet.is_none());
        assert!(cfg.hosted_checkout.is_none());
        assert!(cfg.smtp.is_none());
    }

    #[test]
    fn complete_wallet_section_is_loaded() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("WALLET_ENDPOINT", "https://wallet.example/create"),
            ("WALLET_PARTNER_CODE", "SHOP"),
            ("WALLET_ACCESS_KEY", "access"),
            ("WALLET_SECRET_KEY", "secret"),
        ])
        .unwrap();
        let wallet = cfg.wallet.expect("wallet configured");
        assert_eq!(wallet.partner_code, "SHOP");
        assert_eq!(wallet.request_type, "captureWallet");
    }

    #[test]
    fn partial_provider_section_is_an_error() {
        let err = config(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("HOSTED_CHECKOUT_ENDPOINT", "https://hosted.example"),
            ("HOSTED_CHECKOUT_CLIENT_ID", "client"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Partial {
                missing: "HOSTED_CHECKOUT_API_KEY",
                ..
            }
        ));
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = config(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn mock_payments_flag_is_parsed() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://x"),
            ("ALLOW_MOCK_PAYMENTS", "true"),
        ])
        .unwrap();
        assert!(cfg.allow_mock_payments);
    }
}
