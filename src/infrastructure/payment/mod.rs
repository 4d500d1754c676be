//! Payment gateway adapters and the signing helpers they share.

pub mod cash_on_delivery;
pub mod hosted_checkout;
pub mod wallet;

use bigdecimal::BigDecimal;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::errors::GatewayError;
use crate::domain::payment::whole_units;

pub use cash_on_delivery::CashOnDeliveryGateway;
pub use hosted_checkout::{HostedCheckoutGateway, HostedWebhook};
pub use wallet::{WalletIpn, WalletRedirectGateway};

type HmacSha256 = Hmac<Sha256>;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::InvalidResponse(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Lowercase hex HMAC-SHA256 of `payload` under `key`.
pub fn sign_hmac_sha256(key: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature produced by [`sign_hmac_sha256`].
pub fn verify_hmac_sha256(key: &str, payload: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Providers take whole currency units as integers.
pub fn provider_amount(amount: &BigDecimal) -> Result<i64, GatewayError> {
    let rounded = whole_units(amount).ok_or_else(|| GatewayError::InvalidAmount(amount.to_string()))?;
    if rounded <= 0 {
        return Err(GatewayError::InvalidAmount(amount.to_string()));
    }
    Ok(rounded)
}

/// Per-line prices may be zero (free items); only the charged total must be positive.
pub fn provider_item_price(price: &BigDecimal) -> Result<i64, GatewayError> {
    whole_units(price)
        .filter(|units| *units >= 0)
        .ok_or_else(|| GatewayError::InvalidAmount(price.to_string()))
}

/// Cuts `value` to at most `max` characters.
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn signature_matches_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            sign_hmac_sha256("Jefe", "what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verification_accepts_own_signature_only() {
        let signature = sign_hmac_sha256("secret", "amount=450");
        assert!(verify_hmac_sha256("secret", "amount=450", &signature));
        assert!(!verify_hmac_sha256("secret", "amount=451", &signature));
        assert!(!verify_hmac_sha256("other", "amount=450", &signature));
        assert!(!verify_hmac_sha256("secret", "amount=450", "not-hex"));
    }

    #[test]
    fn amount_is_rounded_to_whole_units() {
        let amount = BigDecimal::from_str("450.50").unwrap();
        assert_eq!(provider_amount(&amount).unwrap(), 451);
        assert_eq!(provider_amount(&BigDecimal::from(450)).unwrap(), 450);
    }

    #[test]
    fn zero_amount_cannot_be_charged() {
        assert!(matches!(
            provider_amount(&BigDecimal::from(0)),
            Err(GatewayError::InvalidAmount(_))
        ));
    }

    #[test]
    fn free_item_price_is_allowed_but_negative_is_not() {
        assert_eq!(provider_item_price(&BigDecimal::from(0)).unwrap(), 0);
        assert_eq!(provider_item_price(&BigDecimal::from(100)).unwrap(), 100);
        assert!(matches!(
            provider_item_price(&BigDecimal::from(-1)),
            Err(GatewayError::InvalidAmount(_))
        ));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("Trà xanh Thái Nguyên", 8), "Trà xanh");
        assert_eq!(truncate_chars("short", 25), "short");
    }
}
