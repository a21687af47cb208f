//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Payment configuration (YooKassa-style gateway)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Gateway API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Shop identifier (Basic auth user)
    pub shop_id: String,

    /// Secret API key (Basic auth password)
    pub secret_key: SecretString,

    /// ISO 4217 currency bookings are priced in
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Gateway request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Re-query the gateway before acting on a notification
    #[serde(default = "default_verify_notifications")]
    pub verify_notifications: bool,
}

impl PaymentConfig {
    /// Get gateway request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.shop_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_SHOP_ID"));
        }
        if self.secret_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_SECRET_KEY"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if production && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::GatewayMustBeHttps);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            shop_id: String::new(),
            secret_key: SecretString::new(String::new()),
            currency: default_currency(),
            request_timeout_secs: default_request_timeout(),
            verify_notifications: default_verify_notifications(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.yookassa.ru".to_string()
}

fn default_currency() -> String {
    "RUB".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_verify_notifications() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PaymentConfig {
        PaymentConfig {
            shop_id: "123456".to_string(),
            secret_key: SecretString::new("test_secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_payment_config_defaults() {
        let config = PaymentConfig::default();
        assert_eq!(config.api_base_url, "https://api.yookassa.ru");
        assert_eq!(config.currency, "RUB");
        assert!(config.verify_notifications);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validation_missing_shop_id() {
        let config = PaymentConfig {
            shop_id: String::new(),
            ..valid()
        };
        assert_eq!(
            config.validate(false),
            Err(ValidationError::MissingRequired("PAYMENT_SHOP_ID"))
        );
    }

    #[test]
    fn test_validation_missing_secret() {
        let config = PaymentConfig {
            secret_key: SecretString::new(String::new()),
            ..valid()
        };
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_validation_invalid_currency() {
        let config = PaymentConfig {
            currency: "rub".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidCurrency));
    }

    #[test]
    fn test_plain_http_gateway_only_outside_production() {
        let config = PaymentConfig {
            api_base_url: "http://localhost:9090".to_string(),
            ..valid()
        };
        assert!(config.validate(false).is_ok());
        assert_eq!(config.validate(true), Err(ValidationError::GatewayMustBeHttps));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("test_secret"));
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid().validate(true).is_ok());
    }
}
