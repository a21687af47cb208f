//! YooKassa payment gateway adapter.
//!
//! Implements the `PaymentGateway` port over the YooKassa v3 REST API.
//!
//! # Security
//!
//! - HTTP Basic auth with shop id and secret key
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = YooKassaConfig::new(shop_id, secret_key);
//! let gateway = YooKassaGateway::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{
    CreatePaymentRequest, PaymentError, PaymentErrorCode, PaymentGateway, PaymentSession,
    PaymentSnapshot,
};

use super::api_types::{ApiCreatePayment, ApiErrorBody, ApiPayment};

/// Default API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.yookassa.ru";

/// Header carrying the idempotency key on creation.
const IDEMPOTENCE_KEY_HEADER: &str = "Idempotence-Key";

/// YooKassa API configuration.
#[derive(Clone)]
pub struct YooKassaConfig {
    /// Shop identifier (Basic auth user).
    shop_id: String,

    /// Secret API key (Basic auth password).
    secret_key: SecretString,

    /// Base URL for the API.
    api_base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl YooKassaConfig {
    /// Create a new configuration with default base URL and a 10s timeout.
    pub fn new(shop_id: impl Into<String>, secret_key: SecretString) -> Self {
        Self {
            shop_id: shop_id.into(),
            secret_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// YooKassa payment gateway adapter.
pub struct YooKassaGateway {
    config: YooKassaConfig,
    http_client: reqwest::Client,
}

impl YooKassaGateway {
    /// Create a new adapter with the given configuration.
    pub fn new(config: YooKassaConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn payments_url(&self) -> String {
        format!("{}/v3/payments", self.config.api_base_url)
    }

    async fn decode_payment(response: reqwest::Response) -> Result<ApiPayment, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body));
        }
        response.json().await.map_err(|e| {
            PaymentError::invalid_response(format!("Failed to parse gateway response: {}", e))
        })
    }
}

fn transport_error(e: reqwest::Error) -> PaymentError {
    if e.is_timeout() {
        PaymentError::network(format!("Gateway request timed out: {}", e))
    } else {
        PaymentError::network(e.to_string())
    }
}

/// Maps a non-2xx response to a payment error.
fn error_for_status(status: StatusCode, body: &str) -> PaymentError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
    let description = parsed
        .as_ref()
        .and_then(|b| b.description.clone())
        .unwrap_or_else(|| body.to_string());

    let error = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PaymentError::authentication(description),
        StatusCode::NOT_FOUND => PaymentError::not_found("Payment"),
        StatusCode::TOO_MANY_REQUESTS => {
            PaymentError::new(PaymentErrorCode::RateLimitExceeded, description)
        }
        s if s.is_server_error() => PaymentError::new(
            PaymentErrorCode::NetworkError,
            format!("Gateway unavailable ({}): {}", s, description),
        ),
        s => PaymentError::new(
            PaymentErrorCode::ProviderError,
            format!("Gateway rejected request ({}): {}", s, description),
        ),
    };

    match parsed.and_then(|b| b.code) {
        Some(code) => error.with_provider_code(code),
        None => error,
    }
}

#[async_trait]
impl PaymentGateway for YooKassaGateway {
    async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentSession, PaymentError> {
        let body = ApiCreatePayment::from(&request);

        let response = self
            .http_client
            .post(self.payments_url())
            .basic_auth(&self.config.shop_id, Some(self.config.secret_key.expose_secret()))
            .header(IDEMPOTENCE_KEY_HEADER, &request.idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let session = Self::decode_payment(response).await?.into_session()?;

        tracing::info!(
            booking_id = %request.booking_id,
            payment_id = %session.id,
            status = %session.status,
            "Gateway payment created"
        );

        Ok(session)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentSnapshot, PaymentError> {
        let url = format!("{}/{}", self.payments_url(), payment_id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.config.shop_id, Some(self.config.secret_key.expose_secret()))
            .send()
            .await
            .map_err(transport_error)?;

        let snapshot = Self::decode_payment(response).await?.into_snapshot()?;

        tracing::debug!(payment_id, status = %snapshot.status, "Gateway payment fetched");

        Ok(snapshot)
    }
}
