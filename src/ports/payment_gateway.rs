//! Payment gateway port.
//!
//! Only the gateway's request/response contract is consumed: create a
//! redirect payment for a booking and read back a payment's status.
//!
//! # Design
//!
//! - **Idempotent**: creation carries an idempotency key so retries never
//!   open a second payment for the same booking
//! - **Typed schema**: decode failures surface as `PaymentError`, never
//!   as panics

use crate::domain::booking::BookingError;
use crate::domain::foundation::{BookingId, DomainError, Money};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for payment gateway integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a redirect payment for a booking.
    ///
    /// Returns the gateway's payment id and the URL the customer is sent to.
    async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentSession, PaymentError>;

    /// Fetch the authoritative state of a payment.
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentSnapshot, PaymentError>;
}

/// Request to open a payment for a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    /// Booking being paid; sent to the gateway as metadata.
    pub booking_id: BookingId,

    /// Amount to charge.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,

    /// Human-readable payment description.
    pub description: String,

    /// Where the gateway redirects the customer afterwards.
    pub return_url: String,

    /// Idempotency key for safe retries.
    pub idempotency_key: String,
}

/// Payment created at the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Gateway payment id (stored on the booking as payment reference).
    pub id: String,

    /// Status at creation time.
    pub status: GatewayPaymentStatus,

    /// Redirect URL for the customer.
    pub confirmation_url: String,
}

/// Gateway view of an existing payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    /// Gateway payment id.
    pub id: String,

    /// Current status.
    pub status: GatewayPaymentStatus,

    /// Booking id echoed back from the creation metadata.
    pub order_id: Option<String>,
}

/// Payment status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

/// What a gateway status means for the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Money captured; confirm the booking.
    Paid,
    /// Payment will never complete; cancel the booking.
    Failed,
    /// Still in flight; nothing to do yet.
    InFlight,
}

impl GatewayPaymentStatus {
    /// Parses the gateway's wire value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(GatewayPaymentStatus::Pending),
            "waiting_for_capture" => Some(GatewayPaymentStatus::WaitingForCapture),
            "succeeded" => Some(GatewayPaymentStatus::Succeeded),
            "canceled" => Some(GatewayPaymentStatus::Canceled),
            _ => None,
        }
    }

    /// Gateway wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayPaymentStatus::Pending => "pending",
            GatewayPaymentStatus::WaitingForCapture => "waiting_for_capture",
            GatewayPaymentStatus::Succeeded => "succeeded",
            GatewayPaymentStatus::Canceled => "canceled",
        }
    }

    /// Maps the status onto the booking lifecycle.
    pub fn outcome(&self) -> PaymentOutcome {
        match self {
            GatewayPaymentStatus::Succeeded => PaymentOutcome::Paid,
            GatewayPaymentStatus::Canceled => PaymentOutcome::Failed,
            GatewayPaymentStatus::Pending | GatewayPaymentStatus::WaitingForCapture => {
                PaymentOutcome::InFlight
            }
        }
    }
}

impl std::fmt::Display for GatewayPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment gateway errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Gateway's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Create an invalid response error (unexpected shape or status).
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        use crate::domain::foundation::ErrorCode;

        let code = match err.code {
            PaymentErrorCode::NotFound => ErrorCode::PaymentNotFound,
            _ => ErrorCode::ExternalServiceError,
        };

        DomainError::new(code, err.message)
    }
}

impl From<PaymentError> for BookingError {
    fn from(err: PaymentError) -> Self {
        BookingError::gateway(err.to_string())
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Response did not match the expected schema.
    InvalidResponse,

    /// Gateway rejected the request.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidResponse => "invalid_response",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
