//! YooKassa payment gateway adapter.
//!
//! Implements the `PaymentGateway` port, including:
//! - Redirect payment creation with an idempotency key
//! - Payment status queries
//! - A mock gateway for tests
//!
//! # Security
//!
//! - Requests use HTTP Basic auth (shop id, secret key)
//! - Secrets are handled via `secrecy::SecretString`

mod api_types;
mod gateway_adapter;
mod mock_payment_gateway;

pub use api_types::{ApiAmount, ApiCreatePayment, ApiPayment};
pub use gateway_adapter::{YooKassaConfig, YooKassaGateway, DEFAULT_API_BASE_URL};
pub use mock_payment_gateway::{MethodCall, MockPaymentGateway};
