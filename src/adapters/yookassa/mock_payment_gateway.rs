//! Mock payment gateway for testing.
//!
//! Provides a configurable implementation of `PaymentGateway` for unit and
//! integration tests. Supports:
//! - Generated or pre-configured payments
//! - Error injection
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{
    CreatePaymentRequest, GatewayPaymentStatus, PaymentError, PaymentGateway, PaymentSession,
    PaymentSnapshot,
};

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// let session = gateway.create_payment(request).await?;
///
/// // Simulate the customer paying
/// gateway.set_status(&session.id, GatewayPaymentStatus::Succeeded);
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Payments by gateway id.
    payments: HashMap<String, PaymentSnapshot>,

    /// Payment ids by idempotency key.
    idempotency: HashMap<String, String>,

    /// Counter for generated ids.
    next_id: u64,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    /// Create a new mock gateway.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Set the status the gateway reports for a payment.
    pub fn set_status(&self, payment_id: &str, status: GatewayPaymentStatus) {
        let mut state = self.state();
        let entry = state
            .payments
            .entry(payment_id.to_string())
            .or_insert_with(|| PaymentSnapshot {
                id: payment_id.to_string(),
                status,
                order_id: None,
            });
        entry.status = status;
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        self.state().method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        match self.state().method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentSession, PaymentError> {
        self.record_call(
            "create_payment",
            vec![
                request.booking_id.to_string(),
                request.amount.to_decimal_string(),
                request.currency.clone(),
                request.return_url.clone(),
            ],
        );
        self.check_error("create_payment")?;

        let mut state = self.state();
        let existing = state.idempotency.get(&request.idempotency_key).cloned();
        let id = match existing {
            Some(existing) => existing,
            None => {
                state.next_id += 1;
                let id = format!("mock_pay_{}", state.next_id);
                state
                    .idempotency
                    .insert(request.idempotency_key.clone(), id.clone());
                state.payments.insert(
                    id.clone(),
                    PaymentSnapshot {
                        id: id.clone(),
                        status: GatewayPaymentStatus::Pending,
                        order_id: Some(request.booking_id.to_string()),
                    },
                );
                id
            }
        };
        let status = state
            .payments
            .get(&id)
            .map(|p| p.status)
            .unwrap_or(GatewayPaymentStatus::Pending);

        Ok(PaymentSession {
            confirmation_url: format!("https://mock-gateway.test/checkout/{}", id),
            id,
            status,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentSnapshot, PaymentError> {
        self.record_call("get_payment", vec![payment_id.to_string()]);
        self.check_error("get_payment")?;

        self.state()
            .payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Payment"))
    }
}
