//! YooKassa REST API schema.
//!
//! Explicit request and response shapes for the payments API. Anything
//! that fails to decode becomes a `PaymentError`, never a panic.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Money;
use crate::ports::{
    CreatePaymentRequest, GatewayPaymentStatus, PaymentError, PaymentSession, PaymentSnapshot,
};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Monetary amount as the gateway expects it ("380.00").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiAmount {
    pub value: String,
    pub currency: String,
}

impl ApiAmount {
    pub fn new(amount: Money, currency: impl Into<String>) -> Self {
        Self {
            value: amount.to_decimal_string(),
            currency: currency.into(),
        }
    }
}

/// Confirmation scenario requested on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiConfirmationRequest {
    Redirect { return_url: String },
}

/// Metadata echoed back by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// Body of `POST /v3/payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiCreatePayment {
    pub amount: ApiAmount,
    pub capture: bool,
    pub description: String,
    pub confirmation: ApiConfirmationRequest,
    pub metadata: ApiMetadata,
}

impl From<&CreatePaymentRequest> for ApiCreatePayment {
    fn from(request: &CreatePaymentRequest) -> Self {
        Self {
            amount: ApiAmount::new(request.amount, request.currency.clone()),
            capture: true,
            description: request.description.clone(),
            confirmation: ApiConfirmationRequest::Redirect {
                return_url: request.return_url.clone(),
            },
            metadata: ApiMetadata {
                order_id: Some(request.booking_id.to_string()),
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// Confirmation block of a payment object.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfirmation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub confirmation_url: Option<String>,
}

/// Payment object returned by create and get calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPayment {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<ApiAmount>,
    #[serde(default)]
    pub confirmation: Option<ApiConfirmation>,
    #[serde(default)]
    pub metadata: Option<ApiMetadata>,
}

impl ApiPayment {
    fn parsed_status(&self) -> Result<GatewayPaymentStatus, PaymentError> {
        GatewayPaymentStatus::parse(&self.status).ok_or_else(|| {
            PaymentError::invalid_response(format!("Unknown payment status '{}'", self.status))
        })
    }

    /// Converts a creation response, which must carry a redirect URL.
    pub fn into_session(self) -> Result<PaymentSession, PaymentError> {
        let status = self.parsed_status()?;
        let confirmation_url = self
            .confirmation
            .and_then(|c| c.confirmation_url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PaymentError::invalid_response("Missing confirmation.confirmation_url"))?;
        Ok(PaymentSession {
            id: self.id,
            status,
            confirmation_url,
        })
    }

    /// Converts a status query response.
    pub fn into_snapshot(self) -> Result<PaymentSnapshot, PaymentError> {
        let status = self.parsed_status()?;
        Ok(PaymentSnapshot {
            id: self.id,
            status,
            order_id: self.metadata.and_then(|m| m.order_id),
        })
    }
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::BookingId;
    use crate::ports::PaymentErrorCode;
    use serde_json::json;

    #[test]
    fn create_body_matches_gateway_contract() {
        let booking_id = BookingId::new();
        let request = CreatePaymentRequest {
            booking_id,
            amount: Money::from_major(380),
            currency: "RUB".to_string(),
            description: "Booking".to_string(),
            return_url: "https://shop.example/return".to_string(),
            idempotency_key: booking_id.to_string(),
        };

        let body = serde_json::to_value(ApiCreatePayment::from(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "amount": {"value": "380.00", "currency": "RUB"},
                "capture": true,
                "description": "Booking",
                "confirmation": {"type": "redirect", "return_url": "https://shop.example/return"},
                "metadata": {"order_id": booking_id.to_string()}
            })
        );
    }

    #[test]
    fn creation_response_yields_redirect_url() {
        let payment: ApiPayment = serde_json::from_value(json!({
            "id": "2d3c1a7e-000f-5000-9000-1b7c8f2a3e11",
            "status": "pending",
            "amount": {"value": "380.00", "currency": "RUB"},
            "confirmation": {"type": "redirect", "confirmation_url": "https://pay.example/c/1"},
            "paid": false
        }))
        .unwrap();

        let session = payment.into_session().unwrap();
        assert_eq!(session.status, GatewayPaymentStatus::Pending);
        assert_eq!(session.confirmation_url, "https://pay.example/c/1");
    }

    #[test]
    fn creation_response_without_url_is_invalid() {
        let payment: ApiPayment =
            serde_json::from_value(json!({"id": "p1", "status": "pending"})).unwrap();

        let err = payment.into_session().unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidResponse);
    }

    #[test]
    fn unknown_status_is_invalid() {
        let payment: ApiPayment =
            serde_json::from_value(json!({"id": "p1", "status": "refunded"})).unwrap();

        assert!(payment.into_snapshot().is_err());
    }

    #[test]
    fn snapshot_carries_order_id() {
        let payment: ApiPayment = serde_json::from_value(json!({
            "id": "p1",
            "status": "succeeded",
            "metadata": {"order_id": "b-1", "cms_name": "other"}
        }))
        .unwrap();

        let snapshot = payment.into_snapshot().unwrap();
        assert_eq!(snapshot.status, GatewayPaymentStatus::Succeeded);
        assert_eq!(snapshot.order_id.as_deref(), Some("b-1"));
    }
}
