//! HTTP DTOs (Data Transfer Objects) for booking and payment endpoints.
//!
//! These types define the JSON request/response structure for the booking API.
//! They serve as the boundary between HTTP and the application layer.
//! Money leaves the service as decimal strings ("380.00").

use serde::{Deserialize, Serialize};

use crate::application::handlers::CreatePaymentSessionResult;
use crate::domain::booking::{Booking, BookingError, BookingLine, BookingStatus, Seat, TicketSelection};
use crate::domain::foundation::{EventId, TicketTypeId};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to reserve tickets.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub event_id: String,
    pub tickets: Vec<TicketRequest>,
}

/// One requested ticket line.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketRequest {
    pub ticket_type_id: String,
    pub quantity: u32,
    /// Seat descriptors, passed through untouched.
    #[serde(default)]
    pub seats: Vec<Seat>,
}

impl CreateBookingRequest {
    /// Parses identifiers; malformed ids are validation failures.
    pub fn into_parts(self) -> Result<(EventId, Vec<TicketSelection>), BookingError> {
        let event_id = EventId::parse(&self.event_id)?;
        let tickets = self
            .tickets
            .into_iter()
            .map(|t| {
                Ok(TicketSelection {
                    ticket_type_id: TicketTypeId::parse(&t.ticket_type_id)?,
                    quantity: t.quantity,
                    seats: t.seats,
                })
            })
            .collect::<Result<Vec<_>, BookingError>>()?;
        Ok((event_id, tickets))
    }
}

/// Request to cancel a booking. The body is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request to start checkout for a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: String,
    pub return_url: String,
}

/// Payment notification as delivered by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub event: String,
    pub object: NotificationObject,
}

/// Payment object embedded in a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationObject {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub metadata: Option<NotificationMetadata>,
}

/// Metadata the service attached when creating the payment.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationMetadata {
    #[serde(default)]
    pub order_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Booking view for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub status: BookingStatus,
    pub lines: Vec<BookingLineResponse>,
    pub subtotal: String,
    pub service_fee: String,
    pub total: String,
    pub currency: String,
    /// Hold deadline (ISO 8601).
    pub reserved_until: String,
    pub payment_reference: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Priced line of a booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingLineResponse {
    pub ticket_type_id: String,
    pub ticket_type_name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seats: Vec<Seat>,
}

impl From<&BookingLine> for BookingLineResponse {
    fn from(line: &BookingLine) -> Self {
        Self {
            ticket_type_id: line.ticket_type_id.to_string(),
            ticket_type_name: line.ticket_type_name.clone(),
            unit_price: line.unit_price.to_decimal_string(),
            quantity: line.quantity,
            line_total: line.line_total.to_decimal_string(),
            seats: line.seats.clone(),
        }
    }
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.to_string(),
            event_id: booking.event_id.to_string(),
            status: booking.status,
            lines: booking.lines.iter().map(BookingLineResponse::from).collect(),
            subtotal: booking.subtotal.to_decimal_string(),
            service_fee: booking.service_fee.to_decimal_string(),
            total: booking.total.to_decimal_string(),
            currency: booking.currency,
            reserved_until: booking.reserved_until.as_datetime().to_rfc3339(),
            payment_reference: booking.payment_reference,
            created_at: booking.created_at.as_datetime().to_rfc3339(),
            updated_at: booking.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for payment session creation.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSessionResponse {
    pub booking_id: String,
    pub payment_id: String,
    pub confirmation_url: String,
}

impl From<CreatePaymentSessionResult> for PaymentSessionResponse {
    fn from(result: CreatePaymentSessionResult) -> Self {
        Self {
            booking_id: result.booking_id.to_string(),
            payment_id: result.payment_id,
            confirmation_url: result.confirmation_url,
        }
    }
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationAck {
    pub result: &'static str,
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
