//! HTTP handlers for booking and payment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    CancelBookingCommand, CancelBookingHandler, CreateBookingCommand, CreateBookingHandler,
    CreatePaymentSessionCommand, CreatePaymentSessionHandler, GetBookingHandler, GetBookingQuery,
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult,
};
use crate::application::{BookingLifecycle, DEFAULT_STORE_TIMEOUT};
use crate::domain::booking::{BookingError, DEFAULT_CURRENCY};
use crate::domain::foundation::{BookingId, ErrorCode, UserId};
use crate::ports::{BookingRepository, EventRepository, GatewayPaymentStatus, PaymentGateway, TicketLedger};

use super::dto::{
    BookingResponse, CancelBookingRequest, CreateBookingRequest, CreatePaymentRequest,
    ErrorResponse, HealthResponse, NotificationAck, PaymentNotification, PaymentSessionResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is Arc-wrapped and wired
/// once at start-up.
#[derive(Clone)]
pub struct BookingAppState {
    pub events: Arc<dyn EventRepository>,
    pub ledger: Arc<dyn TicketLedger>,
    pub bookings: Arc<dyn BookingRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub lifecycle: Arc<BookingLifecycle>,
    pub currency: String,
    pub store_timeout: Duration,
    pub verify_notifications: bool,
}

impl BookingAppState {
    pub fn new(
        events: Arc<dyn EventRepository>,
        ledger: Arc<dyn TicketLedger>,
        bookings: Arc<dyn BookingRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let lifecycle = Arc::new(BookingLifecycle::new(bookings.clone(), ledger.clone()));
        Self {
            events,
            ledger,
            bookings,
            gateway,
            lifecycle,
            currency: DEFAULT_CURRENCY.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            verify_notifications: true,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self.lifecycle = Arc::new(
            BookingLifecycle::new(self.bookings.clone(), self.ledger.clone()).with_store_timeout(timeout),
        );
        self
    }

    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_notifications = verify;
        self
    }

    /// Create handlers on demand from the shared state.
    pub fn create_booking_handler(&self) -> CreateBookingHandler {
        CreateBookingHandler::new(self.events.clone(), self.ledger.clone(), self.bookings.clone())
            .with_currency(self.currency.clone())
            .with_store_timeout(self.store_timeout)
    }

    pub fn get_booking_handler(&self) -> GetBookingHandler {
        GetBookingHandler::new(self.bookings.clone())
    }

    pub fn cancel_booking_handler(&self) -> CancelBookingHandler {
        CancelBookingHandler::new(self.bookings.clone(), self.lifecycle.clone())
    }

    pub fn create_payment_session_handler(&self) -> CreatePaymentSessionHandler {
        CreatePaymentSessionHandler::new(
            self.bookings.clone(),
            self.lifecycle.clone(),
            self.gateway.clone(),
        )
    }

    pub fn reconcile_payment_handler(&self) -> ReconcilePaymentHandler {
        ReconcilePaymentHandler::new(
            self.bookings.clone(),
            self.lifecycle.clone(),
            self.gateway.clone(),
        )
        .with_verification(self.verify_notifications)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from request.
///
/// Identity is established upstream; the gateway in front of this service
/// forwards the caller's id in the `X-User-Id` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/bookings/:id - Get one of the caller's bookings
pub async fn get_booking(
    State(state): State<BookingAppState>,
    user: AuthenticatedUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, BookingApiError> {
    let query = GetBookingQuery {
        booking_id: BookingId::parse(&booking_id).map_err(BookingError::from)?,
        user_id: user.user_id,
    };

    let booking = state.get_booking_handler().handle(query).await?;

    Ok(Json(BookingResponse::from(booking)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/bookings - Reserve tickets
pub async fn create_booking(
    State(state): State<BookingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, BookingApiError> {
    let (event_id, tickets) = request.into_parts()?;
    let cmd = CreateBookingCommand {
        user_id: user.user_id,
        event_id,
        tickets,
    };

    let result = state.create_booking_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(result.booking))))
}

/// POST /api/bookings/:id/cancel - Cancel one of the caller's bookings
pub async fn cancel_booking(
    State(state): State<BookingAppState>,
    user: AuthenticatedUser,
    Path(booking_id): Path<String>,
    request: Option<Json<CancelBookingRequest>>,
) -> Result<impl IntoResponse, BookingApiError> {
    let cmd = CancelBookingCommand {
        booking_id: BookingId::parse(&booking_id).map_err(BookingError::from)?,
        user_id: user.user_id,
        reason: request.and_then(|Json(body)| body.reason),
    };

    let result = state.cancel_booking_handler().handle(cmd).await?;

    Ok(Json(BookingResponse::from(result.booking)))
}

/// POST /api/payments - Start checkout for a booking
pub async fn create_payment(
    State(state): State<BookingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, BookingApiError> {
    let cmd = CreatePaymentSessionCommand {
        booking_id: BookingId::parse(&request.booking_id).map_err(BookingError::from)?,
        user_id: user.user_id,
        return_url: request.return_url,
    };

    let result = state.create_payment_session_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(PaymentSessionResponse::from(result))))
}

/// Notification envelope type the gateway sends.
const NOTIFICATION_KIND: &str = "notification";

/// POST /api/payments/webhook - Gateway payment notification
///
/// Unauthenticated; the reported status is re-checked with the gateway
/// unless verification is disabled.
pub async fn payment_webhook(
    State(state): State<BookingAppState>,
    Json(notification): Json<PaymentNotification>,
) -> Result<impl IntoResponse, BookingApiError> {
    if notification.kind != NOTIFICATION_KIND {
        return Err(BookingError::validation(
            "type",
            format!("unsupported notification type '{}'", notification.kind),
        )
        .into());
    }
    let reported_status = GatewayPaymentStatus::parse(&notification.object.status).ok_or_else(|| {
        BookingError::validation(
            "object.status",
            format!("unknown payment status '{}'", notification.object.status),
        )
    })?;

    tracing::info!(
        event = %notification.event,
        payment_id = %notification.object.id,
        status = %reported_status,
        "payment notification received"
    );

    let cmd = ReconcilePaymentCommand {
        payment_reference: notification.object.id,
        reported_status,
        reported_order_id: notification.object.metadata.and_then(|m| m.order_id),
    };

    let result = state.reconcile_payment_handler().handle(cmd).await?;

    let ack = match result {
        ReconcilePaymentResult::Confirmed => "confirmed",
        ReconcilePaymentResult::Cancelled => "cancelled",
        ReconcilePaymentResult::Unchanged(_) => "unchanged",
        ReconcilePaymentResult::AwaitingPayment => "awaiting_payment",
    };
    Ok(Json(NotificationAck { result: ack }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts booking errors to HTTP responses.
#[derive(Debug)]
pub struct BookingApiError(BookingError);

impl From<BookingError> for BookingApiError {
    fn from(err: BookingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BookingApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match self.0.code() {
            ErrorCode::ValidationFailed => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            ErrorCode::EventNotFound => (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND"),
            ErrorCode::TicketTypeNotFound => (StatusCode::NOT_FOUND, "TICKET_TYPE_NOT_FOUND"),
            ErrorCode::BookingNotFound => (StatusCode::NOT_FOUND, "BOOKING_NOT_FOUND"),
            ErrorCode::PaymentNotFound => (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND"),
            ErrorCode::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorCode::SoldOut => (StatusCode::CONFLICT, "SOLD_OUT"),
            ErrorCode::InvalidStateTransition => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            ErrorCode::InvalidState => (StatusCode::CONFLICT, "INVALID_STATE"),
            ErrorCode::ExternalServiceError => (StatusCode::BAD_GATEWAY, "GATEWAY_FAILURE"),
            ErrorCode::InventoryInconsistency => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INVENTORY_INCONSISTENCY")
            }
            ErrorCode::DatabaseError | ErrorCode::Timeout | ErrorCode::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_FAILURE")
            }
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self.0, "request failed");
        }

        let body = ErrorResponse::new(error_code, self.0.message());
        (status, Json(body)).into_response()
    }
}
