//! Axum router configuration for booking and payment endpoints.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    cancel_booking, create_booking, create_payment, get_booking, health, payment_webhook,
    BookingAppState,
};

/// Create the booking API router.
///
/// # Routes
///
/// ## User Endpoints (require `X-User-Id`)
/// - `POST /bookings` - Reserve tickets
/// - `GET /bookings/:id` - Get own booking
/// - `POST /bookings/:id/cancel` - Cancel own booking
/// - `POST /payments` - Create payment session
///
/// ## Gateway Endpoints (no user)
/// - `POST /payments/webhook` - Payment notification
pub fn booking_routes() -> Router<BookingAppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/payments", post(create_payment))
        .route("/payments/webhook", post(payment_webhook))
}

/// Create the complete service router mounted under `/api`, plus `/health`.
pub fn booking_router() -> Router<BookingAppState> {
    Router::new()
        .nest("/api", booking_routes())
        .route("/health", get(health))
}

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Finish the router with state and the standard middleware stack.
///
/// Every response carries an `x-request-id`, taken from the request when
/// the caller sent one and generated otherwise.
pub fn app(state: BookingAppState, request_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    booking_router()
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
