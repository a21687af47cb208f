//! HTTP adapter for booking and payment endpoints.
//!
//! Exposes the booking service via REST API:
//! - `POST /api/bookings` - Reserve tickets
//! - `GET /api/bookings/:id` - Get own booking
//! - `POST /api/bookings/:id/cancel` - Cancel own booking
//! - `POST /api/payments` - Create payment session
//! - `POST /api/payments/webhook` - Gateway payment notification
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AuthenticatedUser, BookingApiError, BookingAppState};
pub use routes::{app, booking_router, booking_routes};
