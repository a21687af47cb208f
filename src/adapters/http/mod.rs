//! HTTP adapters - REST API implementations.

pub mod booking;

// Re-export key types for convenience
pub use booking::{app, booking_router, BookingAppState};
