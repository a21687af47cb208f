//! Booking handlers.
//!
//! ## Commands
//! - Creating a reservation (all-or-nothing across lines)
//! - Cancelling a booking
//! - Confirming a paid booking
//!
//! ## Queries
//! - Get booking details

mod cancel_booking;
mod confirm_booking;
mod create_booking;
mod get_booking;

// Commands
pub use cancel_booking::{CancelBookingCommand, CancelBookingHandler, CancelBookingResult};
pub use confirm_booking::{ConfirmBookingCommand, ConfirmBookingHandler, ConfirmBookingResult};
pub use create_booking::{CreateBookingCommand, CreateBookingHandler, CreateBookingResult};

// Queries
pub use get_booking::{GetBookingHandler, GetBookingQuery};
