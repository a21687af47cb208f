//! Booking domain module.
//!
//! Handles the reservation lifecycle: price snapshots, hold deadlines and
//! guarded status transitions.
//!
//! # Module Structure
//!
//! - `aggregate` - Booking aggregate, lines and request validation
//! - `status` - BookingStatus state machine
//! - `transition` - Conditional (compare-and-set) status transitions
//! - `pricing` - Subtotal and service fee calculation
//! - `errors` - BookingError taxonomy

mod aggregate;
mod errors;
mod pricing;
mod status;
mod transition;

pub use aggregate::{
    validate_selections, Booking, BookingLine, Seat, TicketSelection, DEFAULT_CURRENCY,
    MAX_TICKETS_PER_BOOKING, RESERVATION_TTL_MINUTES,
};
pub use errors::{BookingError, Resource};
pub use pricing::{
    line_service_fee, price_lines, PriceBreakdown, SERVICE_FEE_FLOOR_PER_TICKET,
    SERVICE_FEE_PERCENT,
};
pub use status::BookingStatus;
pub use transition::{DeadlineGuard, StatusTransition};
