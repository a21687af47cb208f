//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).
//! Status changes that touch inventory go through `BookingLifecycle`.

pub mod booking_lifecycle;
pub mod expiry_reaper;
pub mod handlers;
pub mod store_call;

pub use booking_lifecycle::{BookingLifecycle, TransitionOutcome};
pub use expiry_reaper::{ExpiryReaper, ReaperConfig, SweepReport};
pub use handlers::{
    // Booking handlers
    CancelBookingCommand, CancelBookingHandler, CancelBookingResult,
    ConfirmBookingCommand, ConfirmBookingHandler, ConfirmBookingResult,
    CreateBookingCommand, CreateBookingHandler, CreateBookingResult,
    GetBookingHandler, GetBookingQuery,
    // Payment handlers
    CreatePaymentSessionCommand, CreatePaymentSessionHandler, CreatePaymentSessionResult,
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult,
};
pub use store_call::DEFAULT_STORE_TIMEOUT;
