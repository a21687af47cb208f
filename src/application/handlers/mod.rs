//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod booking;
pub mod payment;

pub use booking::{
    CancelBookingCommand, CancelBookingHandler, CancelBookingResult, ConfirmBookingCommand,
    ConfirmBookingHandler, ConfirmBookingResult, CreateBookingCommand, CreateBookingHandler,
    CreateBookingResult, GetBookingHandler, GetBookingQuery,
};
pub use payment::{
    CreatePaymentSessionCommand, CreatePaymentSessionHandler, CreatePaymentSessionResult,
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult,
};
