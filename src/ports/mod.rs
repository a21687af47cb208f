//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Inventory Ports
//!
//! - `TicketLedger` - Atomic reserve/release counters per ticket type
//! - `EventRepository` - Read access to events and their ticket catalog
//!
//! ## Booking Ports
//!
//! - `BookingRepository` - Booking persistence with guarded status writes
//!
//! ## Payment Ports
//!
//! - `PaymentGateway` - External payment creation and status queries

mod booking_repository;
mod event_repository;
mod payment_gateway;
mod ticket_ledger;

pub use booking_repository::BookingRepository;
pub use event_repository::EventRepository;
pub use payment_gateway::{
    CreatePaymentRequest, GatewayPaymentStatus, PaymentError, PaymentErrorCode, PaymentGateway,
    PaymentOutcome, PaymentSession, PaymentSnapshot,
};
pub use ticket_ledger::TicketLedger;
