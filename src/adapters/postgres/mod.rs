//! PostgreSQL adapters - Database implementations for persistence ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresTicketLedger` - Conditional-update inventory counters
//! - `PostgresEventRepository` - Event and ticket catalog reads
//! - `PostgresBookingRepository` - Bookings with guarded status writes

mod booking_repository;
mod event_repository;
mod ticket_ledger;

pub use booking_repository::PostgresBookingRepository;
pub use event_repository::PostgresEventRepository;
pub use ticket_ledger::PostgresTicketLedger;
