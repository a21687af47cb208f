//! In-memory adapters for tests and local development.

mod bookings;
mod catalog;

pub use bookings::InMemoryBookingRepository;
pub use catalog::InMemoryCatalog;
