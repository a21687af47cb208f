//! Event catalog domain module.
//!
//! - `aggregate` - Event and TicketType entities

mod aggregate;

pub use aggregate::{Event, TicketType};
