//! Event catalog entities.
//!
//! An Event is read-only from the booking core's perspective. The only
//! mutable number on a ticket type is `sold`, and it changes exclusively
//! through the ticket ledger's conditional updates.

use crate::domain::foundation::{EventId, Money, TicketTypeId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};

/// A priced, capacity-bounded category of inventory within an event.
///
/// # Invariants
///
/// - `sold <= capacity`
/// - `price` is non-negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: TicketTypeId,
    pub name: String,
    pub capacity: u32,
    pub sold: u32,
    pub price: Money,
}

impl TicketType {
    /// Creates a ticket type with nothing sold yet.
    pub fn new(
        id: TicketTypeId,
        name: impl Into<String>,
        capacity: u32,
        price: Money,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if price.minor() < 0 {
            return Err(ValidationError::out_of_range("price", 0, i64::MAX, price.minor()));
        }
        Ok(Self {
            id,
            name,
            capacity,
            sold: 0,
            price,
        })
    }

    /// Sets an initial sold count, used when seeding a catalog.
    pub fn with_sold(mut self, sold: u32) -> Result<Self, ValidationError> {
        if sold > self.capacity {
            return Err(ValidationError::out_of_range(
                "sold",
                0,
                i64::from(self.capacity),
                i64::from(sold),
            ));
        }
        self.sold = sold;
        Ok(self)
    }

    /// Units still available for reservation.
    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.sold)
    }
}

/// An event with its ordered ticket catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date: Timestamp,
    pub ticket_types: Vec<TicketType>,
}

impl Event {
    /// Creates an event, rejecting duplicate ticket type identifiers.
    pub fn new(
        id: EventId,
        name: impl Into<String>,
        date: Timestamp,
        ticket_types: Vec<TicketType>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        for (i, tt) in ticket_types.iter().enumerate() {
            if ticket_types[..i].iter().any(|other| other.id == tt.id) {
                return Err(ValidationError::invalid_format(
                    "ticket_types",
                    format!("duplicate ticket type {}", tt.id),
                ));
            }
        }
        Ok(Self {
            id,
            name,
            date,
            ticket_types,
        })
    }

    /// Looks up a ticket type of this event by identifier.
    pub fn ticket_type(&self, id: &TicketTypeId) -> Option<&TicketType> {
        self.ticket_types.iter().find(|tt| &tt.id == id)
    }
}
