//! Booking aggregate.
//!
//! A Booking is created by the reservation handler once every line has
//! been reserved in the ticket ledger. Its status only changes through
//! conditional transitions (see `transition`), and bookings are never
//! deleted.
//!
//! # Design Decisions
//!
//! - **Price snapshots**: each line captures the ticket type's name and
//!   unit price at reservation time
//! - **Money in minor units**: all amounts are `Money`, never floats
//! - **Bounded hold**: `reserved_until` is fixed at creation time

use crate::domain::event::TicketType;
use crate::domain::foundation::{
    BookingId, EventId, Money, TicketTypeId, Timestamp, UserId, ValidationError,
};
use serde::{Deserialize, Serialize};

use super::pricing::{price_lines, PriceBreakdown};
use super::BookingStatus;

/// How long a reservation holds inventory.
pub const RESERVATION_TTL_MINUTES: i64 = 15;

/// Maximum number of tickets across all lines of one booking.
pub const MAX_TICKETS_PER_BOOKING: u32 = 10;

/// Currency used when none is configured.
pub const DEFAULT_CURRENCY: &str = "RUB";

/// Opaque seat assignment passed through from the client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Seat {
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub row: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub seat_id: String,
}

/// A requested line of a new booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSelection {
    pub ticket_type_id: TicketTypeId,
    pub quantity: u32,
    pub seats: Vec<Seat>,
}

/// Validates requested lines, returning the total ticket count.
///
/// Requires at least one line, a positive quantity per line and at most
/// `MAX_TICKETS_PER_BOOKING` tickets overall.
pub fn validate_selections(selections: &[TicketSelection]) -> Result<u32, ValidationError> {
    if selections.is_empty() {
        return Err(ValidationError::empty_field("tickets"));
    }
    let mut total: u32 = 0;
    for selection in selections {
        if selection.quantity == 0 {
            return Err(ValidationError::out_of_range(
                "quantity",
                1,
                i64::from(MAX_TICKETS_PER_BOOKING),
                0,
            ));
        }
        total = total.saturating_add(selection.quantity);
    }
    if total > MAX_TICKETS_PER_BOOKING {
        return Err(ValidationError::out_of_range(
            "quantity",
            1,
            i64::from(MAX_TICKETS_PER_BOOKING),
            i64::from(total),
        ));
    }
    Ok(total)
}

/// One ticket type line of a booking, priced at reservation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingLine {
    pub ticket_type_id: TicketTypeId,
    pub ticket_type_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seats: Vec<Seat>,
}

impl BookingLine {
    /// Captures the ticket type's current name and price.
    pub fn snapshot(ticket_type: &TicketType, quantity: u32, seats: Vec<Seat>) -> Self {
        Self {
            ticket_type_id: ticket_type.id,
            ticket_type_name: ticket_type.name.clone(),
            unit_price: ticket_type.price,
            quantity,
            line_total: ticket_type.price.times(quantity),
            seats,
        }
    }
}

/// Booking aggregate.
///
/// # Invariants
///
/// - `total == subtotal + service_fee`
/// - `lines` is non-empty
/// - `reserved_until` is only meaningful while the status is open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub status: BookingStatus,
    pub lines: Vec<BookingLine>,
    pub subtotal: Money,
    pub service_fee: Money,
    pub total: Money,
    pub currency: String,
    pub reserved_until: Timestamp,
    pub payment_reference: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// Creates a freshly reserved booking holding inventory for the TTL.
    pub fn reserve(
        id: BookingId,
        user_id: UserId,
        event_id: EventId,
        lines: Vec<BookingLine>,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        let PriceBreakdown {
            subtotal,
            service_fee,
            total,
        } = price_lines(&lines);
        Self {
            id,
            user_id,
            event_id,
            status: BookingStatus::Reserved,
            lines,
            subtotal,
            service_fee,
            total,
            currency: currency.into(),
            reserved_until: now.add_minutes(RESERVATION_TTL_MINUTES),
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true once the hold deadline has passed at `now`.
    pub fn is_reservation_elapsed(&self, now: &Timestamp) -> bool {
        !self.reserved_until.is_after(now)
    }

    /// Returns true if this booking belongs to the given user.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Total number of tickets across lines.
    pub fn ticket_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}
