//! Booking status state machine.
//!
//! Defines the booking lifecycle states and the legal transitions
//! between them. Confirmed, Cancelled and Expired are terminal.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Inventory is held until `reserved_until`.
    Reserved,

    /// A payment session exists; awaiting the gateway's verdict.
    /// Inventory is still held until `reserved_until`.
    Pending,

    /// Paid. Inventory is permanently sold.
    Confirmed,

    /// Cancelled by the user, an operator, or the gateway.
    Cancelled,

    /// Released by the reaper after the hold deadline passed.
    Expired,
}

impl BookingStatus {
    /// Statuses in which the booking still holds inventory.
    pub const OPEN: [BookingStatus; 2] = [BookingStatus::Reserved, BookingStatus::Pending];

    /// Returns true while the booking holds inventory.
    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Reserved => "reserved",
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(BookingStatus::Reserved),
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "expired" => Ok(BookingStatus::Expired),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown booking status '{}'", other),
            )),
        }
    }
}

impl StateMachine for BookingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            // From RESERVED
            (Reserved, Pending)
                | (Reserved, Confirmed)
                | (Reserved, Cancelled)
                | (Reserved, Expired)
            // From PENDING
                | (Pending, Pending) // New payment session
                | (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, Expired)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BookingStatus::*;
        match self {
            Reserved => vec![Pending, Confirmed, Cancelled, Expired],
            Pending => vec![Pending, Confirmed, Cancelled, Expired],
            Confirmed | Cancelled | Expired => vec![],
        }
    }
}
