//! Conditional status transitions.
//!
//! A `StatusTransition` describes a compare-and-set on a persisted
//! booking: it applies only if the stored status is one of `from` and
//! the deadline guard holds at `at`. Stores evaluate the whole guard in a
//! single atomic operation. Confirmation requires a live hold and expiry
//! requires an elapsed one, so the two can never both succeed.

use crate::domain::foundation::{BookingId, StateMachine, Timestamp};

use super::{Booking, BookingStatus};

/// Constraint on `reserved_until` checked together with the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineGuard {
    /// No deadline check.
    Any,
    /// Requires `reserved_until > at`.
    NotElapsed,
    /// Requires `reserved_until <= at`.
    Elapsed,
}

impl DeadlineGuard {
    /// Evaluates the guard for a hold deadline at the given instant.
    pub fn holds(&self, reserved_until: &Timestamp, at: &Timestamp) -> bool {
        match self {
            DeadlineGuard::Any => true,
            DeadlineGuard::NotElapsed => reserved_until.is_after(at),
            DeadlineGuard::Elapsed => !reserved_until.is_after(at),
        }
    }
}

/// A guarded status change for one booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub booking_id: BookingId,
    pub from: Vec<BookingStatus>,
    pub to: BookingStatus,
    pub deadline: DeadlineGuard,
    pub payment_reference: Option<String>,
    pub at: Timestamp,
}

impl StatusTransition {
    /// Attach a payment session and move to Pending.
    pub fn attach_payment(booking_id: BookingId, reference: impl Into<String>, at: Timestamp) -> Self {
        Self::open_to(booking_id, BookingStatus::Pending, DeadlineGuard::NotElapsed, at)
            .with_payment_reference(reference)
    }

    /// Confirm a paid booking while its hold is still live.
    pub fn confirm(booking_id: BookingId, at: Timestamp) -> Self {
        Self::open_to(booking_id, BookingStatus::Confirmed, DeadlineGuard::NotElapsed, at)
    }

    /// Cancel an open booking.
    pub fn cancel(booking_id: BookingId, at: Timestamp) -> Self {
        Self::open_to(booking_id, BookingStatus::Cancelled, DeadlineGuard::Any, at)
    }

    /// Expire an open booking whose hold has elapsed.
    pub fn expire(booking_id: BookingId, at: Timestamp) -> Self {
        Self::open_to(booking_id, BookingStatus::Expired, DeadlineGuard::Elapsed, at)
    }

    fn open_to(booking_id: BookingId, to: BookingStatus, deadline: DeadlineGuard, at: Timestamp) -> Self {
        let from = BookingStatus::OPEN
            .iter()
            .copied()
            .filter(|s| s.can_transition_to(&to))
            .collect();
        Self {
            booking_id,
            from,
            to,
            deadline,
            payment_reference: None,
            at,
        }
    }

    fn with_payment_reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    /// Returns true if the guard admits the booking's current state.
    pub fn is_satisfied_by(&self, booking: &Booking) -> bool {
        booking.id == self.booking_id
            && self.from.contains(&booking.status)
            && self.deadline.holds(&booking.reserved_until, &self.at)
    }

    /// Returns true if the stored booking carries exactly this transition:
    /// target status, stamp and payment reference. Stamps are compared at
    /// microsecond precision, which is what Postgres keeps.
    pub fn is_reflected_in(&self, booking: &Booking) -> bool {
        booking.id == self.booking_id
            && booking.status == self.to
            && booking.updated_at.as_datetime().timestamp_micros()
                == self.at.as_datetime().timestamp_micros()
            && self
                .payment_reference
                .as_ref()
                .map_or(true, |r| booking.payment_reference.as_ref() == Some(r))
    }

    /// Applies the transition to an in-memory booking. Callers check
    /// `is_satisfied_by` first.
    pub fn apply_to(&self, booking: &mut Booking) {
        booking.status = self.to;
        if let Some(reference) = &self.payment_reference {
            booking.payment_reference = Some(reference.clone());
        }
        booking.updated_at = self.at;
    }
}
