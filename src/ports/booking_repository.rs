//! Booking repository port.
//!
//! Persists booking records. The store holds no business rules: every
//! status change arrives as a `StatusTransition` that the implementation
//! applies as one atomic compare-and-set.
//!
//! # Design
//!
//! - **Never deletes**: terminal bookings are retained for audit
//! - **Guarded writes**: `transition_status` returns `false` when the guard
//!   does not hold, leaving the record untouched

use crate::domain::booking::{Booking, StatusTransition};
use crate::domain::foundation::{BookingId, DomainError, Timestamp, UserId};
use async_trait::async_trait;

/// Repository port for Booking persistence.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Save a new booking.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate id
    async fn save(&self, booking: &Booking) -> Result<(), DomainError>;

    /// Find a booking by its ID.
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError>;

    /// Find a booking by ID only if it belongs to the user.
    async fn find_by_id_for_user(
        &self,
        id: &BookingId,
        user_id: &UserId,
    ) -> Result<Option<Booking>, DomainError>;

    /// Find the booking a gateway payment reference was attached to.
    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, DomainError>;

    /// Find open (Reserved or Pending) bookings whose hold ended before
    /// `now`, oldest deadline first.
    async fn find_expired_reservations(
        &self,
        now: &Timestamp,
        limit: u32,
    ) -> Result<Vec<Booking>, DomainError>;

    /// Apply a guarded status change atomically.
    ///
    /// Returns `true` if the transition was applied, `false` if the stored
    /// status or deadline did not satisfy the guard (or the booking does
    /// not exist).
    async fn transition_status(&self, transition: &StatusTransition) -> Result<bool, DomainError>;
}
