//! BookingLifecycle - Guarded status transitions with their inventory effects.
//!
//! Every transition that touches inventory follows the same order: flip
//! the persisted status with a compare-and-set first, then apply the
//! ledger effect only if the flip succeeded. A caller that loses a race
//! therefore never releases or confirms inventory a second time.
//!
//! | Transition | Guard | Ledger effect |
//! |------------|-------|---------------|
//! | attach payment | open, hold live | none |
//! | confirm | open, hold live | `confirm` per line |
//! | cancel | open | `release` per line |
//! | expire | open, hold elapsed | `release` per line |

use std::sync::Arc;
use std::time::Duration;

use crate::domain::booking::{Booking, BookingError, BookingStatus, Resource, StatusTransition};
use crate::domain::foundation::{BookingId, Timestamp};
use crate::ports::{BookingRepository, TicketLedger};

use super::store_call::{bounded, DEFAULT_STORE_TIMEOUT};

/// Outcome of a guarded transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The flip landed; the booking now has the target status.
    Applied(Booking),
    /// The guard did not hold; the booking is unchanged.
    Rejected(Booking),
}

/// Applies booking status transitions and their ledger effects.
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingRepository>,
    ledger: Arc<dyn TicketLedger>,
    store_timeout: Duration,
}

impl BookingLifecycle {
    pub fn new(bookings: Arc<dyn BookingRepository>, ledger: Arc<dyn TicketLedger>) -> Self {
        Self {
            bookings,
            ledger,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Override the per-call store timeout.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Loads a booking or fails with `NotFound`.
    pub async fn load(&self, booking_id: &BookingId) -> Result<Booking, BookingError> {
        bounded(self.store_timeout, "find booking", self.bookings.find_by_id(booking_id))
            .await?
            .ok_or_else(|| BookingError::not_found(Resource::Booking, booking_id))
    }

    async fn apply(&self, transition: StatusTransition) -> Result<TransitionOutcome, BookingError> {
        let written = bounded(
            self.store_timeout,
            "transition booking status",
            self.bookings.transition_status(&transition),
        )
        .await;
        let applied = match written {
            Ok(applied) => applied,
            Err(e) => return self.recover_unacknowledged(&transition, e).await,
        };
        let booking = self.load(&transition.booking_id).await?;
        if applied {
            tracing::info!(
                booking_id = %transition.booking_id,
                status = %transition.to,
                "booking status changed"
            );
            Ok(TransitionOutcome::Applied(booking))
        } else {
            tracing::debug!(
                booking_id = %transition.booking_id,
                current = %booking.status,
                attempted = %transition.to,
                "booking transition rejected by guard"
            );
            Ok(TransitionOutcome::Rejected(booking))
        }
    }

    /// Resolves a status write whose outcome is unknown.
    ///
    /// A write can land even though its reply timed out or failed. The
    /// booking is read back: if it carries this transition the flip is
    /// ours and the caller goes on to apply its ledger effect. A booking
    /// that cannot be read back after a releasing transition may be
    /// terminal with its hold still counted as sold, which the reaper can
    /// no longer see.
    async fn recover_unacknowledged(
        &self,
        transition: &StatusTransition,
        cause: BookingError,
    ) -> Result<TransitionOutcome, BookingError> {
        let reread = bounded(
            self.store_timeout,
            "find booking",
            self.bookings.find_by_id(&transition.booking_id),
        )
        .await;
        match reread {
            Ok(Some(booking)) if transition.is_reflected_in(&booking) => {
                tracing::warn!(
                    booking_id = %transition.booking_id,
                    status = %transition.to,
                    error = %cause,
                    "status change landed despite store error"
                );
                Ok(TransitionOutcome::Applied(booking))
            }
            Ok(_) => Err(cause),
            Err(e) if releases_inventory(transition.to) => {
                tracing::error!(
                    alert = "inventory_inconsistency",
                    booking_id = %transition.booking_id,
                    status = %transition.to,
                    error = %cause,
                    reread_error = %e,
                    "status change outcome unknown; hold may be stranded"
                );
                Err(BookingError::compensation_failed(format!(
                    "booking {} may be {} with its tickets still held: {}; {}",
                    transition.booking_id, transition.to, cause, e
                )))
            }
            Err(_) => Err(cause),
        }
    }

    /// Attaches a gateway payment reference and moves the booking to Pending.
    pub async fn attach_payment(
        &self,
        booking_id: BookingId,
        reference: &str,
        now: Timestamp,
    ) -> Result<TransitionOutcome, BookingError> {
        self.apply(StatusTransition::attach_payment(booking_id, reference, now))
            .await
    }

    /// Confirms a paid booking.
    ///
    /// Fails with `InvalidTransition` if the booking is terminal or its hold
    /// has elapsed; an elapsed booking is left for the reaper to expire.
    pub async fn confirm(&self, booking_id: BookingId, now: Timestamp) -> Result<Booking, BookingError> {
        let booking = match self.apply(StatusTransition::confirm(booking_id, now)).await? {
            TransitionOutcome::Applied(booking) => booking,
            TransitionOutcome::Rejected(booking) => {
                return Err(BookingError::invalid_transition(
                    rejected_status(&booking, &now),
                    BookingStatus::Confirmed,
                ));
            }
        };

        for line in &booking.lines {
            let confirmed = bounded(
                self.store_timeout,
                "confirm tickets",
                self.ledger
                    .confirm(&booking.event_id, &line.ticket_type_id, line.quantity),
            )
            .await;
            if let Err(e) = confirmed {
                // The booking is already Confirmed and the units already count as sold.
                tracing::error!(
                    alert = "inventory_inconsistency",
                    booking_id = %booking.id,
                    ticket_type_id = %line.ticket_type_id,
                    quantity = line.quantity,
                    error = %e,
                    "ledger confirm failed for confirmed booking"
                );
            }
        }

        Ok(booking)
    }

    /// Cancels an open booking and releases its inventory.
    pub async fn cancel(&self, booking_id: BookingId, now: Timestamp) -> Result<Booking, BookingError> {
        match self.apply(StatusTransition::cancel(booking_id, now)).await? {
            TransitionOutcome::Applied(booking) => {
                self.release_lines(&booking, "cancel").await?;
                Ok(booking)
            }
            TransitionOutcome::Rejected(booking) => Err(BookingError::invalid_transition(
                booking.status,
                BookingStatus::Cancelled,
            )),
        }
    }

    /// Expires a booking whose hold elapsed and releases its inventory.
    ///
    /// Returns `Ok(false)` if the booking was no longer expirable (a
    /// confirmation or cancellation won the race).
    pub async fn expire(&self, booking_id: BookingId, now: Timestamp) -> Result<bool, BookingError> {
        match self.apply(StatusTransition::expire(booking_id, now)).await? {
            TransitionOutcome::Applied(booking) => {
                self.release_lines(&booking, "expire").await?;
                Ok(true)
            }
            TransitionOutcome::Rejected(_) => Ok(false),
        }
    }

    /// Releases every line of a booking whose status flip already landed.
    ///
    /// All lines are attempted even if one fails. Any failure leaves held
    /// inventory without an open booking and is reported as
    /// `CompensationFailed`.
    async fn release_lines(&self, booking: &Booking, reason: &'static str) -> Result<(), BookingError> {
        let mut failures = Vec::new();
        for line in &booking.lines {
            let released = bounded(
                self.store_timeout,
                "release tickets",
                self.ledger
                    .release(&booking.event_id, &line.ticket_type_id, line.quantity),
            )
            .await;
            match released {
                Ok(()) => tracing::debug!(
                    booking_id = %booking.id,
                    ticket_type_id = %line.ticket_type_id,
                    quantity = line.quantity,
                    reason,
                    "tickets released"
                ),
                Err(e) => {
                    tracing::error!(
                        alert = "inventory_inconsistency",
                        booking_id = %booking.id,
                        ticket_type_id = %line.ticket_type_id,
                        quantity = line.quantity,
                        reason,
                        error = %e,
                        "failed to release tickets after status change"
                    );
                    failures.push(format!("{}: {}", line.ticket_type_id, e));
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BookingError::compensation_failed(format!(
                "booking {} is {} but {} line(s) were not released: {}",
                booking.id,
                booking.status,
                failures.len(),
                failures.join("; ")
            )))
        }
    }
}

fn releases_inventory(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Cancelled | BookingStatus::Expired)
}

/// Status to report when a confirmation was rejected. An open booking
/// whose hold elapsed is reported as expired.
fn rejected_status(booking: &Booking, now: &Timestamp) -> BookingStatus {
    if booking.status.is_open() && booking.is_reservation_elapsed(now) {
        BookingStatus::Expired
    } else {
        booking.status
    }
}
