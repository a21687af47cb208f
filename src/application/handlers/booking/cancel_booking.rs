//! CancelBookingHandler - Command handler for user-initiated cancellation.
//!
//! Only the owner may cancel, and only while the booking is open. The
//! status flip lands before inventory is released, so a concurrent
//! cancel, confirmation or expiry cannot release the same units twice.

use std::sync::Arc;

use crate::domain::booking::{Booking, BookingError, Resource};
use crate::domain::foundation::{BookingId, Timestamp, UserId};
use crate::ports::BookingRepository;

use crate::application::booking_lifecycle::BookingLifecycle;
use crate::application::store_call::bounded;

/// Command to cancel a booking.
#[derive(Debug, Clone)]
pub struct CancelBookingCommand {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub reason: Option<String>,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone)]
pub struct CancelBookingResult {
    pub booking: Booking,
}

/// Handler for cancelling bookings.
pub struct CancelBookingHandler {
    bookings: Arc<dyn BookingRepository>,
    lifecycle: Arc<BookingLifecycle>,
}

impl CancelBookingHandler {
    pub fn new(bookings: Arc<dyn BookingRepository>, lifecycle: Arc<BookingLifecycle>) -> Self {
        Self {
            bookings,
            lifecycle,
        }
    }

    pub async fn handle(&self, cmd: CancelBookingCommand) -> Result<CancelBookingResult, BookingError> {
        // 1. Ownership check
        let owned = bounded(
            self.lifecycle.store_timeout(),
            "find booking",
            self.bookings.find_by_id_for_user(&cmd.booking_id, &cmd.user_id),
        )
        .await?;
        if owned.is_none() {
            return Err(BookingError::not_found(Resource::Booking, cmd.booking_id));
        }

        // 2. Flip, then release
        let booking = self.lifecycle.cancel(cmd.booking_id, Timestamp::now()).await?;

        tracing::info!(
            booking_id = %booking.id,
            user_id = %cmd.user_id,
            reason = cmd.reason.as_deref().unwrap_or("unspecified"),
            "booking cancelled by user"
        );

        Ok(CancelBookingResult { booking })
    }
}
