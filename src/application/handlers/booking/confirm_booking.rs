//! ConfirmBookingHandler - Command handler for confirming a paid booking.
//!
//! Confirmation is accepted only while the booking is open and its hold
//! has not elapsed. Reserved units already count as sold, so a confirmed
//! booking keeps its inventory.

use std::sync::Arc;

use crate::domain::booking::{Booking, BookingError};
use crate::domain::foundation::{BookingId, Timestamp};

use crate::application::booking_lifecycle::BookingLifecycle;

/// Command to confirm a booking.
#[derive(Debug, Clone)]
pub struct ConfirmBookingCommand {
    pub booking_id: BookingId,
}

/// Result of a successful confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmBookingResult {
    pub booking: Booking,
}

/// Handler for confirming bookings.
pub struct ConfirmBookingHandler {
    lifecycle: Arc<BookingLifecycle>,
}

impl ConfirmBookingHandler {
    pub fn new(lifecycle: Arc<BookingLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub async fn handle(&self, cmd: ConfirmBookingCommand) -> Result<ConfirmBookingResult, BookingError> {
        let booking = self.lifecycle.confirm(cmd.booking_id, Timestamp::now()).await?;
        Ok(ConfirmBookingResult { booking })
    }
}
