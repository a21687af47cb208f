//! GetBookingHandler - Query handler for retrieving a user's booking.

use std::sync::Arc;

use crate::domain::booking::{Booking, BookingError, Resource};
use crate::domain::foundation::{BookingId, UserId};
use crate::ports::BookingRepository;

/// Query to get a booking by ID on behalf of its owner.
#[derive(Debug, Clone)]
pub struct GetBookingQuery {
    pub booking_id: BookingId,
    pub user_id: UserId,
}

/// Handler for retrieving booking details.
pub struct GetBookingHandler {
    bookings: Arc<dyn BookingRepository>,
}

impl GetBookingHandler {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// A booking owned by someone else is reported as absent.
    pub async fn handle(&self, query: GetBookingQuery) -> Result<Booking, BookingError> {
        self.bookings
            .find_by_id_for_user(&query.booking_id, &query.user_id)
            .await?
            .ok_or_else(|| BookingError::not_found(Resource::Booking, query.booking_id))
    }
}
