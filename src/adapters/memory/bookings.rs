//! In-Memory Booking Repository
//!
//! Stores bookings in memory. Guarded transitions evaluate and apply the
//! guard under one write lock, matching the single-statement update of
//! the Postgres adapter. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::booking::{Booking, BookingStatus, StatusTransition};
use crate::domain::foundation::{BookingId, DomainError, Timestamp, UserId};
use crate::ports::BookingRepository;

/// In-memory storage for bookings
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
    fail_saves: Arc<AtomicBool>,
}

impl InMemoryBookingRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a booking as-is (useful for tests)
    pub async fn put(&self, booking: Booking) {
        self.bookings.write().await.insert(booking.id, booking);
    }

    /// Get the number of stored bookings
    pub async fn count(&self) -> usize {
        self.bookings.read().await.len()
    }

    /// Make every subsequent save fail (useful for tests)
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn save(&self, booking: &Booking) -> Result<(), DomainError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DomainError::database("save failed (injected)"));
        }
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(DomainError::database(format!(
                "Booking {} already exists",
                booking.id
            )));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self.bookings.read().await.get(id).cloned())
    }

    async fn find_by_id_for_user(
        &self,
        id: &BookingId,
        user_id: &UserId,
    ) -> Result<Option<Booking>, DomainError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .get(id)
            .filter(|b| b.is_owned_by(user_id))
            .cloned())
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, DomainError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .find(|b| b.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn find_expired_reservations(
        &self,
        now: &Timestamp,
        limit: u32,
    ) -> Result<Vec<Booking>, DomainError> {
        let bookings = self.bookings.read().await;
        let mut expired: Vec<Booking> = bookings
            .values()
            .filter(|b| BookingStatus::OPEN.contains(&b.status) && b.reserved_until.is_before(now))
            .cloned()
            .collect();
        expired.sort_by_key(|b| b.reserved_until);
        expired.truncate(limit as usize);
        Ok(expired)
    }

    async fn transition_status(&self, transition: &StatusTransition) -> Result<bool, DomainError> {
        let mut bookings = self.bookings.write().await;
        let Some(booking) = bookings.get_mut(&transition.booking_id) else {
            return Ok(false);
        };
        if !transition.is_satisfied_by(booking) {
            return Ok(false);
        }
        transition.apply_to(booking);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{BookingLine, DEFAULT_CURRENCY};
    use crate::domain::event::TicketType;
    use crate::domain::foundation::{EventId, Money, TicketTypeId};

    fn booking(user: &str, now: Timestamp) -> Booking {
        let tt = TicketType::new(TicketTypeId::new(), "Parterre", 10, Money::from_major(25)).unwrap();
        Booking::reserve(
            BookingId::new(),
            UserId::new(user).unwrap(),
            EventId::new(),
            vec![BookingLine::snapshot(&tt, 2, vec![])],
            DEFAULT_CURRENCY,
            now,
        )
    }

    #[tokio::test]
    async fn save_then_find_round_trips() {
        let repo = InMemoryBookingRepository::new();
        let b = booking("u1", Timestamp::now());
        repo.save(&b).await.unwrap();

        assert_eq!(repo.find_by_id(&b.id).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn save_rejects_duplicates() {
        let repo = InMemoryBookingRepository::new();
        let b = booking("u1", Timestamp::now());
        repo.save(&b).await.unwrap();

        assert!(repo.save(&b).await.is_err());
    }

    #[tokio::test]
    async fn find_for_user_hides_other_users_bookings() {
        let repo = InMemoryBookingRepository::new();
        let b = booking("owner", Timestamp::now());
        repo.save(&b).await.unwrap();

        let other = UserId::new("other").unwrap();
        assert!(repo.find_by_id_for_user(&b.id, &other).await.unwrap().is_none());
        assert!(repo
            .find_by_id_for_user(&b.id, &b.user_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn expired_query_returns_only_open_bookings_past_deadline() {
        let repo = InMemoryBookingRepository::new();
        let past = Timestamp::now().add_minutes(-30);
        let stale = booking("u1", past);
        let mut stale_confirmed = booking("u2", past);
        stale_confirmed.status = BookingStatus::Confirmed;
        let fresh = booking("u3", Timestamp::now());
        for b in [&stale, &stale_confirmed, &fresh] {
            repo.put(b.clone()).await;
        }

        let expired = repo
            .find_expired_reservations(&Timestamp::now(), 10)
            .await
            .unwrap();

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, stale.id);
    }

    #[tokio::test]
    async fn transition_applies_once() {
        let repo = InMemoryBookingRepository::new();
        let now = Timestamp::now();
        let b = booking("u1", now);
        repo.save(&b).await.unwrap();

        let cancel = StatusTransition::cancel(b.id, now);
        assert!(repo.transition_status(&cancel).await.unwrap());
        assert!(!repo.transition_status(&cancel).await.unwrap());

        let stored = repo.find_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn transition_on_missing_booking_is_not_applied() {
        let repo = InMemoryBookingRepository::new();
        let t = StatusTransition::confirm(BookingId::new(), Timestamp::now());
        assert!(!repo.transition_status(&t).await.unwrap());
    }

    #[tokio::test]
    async fn payment_reference_lookup_finds_attached_booking() {
        let repo = InMemoryBookingRepository::new();
        let now = Timestamp::now();
        let b = booking("u1", now);
        repo.save(&b).await.unwrap();
        repo.transition_status(&StatusTransition::attach_payment(b.id, "pay-9", now))
            .await
            .unwrap();

        let found = repo.find_by_payment_reference("pay-9").await.unwrap().unwrap();
        assert_eq!(found.id, b.id);
        assert_eq!(found.status, BookingStatus::Pending);
    }
}
