//! ExpiryReaper - Background service that returns elapsed holds to stock.
//!
//! Each sweep scans open bookings (Reserved or Pending) whose hold has
//! elapsed and expires them one at a time through the lifecycle service.
//! The status flip lands before inventory is released, so a booking that
//! was confirmed or cancelled in the meantime is skipped without touching
//! the ledger.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 60s | Time between sweeps |
//! | `batch_size` | 100 | Max bookings examined per sweep |
//!
//! ## Graceful Shutdown
//!
//! The service listens for a shutdown signal and runs one final sweep
//! before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::booking::BookingError;
use crate::domain::foundation::Timestamp;
use crate::ports::BookingRepository;

use super::booking_lifecycle::BookingLifecycle;
use super::store_call::bounded;

/// Configuration for the ExpiryReaper service.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// How often to sweep for elapsed holds.
    pub interval: Duration,

    /// Maximum bookings to examine per sweep.
    pub batch_size: u32,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            batch_size: 100,
        }
    }
}

impl ReaperConfig {
    /// Create config with custom sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Create config with custom batch size.
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }
}

/// Counts from a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Candidates returned by the store.
    pub examined: usize,
    /// Bookings flipped to Expired with inventory released.
    pub expired: usize,
    /// Candidates a concurrent transition settled first.
    pub skipped: usize,
    /// Candidates whose expiry failed; retried on the next sweep.
    pub failed: usize,
}

/// Background service that expires elapsed reservations.
pub struct ExpiryReaper {
    bookings: Arc<dyn BookingRepository>,
    lifecycle: Arc<BookingLifecycle>,
    config: ReaperConfig,
}

impl ExpiryReaper {
    /// Create a new reaper with default configuration.
    pub fn new(bookings: Arc<dyn BookingRepository>, lifecycle: Arc<BookingLifecycle>) -> Self {
        Self::with_config(bookings, lifecycle, ReaperConfig::default())
    }

    /// Create a new reaper with custom configuration.
    pub fn with_config(
        bookings: Arc<dyn BookingRepository>,
        lifecycle: Arc<BookingLifecycle>,
        config: ReaperConfig,
    ) -> Self {
        Self {
            bookings,
            lifecycle,
            config,
        }
    }

    /// Run the sweep loop until the shutdown signal is received.
    ///
    /// A failed sweep is logged and retried on the next tick; the loop only
    /// exits on shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            batch_size = self.config.batch_size,
            "expiry reaper started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.sweep_logged().await;
                        tracing::info!("expiry reaper stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.sweep_logged().await;
                }
            }
        }
    }

    async fn sweep_logged(&self) {
        match self.sweep_once(Timestamp::now()).await {
            Ok(report) if report.examined > 0 => tracing::info!(
                examined = report.examined,
                expired = report.expired,
                skipped = report.skipped,
                failed = report.failed,
                "expiry sweep finished"
            ),
            Ok(_) => tracing::trace!("expiry sweep found nothing"),
            Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
        }
    }

    /// Runs one sweep as of `now`.
    ///
    /// Only the candidate scan can fail the sweep. A failure on one booking
    /// is logged and the sweep moves on; a booking whose flip did not land
    /// stays open and is picked up again next time.
    pub async fn sweep_once(&self, now: Timestamp) -> Result<SweepReport, BookingError> {
        let candidates = bounded(
            self.lifecycle.store_timeout(),
            "find expired reservations",
            self.bookings
                .find_expired_reservations(&now, self.config.batch_size),
        )
        .await?;

        let mut report = SweepReport {
            examined: candidates.len(),
            ..SweepReport::default()
        };

        for booking in candidates {
            match self.lifecycle.expire(booking.id, now).await {
                Ok(true) => report.expired += 1,
                Ok(false) => {
                    tracing::debug!(booking_id = %booking.id, "booking settled before expiry");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(booking_id = %booking.id, error = %e, "booking expiry failed");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBookingRepository, InMemoryCatalog};
    use crate::domain::booking::{Booking, BookingLine, BookingStatus};
    use crate::domain::event::{Event, TicketType};
    use crate::domain::foundation::{BookingId, EventId, Money, TicketTypeId, UserId};
    use crate::ports::TicketLedger;

    struct Fixture {
        catalog: InMemoryCatalog,
        bookings: InMemoryBookingRepository,
        lifecycle: Arc<BookingLifecycle>,
        reaper: ExpiryReaper,
        event_id: EventId,
        ticket_type_id: TicketTypeId,
    }

    async fn fixture(batch_size: u32) -> Fixture {
        let tt = TicketType::new(TicketTypeId::new(), "Standard", 50, Money::from_major(30)).unwrap();
        let ticket_type_id = tt.id;
        let event = Event::new(EventId::new(), "Concert", Timestamp::now(), vec![tt]).unwrap();
        let event_id = event.id;
        let catalog = InMemoryCatalog::new();
        catalog.insert_event(event).await;
        let bookings = InMemoryBookingRepository::new();
        let lifecycle = Arc::new(BookingLifecycle::new(
            Arc::new(bookings.clone()),
            Arc::new(catalog.clone()),
        ));
        let reaper = ExpiryReaper::with_config(
            Arc::new(bookings.clone()),
            Arc::clone(&lifecycle),
            ReaperConfig::default().with_batch_size(batch_size),
        );
        Fixture {
            catalog,
            bookings,
            lifecycle,
            reaper,
            event_id,
            ticket_type_id,
        }
    }

    async fn held(f: &Fixture, quantity: u32, reserved_at: Timestamp, status: BookingStatus) -> Booking {
        f.catalog
            .reserve(&f.event_id, &f.ticket_type_id, quantity)
            .await
            .unwrap();
        let mut booking = Booking::reserve(
            BookingId::new(),
            UserId::new("alice").unwrap(),
            f.event_id,
            vec![BookingLine {
                ticket_type_id: f.ticket_type_id,
                ticket_type_name: "Standard".to_string(),
                unit_price: Money::from_major(30),
                quantity,
                line_total: Money::from_major(30).times(quantity),
                seats: vec![],
            }],
            "RUB",
            reserved_at,
        );
        booking.status = status;
        f.bookings.put(booking.clone()).await;
        booking
    }

    async fn status_of(f: &Fixture, booking: &Booking) -> BookingStatus {
        f.lifecycle.load(&booking.id).await.unwrap().status
    }

    #[tokio::test]
    async fn expires_elapsed_reserved_and_pending_bookings() {
        let f = fixture(100).await;
        let old = Timestamp::now().add_minutes(-16);
        let reserved = held(&f, 2, old, BookingStatus::Reserved).await;
        let pending = held(&f, 3, old, BookingStatus::Pending).await;
        let live = held(&f, 1, Timestamp::now(), BookingStatus::Reserved).await;

        let report = f.reaper.sweep_once(Timestamp::now()).await.unwrap();

        assert_eq!(report.examined, 2);
        assert_eq!(report.expired, 2);
        assert_eq!(status_of(&f, &reserved).await, BookingStatus::Expired);
        assert_eq!(status_of(&f, &pending).await, BookingStatus::Expired);
        assert_eq!(status_of(&f, &live).await, BookingStatus::Reserved);
        assert_eq!(f.catalog.sold(&f.event_id, &f.ticket_type_id).await, Some(1));
    }

    #[tokio::test]
    async fn terminal_bookings_are_never_touched() {
        let f = fixture(100).await;
        let old = Timestamp::now().add_minutes(-60);
        let confirmed = held(&f, 4, old, BookingStatus::Confirmed).await;

        let report = f.reaper.sweep_once(Timestamp::now()).await.unwrap();

        assert_eq!(report, SweepReport::default());
        assert_eq!(status_of(&f, &confirmed).await, BookingStatus::Confirmed);
        assert_eq!(f.catalog.sold(&f.event_id, &f.ticket_type_id).await, Some(4));
    }

    #[tokio::test]
    async fn second_sweep_does_not_release_again() {
        let f = fixture(100).await;
        held(&f, 2, Timestamp::now().add_minutes(-16), BookingStatus::Reserved).await;
        held(&f, 5, Timestamp::now(), BookingStatus::Confirmed).await;

        f.reaper.sweep_once(Timestamp::now()).await.unwrap();
        let again = f.reaper.sweep_once(Timestamp::now()).await.unwrap();

        assert_eq!(again.examined, 0);
        assert_eq!(f.catalog.sold(&f.event_id, &f.ticket_type_id).await, Some(5));
    }

    #[tokio::test]
    async fn batch_size_limits_one_sweep() {
        let f = fixture(2).await;
        let old = Timestamp::now().add_minutes(-30);
        for _ in 0..5 {
            held(&f, 1, old, BookingStatus::Reserved).await;
        }

        let first = f.reaper.sweep_once(Timestamp::now()).await.unwrap();
        assert_eq!(first.expired, 2);
        assert_eq!(f.catalog.sold(&f.event_id, &f.ticket_type_id).await, Some(3));
    }

    #[tokio::test]
    async fn failed_release_is_counted_and_sweep_continues() {
        let f = fixture(100).await;
        let old = Timestamp::now().add_minutes(-30);
        held(&f, 1, old, BookingStatus::Reserved).await;
        held(&f, 1, old, BookingStatus::Reserved).await;
        f.catalog.set_fail_releases(true);

        let report = f.reaper.sweep_once(Timestamp::now()).await.unwrap();

        assert_eq!(report.examined, 2);
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn run_sweeps_on_shutdown() {
        let f = fixture(100).await;
        let booking = held(&f, 2, Timestamp::now().add_minutes(-16), BookingStatus::Reserved).await;
        let reaper = ExpiryReaper::with_config(
            Arc::new(f.bookings.clone()),
            Arc::clone(&f.lifecycle),
            ReaperConfig::default().with_interval(Duration::from_secs(3600)),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { reaper.run(rx).await });
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(status_of(&f, &booking).await, BookingStatus::Expired);
        assert_eq!(f.catalog.sold(&f.event_id, &f.ticket_type_id).await, Some(0));
    }
}
