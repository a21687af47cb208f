//! CreateBookingHandler - Command handler for all-or-nothing reservations.
//!
//! Lines are reserved one at a time against the ledger. The first failure
//! releases every line reserved earlier in the same request, so the caller
//! sees either a complete reservation or no change at all.
//!
//! The reserve-and-persist sequence runs on its own task. Dropping the
//! caller's future (client disconnect, request timeout) cannot interrupt
//! it between a successful reserve and its compensation.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::domain::booking::{
    validate_selections, Booking, BookingError, BookingLine, BookingStatus, Resource,
    StatusTransition, TicketSelection, DEFAULT_CURRENCY,
};
use crate::domain::foundation::{BookingId, EventId, Timestamp, UserId};
use crate::ports::{BookingRepository, EventRepository, TicketLedger};

use crate::application::store_call::{bounded, DEFAULT_STORE_TIMEOUT};

/// Command to reserve tickets for an event.
#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub user_id: UserId,
    pub event_id: EventId,
    pub tickets: Vec<TicketSelection>,
}

/// Result of a successful reservation.
#[derive(Debug, Clone)]
pub struct CreateBookingResult {
    pub booking: Booking,
}

/// Handler for creating bookings.
pub struct CreateBookingHandler {
    events: Arc<dyn EventRepository>,
    ledger: Arc<dyn TicketLedger>,
    bookings: Arc<dyn BookingRepository>,
    currency: String,
    store_timeout: Duration,
}

impl CreateBookingHandler {
    pub fn new(
        events: Arc<dyn EventRepository>,
        ledger: Arc<dyn TicketLedger>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            events,
            ledger,
            bookings,
            currency: DEFAULT_CURRENCY.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Set the currency bookings are priced in.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Override the per-call store timeout.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub async fn handle(&self, cmd: CreateBookingCommand) -> Result<CreateBookingResult, BookingError> {
        // 1. Validate the request shape
        validate_selections(&cmd.tickets)?;

        // 2. Load the event
        let event = bounded(self.store_timeout, "load event", self.events.find_by_id(&cmd.event_id))
            .await?
            .ok_or_else(|| BookingError::not_found(Resource::Event, cmd.event_id))?;

        // 3. Resolve ticket types and snapshot prices
        let lines = cmd
            .tickets
            .into_iter()
            .map(|selection| {
                event
                    .ticket_type(&selection.ticket_type_id)
                    .map(|tt| BookingLine::snapshot(tt, selection.quantity, selection.seats))
                    .ok_or_else(|| {
                        BookingError::not_found(Resource::TicketType, selection.ticket_type_id)
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // 4-6. Reserve, persist, compensate on a detached task
        let reservation = Reservation {
            ledger: Arc::clone(&self.ledger),
            bookings: Arc::clone(&self.bookings),
            store_timeout: self.store_timeout,
            booking: Booking::reserve(
                BookingId::new(),
                cmd.user_id,
                event.id,
                lines,
                self.currency.clone(),
                Timestamp::now(),
            ),
        };

        let span = tracing::info_span!(
            "reserve_booking",
            booking_id = %reservation.booking.id,
            event_id = %reservation.booking.event_id,
            user_id = %reservation.booking.user_id,
        );
        let booking = tokio::spawn(reservation.run().instrument(span))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "reservation task aborted");
                BookingError::persistence(format!("Reservation task failed: {}", e))
            })??;

        Ok(CreateBookingResult { booking })
    }
}

/// Owned state of one reservation attempt.
struct Reservation {
    ledger: Arc<dyn TicketLedger>,
    bookings: Arc<dyn BookingRepository>,
    store_timeout: Duration,
    booking: Booking,
}

impl Reservation {
    async fn run(self) -> Result<Booking, BookingError> {
        let booking = &self.booking;

        // 4. Reserve sequentially; undo earlier lines on first failure
        let mut reserved: Vec<&BookingLine> = Vec::with_capacity(booking.lines.len());
        for line in &booking.lines {
            let result = bounded(
                self.store_timeout,
                "reserve tickets",
                self.ledger
                    .reserve(&booking.event_id, &line.ticket_type_id, line.quantity),
            )
            .await;
            if let Err(e) = result {
                tracing::info!(
                    ticket_type_id = %line.ticket_type_id,
                    quantity = line.quantity,
                    error = %e,
                    "line reservation failed, compensating"
                );
                return Err(self.compensate(&reserved, e).await);
            }
            reserved.push(line);
        }

        // 6. Persist; a booking that is not stored must not hold inventory
        let saved = bounded(self.store_timeout, "save booking", self.bookings.save(booking)).await;
        if let Err(e) = saved {
            tracing::warn!(error = %e, "booking persistence failed, compensating");
            return Err(match self.fence_unsaved_booking().await {
                SaveFence::Clear => self.compensate(&reserved, e).await,
                SaveFence::Settled(status) => {
                    tracing::warn!(%status, "stored booking already settled; nothing to release");
                    e
                }
                SaveFence::Unresolved(detail) => {
                    tracing::error!(
                        alert = "inventory_inconsistency",
                        error = %e,
                        detail = %detail,
                        "booking may be stored after failed save; hold left for expiry"
                    );
                    BookingError::compensation_failed(format!("{} ({})", e, detail))
                }
            });
        }

        tracing::info!(
            total = %booking.total,
            tickets = booking.ticket_count(),
            reserved_until = %booking.reserved_until.as_datetime(),
            "booking reserved"
        );
        Ok(self.booking)
    }

    /// Releases reserved lines in reverse order and returns the error to
    /// report. A failed release is a fatal inconsistency.
    async fn compensate(&self, reserved: &[&BookingLine], cause: BookingError) -> BookingError {
        let mut failures = Vec::new();
        for line in reserved.iter().rev() {
            let released = bounded(
                self.store_timeout,
                "release tickets",
                self.ledger
                    .release(&self.booking.event_id, &line.ticket_type_id, line.quantity),
            )
            .await;
            if let Err(e) = released {
                tracing::error!(
                    alert = "inventory_inconsistency",
                    booking_id = %self.booking.id,
                    ticket_type_id = %line.ticket_type_id,
                    quantity = line.quantity,
                    error = %e,
                    "compensating release failed"
                );
                failures.push(format!("{}: {}", line.ticket_type_id, e));
            }
        }
        if failures.is_empty() {
            cause
        } else {
            BookingError::compensation_failed(format!(
                "{} (compensation failed for {})",
                cause,
                failures.join("; ")
            ))
        }
    }

    /// A failed save may still have landed. Cancels the booking if it
    /// exists, then decides whether this task may release its lines. Lines
    /// are released only when no stored open booking can still claim them.
    async fn fence_unsaved_booking(&self) -> SaveFence {
        let fence = StatusTransition::cancel(self.booking.id, Timestamp::now());
        let fenced = bounded(
            self.store_timeout,
            "fence unsaved booking",
            self.bookings.transition_status(&fence),
        )
        .await;
        if let Ok(true) = fenced {
            tracing::warn!(
                booking_id = %self.booking.id,
                "booking was stored despite save error; cancelled before release"
            );
            return SaveFence::Clear;
        }

        let stored = bounded(
            self.store_timeout,
            "check unsaved booking",
            self.bookings.find_by_id(&self.booking.id),
        )
        .await;
        match (fenced, stored) {
            (_, Ok(None)) => SaveFence::Clear,
            (_, Ok(Some(booking))) if fence.is_reflected_in(&booking) => SaveFence::Clear,
            (_, Ok(Some(booking))) if !booking.status.is_open() => SaveFence::Settled(booking.status),
            (_, Ok(Some(booking))) => SaveFence::Unresolved(format!(
                "booking {} is stored as {} and could not be cancelled",
                booking.id, booking.status
            )),
            (Err(fence_err), Err(read_err)) => SaveFence::Unresolved(format!(
                "fence failed: {}; read back failed: {}",
                fence_err, read_err
            )),
            (Ok(_), Err(read_err)) => {
                SaveFence::Unresolved(format!("read back failed: {}", read_err))
            }
        }
    }
}

/// What a failed save leaves behind in the store.
enum SaveFence {
    /// No open booking holds the reserved lines; compensation may release them.
    Clear,
    /// The booking was stored and already left the open states.
    Settled(BookingStatus),
    /// A stored open booking may still hold the lines.
    Unresolved(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::Seat;
    use crate::domain::event::{Event, TicketType};
    use crate::domain::foundation::{DomainError, ErrorCode, Money, TicketTypeId};
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::adapters::memory::{InMemoryBookingRepository, InMemoryCatalog};
    use crate::application::{BookingLifecycle, ExpiryReaper};

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    /// Ledger that records calls and rejects reserves for one ticket type.
    struct RecordingLedger {
        calls: Mutex<Vec<String>>,
        reject: Option<TicketTypeId>,
        fail_release: bool,
    }

    impl RecordingLedger {
        fn new(reject: Option<TicketTypeId>, fail_release: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reject,
                fail_release,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TicketLedger for RecordingLedger {
        async fn reserve(&self, _: &EventId, tt: &TicketTypeId, q: u32) -> Result<(), DomainError> {
            self.calls.lock().unwrap().push(format!("reserve {} {}", tt, q));
            if self.reject == Some(*tt) {
                return Err(DomainError::new(ErrorCode::SoldOut, "sold out")
                    .with_detail("ticket_type_id", tt.to_string()));
            }
            Ok(())
        }

        async fn release(&self, _: &EventId, tt: &TicketTypeId, q: u32) -> Result<(), DomainError> {
            self.calls.lock().unwrap().push(format!("release {} {}", tt, q));
            if self.fail_release {
                return Err(DomainError::database("release failed"));
            }
            Ok(())
        }

        async fn confirm(&self, _: &EventId, _: &TicketTypeId, _: u32) -> Result<(), DomainError> {
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Fixtures
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        catalog: InMemoryCatalog,
        bookings: InMemoryBookingRepository,
        event_id: EventId,
        vip: TicketTypeId,
        standard: TicketTypeId,
    }

    async fn fixture() -> Fixture {
        let vip = TicketType::new(TicketTypeId::new(), "VIP", 5, Money::from_major(100))
            .unwrap()
            .with_sold(3)
            .unwrap();
        let standard = TicketType::new(TicketTypeId::new(), "Standard", 100, Money::from_major(30)).unwrap();
        let (vip_id, standard_id) = (vip.id, standard.id);
        let event = Event::new(EventId::new(), "Concert", Timestamp::now(), vec![vip, standard]).unwrap();
        let event_id = event.id;
        let catalog = InMemoryCatalog::new();
        catalog.insert_event(event).await;
        Fixture {
            catalog,
            bookings: InMemoryBookingRepository::new(),
            event_id,
            vip: vip_id,
            standard: standard_id,
        }
    }

    fn handler(f: &Fixture) -> CreateBookingHandler {
        CreateBookingHandler::new(
            Arc::new(f.catalog.clone()),
            Arc::new(f.catalog.clone()),
            Arc::new(f.bookings.clone()),
        )
    }

    fn select(tt: TicketTypeId, quantity: u32) -> TicketSelection {
        TicketSelection {
            ticket_type_id: tt,
            quantity,
            seats: vec![],
        }
    }

    fn command(f: &Fixture, tickets: Vec<TicketSelection>) -> CreateBookingCommand {
        CreateBookingCommand {
            user_id: UserId::new("user-1").unwrap(),
            event_id: f.event_id,
            tickets,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn reserves_all_lines_and_persists_booking() {
        let f = fixture().await;

        let result = handler(&f)
            .handle(command(&f, vec![select(f.vip, 2), select(f.standard, 1)]))
            .await
            .unwrap();

        let booking = result.booking;
        assert_eq!(booking.status, BookingStatus::Reserved);
        assert_eq!(booking.subtotal, Money::from_major(230));
        assert_eq!(booking.service_fee, Money::from_major(150));
        assert_eq!(booking.total, Money::from_major(380));
        assert_eq!(booking.currency, "RUB");
        assert_eq!(f.catalog.sold(&f.event_id, &f.vip).await, Some(5));
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(1));
        assert_eq!(f.bookings.count().await, 1);
    }

    #[tokio::test]
    async fn seats_are_passed_through() {
        let f = fixture().await;
        let seat = Seat {
            sector: "A".to_string(),
            row: "3".to_string(),
            number: "14".to_string(),
            seat_id: "ext-3-14".to_string(),
        };
        let mut selection = select(f.standard, 1);
        selection.seats = vec![seat.clone()];

        let result = handler(&f).handle(command(&f, vec![selection])).await.unwrap();

        assert_eq!(result.booking.lines[0].seats, vec![seat]);
    }

    #[tokio::test]
    async fn configured_currency_is_used() {
        let f = fixture().await;
        let result = handler(&f)
            .with_currency("EUR")
            .handle(command(&f, vec![select(f.standard, 1)]))
            .await
            .unwrap();
        assert_eq!(result.booking.currency, "EUR");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Validation and Lookup Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invalid_request_has_no_side_effects() {
        let f = fixture().await;

        let err = handler(&f)
            .handle(command(&f, vec![select(f.standard, 6), select(f.vip, 5)]))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::ValidationFailed { .. }));
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(0));
        assert_eq!(f.bookings.count().await, 0);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let f = fixture().await;
        let mut cmd = command(&f, vec![select(f.standard, 1)]);
        cmd.event_id = EventId::new();

        let err = handler(&f).handle(cmd).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::EventNotFound);
    }

    #[tokio::test]
    async fn unknown_ticket_type_is_not_found_before_any_reserve() {
        let f = fixture().await;

        let err = handler(&f)
            .handle(command(&f, vec![select(f.standard, 1), select(TicketTypeId::new(), 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::TicketTypeNotFound);
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(0));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Compensation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn sold_out_line_releases_earlier_lines() {
        let f = fixture().await;

        let err = handler(&f)
            .handle(command(&f, vec![select(f.standard, 2), select(f.vip, 3)]))
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::sold_out(f.vip));
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(0));
        assert_eq!(f.catalog.sold(&f.event_id, &f.vip).await, Some(3));
        assert_eq!(f.bookings.count().await, 0);
    }

    #[tokio::test]
    async fn compensation_runs_in_reverse_order() {
        let f = fixture().await;
        let ledger = Arc::new(RecordingLedger::new(Some(f.vip), false));
        let handler = CreateBookingHandler::new(
            Arc::new(f.catalog.clone()),
            ledger.clone(),
            Arc::new(f.bookings.clone()),
        );

        let _ = handler
            .handle(command(&f, vec![select(f.standard, 1), select(f.standard, 2), select(f.vip, 1)]))
            .await;

        assert_eq!(
            ledger.calls(),
            vec![
                format!("reserve {} 1", f.standard),
                format!("reserve {} 2", f.standard),
                format!("reserve {} 1", f.vip),
                format!("release {} 2", f.standard),
                format!("release {} 1", f.standard),
            ]
        );
    }

    #[tokio::test]
    async fn persistence_failure_releases_every_line() {
        let f = fixture().await;
        f.bookings.set_fail_saves(true);

        let err = handler(&f)
            .handle(command(&f, vec![select(f.standard, 2), select(f.vip, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Persistence(_)));
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(0));
        assert_eq!(f.catalog.sold(&f.event_id, &f.vip).await, Some(3));
    }

    #[tokio::test]
    async fn failed_compensation_is_reported_as_inconsistency() {
        let f = fixture().await;
        let ledger = Arc::new(RecordingLedger::new(Some(f.vip), true));
        let handler = CreateBookingHandler::new(
            Arc::new(f.catalog.clone()),
            ledger,
            Arc::new(f.bookings.clone()),
        );

        let err = handler
            .handle(command(&f, vec![select(f.standard, 1), select(f.vip, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::CompensationFailed(_)));
        assert_eq!(err.code(), ErrorCode::InventoryInconsistency);
    }

    #[tokio::test]
    async fn slow_ledger_times_out_and_compensates() {
        struct SlowSecondLine {
            inner: InMemoryCatalog,
            slow: TicketTypeId,
        }

        #[async_trait]
        impl TicketLedger for SlowSecondLine {
            async fn reserve(&self, e: &EventId, tt: &TicketTypeId, q: u32) -> Result<(), DomainError> {
                if *tt == self.slow {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                self.inner.reserve(e, tt, q).await
            }

            async fn release(&self, e: &EventId, tt: &TicketTypeId, q: u32) -> Result<(), DomainError> {
                self.inner.release(e, tt, q).await
            }

            async fn confirm(&self, e: &EventId, tt: &TicketTypeId, q: u32) -> Result<(), DomainError> {
                self.inner.confirm(e, tt, q).await
            }
        }

        let f = fixture().await;
        let handler = CreateBookingHandler::new(
            Arc::new(f.catalog.clone()),
            Arc::new(SlowSecondLine {
                inner: f.catalog.clone(),
                slow: f.vip,
            }),
            Arc::new(f.bookings.clone()),
        )
        .with_store_timeout(Duration::from_millis(50));

        let err = handler
            .handle(command(&f, vec![select(f.standard, 2), select(f.vip, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Persistence(_)));
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(0));
        assert_eq!(f.catalog.sold(&f.event_id, &f.vip).await, Some(3));
    }

    /// Store whose saves land but answer late; status writes can be failed.
    struct LateSaveRepository {
        inner: InMemoryBookingRepository,
        fail_transitions: bool,
    }

    #[async_trait]
    impl BookingRepository for LateSaveRepository {
        async fn save(&self, booking: &Booking) -> Result<(), DomainError> {
            self.inner.save(booking).await?;
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(())
        }

        async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_id_for_user(
            &self,
            id: &BookingId,
            user_id: &UserId,
        ) -> Result<Option<Booking>, DomainError> {
            self.inner.find_by_id_for_user(id, user_id).await
        }

        async fn find_by_payment_reference(&self, reference: &str) -> Result<Option<Booking>, DomainError> {
            self.inner.find_by_payment_reference(reference).await
        }

        async fn find_expired_reservations(
            &self,
            now: &Timestamp,
            limit: u32,
        ) -> Result<Vec<Booking>, DomainError> {
            self.inner.find_expired_reservations(now, limit).await
        }

        async fn transition_status(&self, transition: &StatusTransition) -> Result<bool, DomainError> {
            if self.fail_transitions {
                return Err(DomainError::database("update failed"));
            }
            self.inner.transition_status(transition).await
        }
    }

    fn late_save_handler(f: &Fixture, fail_transitions: bool) -> CreateBookingHandler {
        CreateBookingHandler::new(
            Arc::new(f.catalog.clone()),
            Arc::new(f.catalog.clone()),
            Arc::new(LateSaveRepository {
                inner: f.bookings.clone(),
                fail_transitions,
            }),
        )
        .with_store_timeout(Duration::from_millis(50))
    }

    fn reaper(f: &Fixture) -> ExpiryReaper {
        let lifecycle = BookingLifecycle::new(Arc::new(f.bookings.clone()), Arc::new(f.catalog.clone()));
        ExpiryReaper::new(Arc::new(f.bookings.clone()), Arc::new(lifecycle))
    }

    #[tokio::test]
    async fn late_save_is_cancelled_before_release() {
        let f = fixture().await;
        f.catalog.reserve(&f.event_id, &f.standard, 4).await.unwrap();

        let err = late_save_handler(&f, false)
            .handle(command(&f, vec![select(f.standard, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Persistence(_)));
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(4));
        assert_eq!(f.bookings.count().await, 1);

        let report = reaper(&f).sweep_once(Timestamp::now().add_minutes(60)).await.unwrap();

        assert_eq!(report.examined, 0);
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(4));
    }

    #[tokio::test]
    async fn unfenced_late_save_keeps_hold_for_expiry() {
        let f = fixture().await;
        f.catalog.reserve(&f.event_id, &f.standard, 4).await.unwrap();

        let err = late_save_handler(&f, true)
            .handle(command(&f, vec![select(f.standard, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::CompensationFailed(_)));
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(7));

        let report = reaper(&f).sweep_once(Timestamp::now().add_minutes(60)).await.unwrap();

        assert_eq!(report.expired, 1);
        assert_eq!(f.catalog.sold(&f.event_id, &f.standard).await, Some(4));
    }
}
