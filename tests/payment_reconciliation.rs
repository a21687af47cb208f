//! Integration tests for the payment bridge.
//!
//! Flow under test: reserve → create payment session → gateway notification.
//! The mock gateway stands in for the real one; verification re-queries it.

use std::sync::Arc;

use booking_service::adapters::memory::{InMemoryBookingRepository, InMemoryCatalog};
use booking_service::adapters::yookassa::MockPaymentGateway;
use booking_service::application::{
    BookingLifecycle, CreateBookingCommand, CreateBookingHandler, CreatePaymentSessionCommand,
    CreatePaymentSessionHandler, CreatePaymentSessionResult, ExpiryReaper,
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult,
};
use booking_service::domain::booking::{Booking, BookingStatus, TicketSelection};
use booking_service::domain::event::{Event, TicketType};
use booking_service::domain::foundation::{EventId, Money, TicketTypeId, Timestamp, UserId};
use booking_service::ports::{BookingRepository, GatewayPaymentStatus};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct World {
    catalog: InMemoryCatalog,
    bookings: InMemoryBookingRepository,
    gateway: MockPaymentGateway,
    lifecycle: Arc<BookingLifecycle>,
    event_id: EventId,
    ticket_type_id: TicketTypeId,
}

impl World {
    async fn new() -> Self {
        let tt = TicketType::new(TicketTypeId::new(), "Parterre", 20, Money::from_major(1500)).unwrap();
        let ticket_type_id = tt.id;
        let event = Event::new(EventId::new(), "Opera", Timestamp::now(), vec![tt]).unwrap();
        let event_id = event.id;
        let catalog = InMemoryCatalog::new();
        catalog.insert_event(event).await;
        let bookings = InMemoryBookingRepository::new();
        let lifecycle = Arc::new(BookingLifecycle::new(
            Arc::new(bookings.clone()),
            Arc::new(catalog.clone()),
        ));
        Self {
            catalog,
            bookings,
            gateway: MockPaymentGateway::new(),
            lifecycle,
            event_id,
            ticket_type_id,
        }
    }

    async fn reserve(&self, quantity: u32) -> Booking {
        CreateBookingHandler::new(
            Arc::new(self.catalog.clone()),
            Arc::new(self.catalog.clone()),
            Arc::new(self.bookings.clone()),
        )
        .handle(CreateBookingCommand {
            user_id: UserId::new("alice").unwrap(),
            event_id: self.event_id,
            tickets: vec![TicketSelection {
                ticket_type_id: self.ticket_type_id,
                quantity,
                seats: vec![],
            }],
        })
        .await
        .unwrap()
        .booking
    }

    async fn start_payment(&self, booking: &Booking) -> CreatePaymentSessionResult {
        CreatePaymentSessionHandler::new(
            Arc::new(self.bookings.clone()),
            Arc::clone(&self.lifecycle),
            Arc::new(self.gateway.clone()),
        )
        .handle(CreatePaymentSessionCommand {
            booking_id: booking.id,
            user_id: booking.user_id.clone(),
            return_url: "https://tickets.test/return".to_string(),
        })
        .await
        .unwrap()
    }

    fn reconciler(&self) -> ReconcilePaymentHandler {
        ReconcilePaymentHandler::new(
            Arc::new(self.bookings.clone()),
            Arc::clone(&self.lifecycle),
            Arc::new(self.gateway.clone()),
        )
    }

    async fn status(&self, booking: &Booking) -> BookingStatus {
        self.bookings
            .find_by_id(&booking.id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    async fn sold(&self) -> u32 {
        self.catalog
            .sold(&self.event_id, &self.ticket_type_id)
            .await
            .unwrap()
    }
}

fn notification(payment_id: &str, status: GatewayPaymentStatus) -> ReconcilePaymentCommand {
    ReconcilePaymentCommand {
        payment_reference: payment_id.to_string(),
        reported_status: status,
        reported_order_id: None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn scenario_e_redelivered_success_confirms_once() {
    let world = World::new().await;
    let booking = world.reserve(2).await;
    let session = world.start_payment(&booking).await;
    world
        .gateway
        .set_status(&session.payment_id, GatewayPaymentStatus::Succeeded);
    let reconciler = world.reconciler();

    let first = reconciler
        .handle(notification(&session.payment_id, GatewayPaymentStatus::Succeeded))
        .await
        .unwrap();
    let second = reconciler
        .handle(notification(&session.payment_id, GatewayPaymentStatus::Succeeded))
        .await
        .unwrap();

    assert_eq!(first, ReconcilePaymentResult::Confirmed);
    assert_eq!(second, ReconcilePaymentResult::Unchanged(BookingStatus::Confirmed));
    assert_eq!(world.status(&booking).await, BookingStatus::Confirmed);
    assert_eq!(world.sold().await, 2);
}

#[tokio::test]
async fn payment_session_sends_total_and_moves_to_pending() {
    let world = World::new().await;
    let booking = world.reserve(2).await;

    let session = world.start_payment(&booking).await;

    assert!(session.confirmation_url.starts_with("https://"));
    assert_eq!(world.status(&booking).await, BookingStatus::Pending);
    let call = &world.gateway.calls()[0];
    // 2 × 1500 = 3000, fee = max(300, 100) = 300
    assert_eq!(call.args[1], "3300.00");
}

#[tokio::test]
async fn canceled_payment_returns_inventory() {
    let world = World::new().await;
    let booking = world.reserve(3).await;
    let session = world.start_payment(&booking).await;
    world
        .gateway
        .set_status(&session.payment_id, GatewayPaymentStatus::Canceled);

    let result = world
        .reconciler()
        .handle(notification(&session.payment_id, GatewayPaymentStatus::Canceled))
        .await
        .unwrap();

    assert_eq!(result, ReconcilePaymentResult::Cancelled);
    assert_eq!(world.status(&booking).await, BookingStatus::Cancelled);
    assert_eq!(world.sold().await, 0);
}

#[tokio::test]
async fn forged_success_is_ignored_when_gateway_disagrees() {
    let world = World::new().await;
    let booking = world.reserve(1).await;
    let session = world.start_payment(&booking).await;

    let result = world
        .reconciler()
        .handle(notification(&session.payment_id, GatewayPaymentStatus::Succeeded))
        .await
        .unwrap();

    assert_eq!(result, ReconcilePaymentResult::AwaitingPayment);
    assert_eq!(world.status(&booking).await, BookingStatus::Pending);
}

#[tokio::test]
async fn abandoned_checkout_is_expired_by_reaper() {
    let world = World::new().await;
    let booking = world.reserve(4).await;
    world.start_payment(&booking).await;
    let reaper = ExpiryReaper::new(Arc::new(world.bookings.clone()), Arc::clone(&world.lifecycle));

    let report = reaper
        .sweep_once(booking.reserved_until.add_secs(1))
        .await
        .unwrap();

    assert_eq!(report.expired, 1);
    assert_eq!(world.status(&booking).await, BookingStatus::Expired);
    assert_eq!(world.sold().await, 0);
}

#[tokio::test]
async fn success_after_expiry_does_not_resurrect_booking() {
    let world = World::new().await;
    let booking = world.reserve(1).await;
    let session = world.start_payment(&booking).await;
    ExpiryReaper::new(Arc::new(world.bookings.clone()), Arc::clone(&world.lifecycle))
        .sweep_once(booking.reserved_until.add_secs(1))
        .await
        .unwrap();
    world
        .gateway
        .set_status(&session.payment_id, GatewayPaymentStatus::Succeeded);

    let result = world
        .reconciler()
        .handle(notification(&session.payment_id, GatewayPaymentStatus::Succeeded))
        .await
        .unwrap();

    assert_eq!(result, ReconcilePaymentResult::Unchanged(BookingStatus::Expired));
    assert_eq!(world.sold().await, 0);
}
