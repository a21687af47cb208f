//! CreatePaymentSessionHandler - Command handler for starting checkout.
//!
//! Requests a redirect payment from the gateway for an open booking, then
//! attaches the returned payment reference and moves the booking to
//! Pending. The booking id doubles as the gateway idempotency key, so a
//! retried request reuses the same gateway payment.

use std::sync::Arc;

use crate::domain::booking::{BookingError, BookingStatus, Resource};
use crate::domain::foundation::{BookingId, Timestamp, UserId};
use crate::ports::{BookingRepository, CreatePaymentRequest, PaymentGateway};

use crate::application::booking_lifecycle::{BookingLifecycle, TransitionOutcome};
use crate::application::store_call::bounded;

/// Command to create a payment session for a booking.
#[derive(Debug, Clone)]
pub struct CreatePaymentSessionCommand {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub return_url: String,
}

/// Result of payment session creation.
#[derive(Debug, Clone)]
pub struct CreatePaymentSessionResult {
    pub booking_id: BookingId,
    pub payment_id: String,
    pub confirmation_url: String,
}

/// Handler for creating payment sessions.
pub struct CreatePaymentSessionHandler {
    bookings: Arc<dyn BookingRepository>,
    lifecycle: Arc<BookingLifecycle>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreatePaymentSessionHandler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        lifecycle: Arc<BookingLifecycle>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            bookings,
            lifecycle,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentSessionCommand,
    ) -> Result<CreatePaymentSessionResult, BookingError> {
        // 1. Validate input
        validate_return_url(&cmd.return_url)?;

        // 2. Load the caller's booking
        let booking = bounded(
            self.lifecycle.store_timeout(),
            "find booking",
            self.bookings.find_by_id_for_user(&cmd.booking_id, &cmd.user_id),
        )
        .await?
        .ok_or_else(|| BookingError::not_found(Resource::Booking, cmd.booking_id))?;

        // 3. Only a live hold can be paid for
        let now = Timestamp::now();
        if !booking.status.is_open() {
            return Err(BookingError::invalid_state(booking.status, "create payment session"));
        }
        if booking.is_reservation_elapsed(&now) {
            return Err(BookingError::invalid_state(
                BookingStatus::Expired,
                "create payment session",
            ));
        }

        // 4. Ask the gateway for a redirect payment
        let session = self
            .gateway
            .create_payment(CreatePaymentRequest {
                booking_id: booking.id,
                amount: booking.total,
                currency: booking.currency.clone(),
                description: format!("Booking {}", booking.id),
                return_url: cmd.return_url,
                idempotency_key: booking.id.to_string(),
            })
            .await
            .map_err(|e| {
                tracing::warn!(booking_id = %booking.id, error = %e, "payment creation failed");
                BookingError::from(e)
            })?;

        // 5. Attach the reference and move to Pending
        match self
            .lifecycle
            .attach_payment(booking.id, &session.id, Timestamp::now())
            .await?
        {
            TransitionOutcome::Applied(_) => {}
            TransitionOutcome::Rejected(current) => {
                tracing::warn!(
                    booking_id = %booking.id,
                    payment_id = %session.id,
                    status = %current.status,
                    "booking left the open state while the payment was created"
                );
                return Err(BookingError::invalid_state(current.status, "create payment session"));
            }
        }

        tracing::info!(
            booking_id = %booking.id,
            payment_id = %session.id,
            amount = %booking.total,
            "payment session created"
        );

        Ok(CreatePaymentSessionResult {
            booking_id: booking.id,
            payment_id: session.id,
            confirmation_url: session.confirmation_url,
        })
    }
}

fn validate_return_url(url: &str) -> Result<(), BookingError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(BookingError::validation("return_url", "return_url cannot be empty"));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(BookingError::validation(
            "return_url",
            "return_url must be an absolute http(s) URL",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBookingRepository, InMemoryCatalog};
    use crate::adapters::yookassa::MockPaymentGateway;
    use crate::domain::booking::{Booking, BookingLine};
    use crate::domain::foundation::{ErrorCode, EventId, Money, TicketTypeId};
    use crate::ports::PaymentError;

    struct Fixture {
        bookings: InMemoryBookingRepository,
        gateway: MockPaymentGateway,
        handler: CreatePaymentSessionHandler,
    }

    fn fixture() -> Fixture {
        let bookings = InMemoryBookingRepository::new();
        let gateway = MockPaymentGateway::new();
        let lifecycle = Arc::new(BookingLifecycle::new(
            Arc::new(bookings.clone()),
            Arc::new(InMemoryCatalog::new()),
        ));
        Fixture {
            handler: CreatePaymentSessionHandler::new(
                Arc::new(bookings.clone()),
                lifecycle,
                Arc::new(gateway.clone()),
            ),
            bookings,
            gateway,
        }
    }

    async fn stored(f: &Fixture, reserved_at: Timestamp) -> Booking {
        let line = BookingLine {
            ticket_type_id: TicketTypeId::new(),
            ticket_type_name: "Standard".to_string(),
            unit_price: Money::from_major(30),
            quantity: 1,
            line_total: Money::from_major(30),
            seats: vec![],
        };
        let booking = Booking::reserve(
            BookingId::new(),
            UserId::new("alice").unwrap(),
            EventId::new(),
            vec![line],
            "RUB",
            reserved_at,
        );
        f.bookings.put(booking.clone()).await;
        booking
    }

    fn command(booking: &Booking) -> CreatePaymentSessionCommand {
        CreatePaymentSessionCommand {
            booking_id: booking.id,
            user_id: booking.user_id.clone(),
            return_url: "https://shop.test/bookings/done".to_string(),
        }
    }

    async fn reload(f: &Fixture, id: &BookingId) -> Booking {
        crate::ports::BookingRepository::find_by_id(&f.bookings, id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn creates_session_and_moves_booking_to_pending() {
        let f = fixture();
        let booking = stored(&f, Timestamp::now()).await;

        let result = f.handler.handle(command(&booking)).await.unwrap();

        assert!(result.confirmation_url.contains(&result.payment_id));
        let stored = reload(&f, &booking.id).await;
        assert_eq!(stored.status, BookingStatus::Pending);
        assert_eq!(stored.payment_reference.as_deref(), Some(result.payment_id.as_str()));

        let calls = f.gateway.calls();
        assert_eq!(calls[0].args[1], "80.00");
        assert_eq!(calls[0].args[2], "RUB");
    }

    #[tokio::test]
    async fn repeated_request_reuses_gateway_payment() {
        let f = fixture();
        let booking = stored(&f, Timestamp::now()).await;

        let first = f.handler.handle(command(&booking)).await.unwrap();
        let second = f.handler.handle(command(&booking)).await.unwrap();

        assert_eq!(first.payment_id, second.payment_id);
        assert_eq!(reload(&f, &booking.id).await.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn terminal_booking_is_invalid_state() {
        let f = fixture();
        let mut booking = stored(&f, Timestamp::now()).await;
        booking.status = BookingStatus::Cancelled;
        f.bookings.put(booking.clone()).await;

        let err = f.handler.handle(command(&booking)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert_eq!(f.gateway.call_count("create_payment"), 0);
    }

    #[tokio::test]
    async fn elapsed_hold_is_refused_before_gateway_call() {
        let f = fixture();
        let booking = stored(&f, Timestamp::now().add_minutes(-20)).await;

        let err = f.handler.handle(command(&booking)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert_eq!(f.gateway.call_count("create_payment"), 0);
        assert_eq!(reload(&f, &booking.id).await.status, BookingStatus::Reserved);
    }

    #[tokio::test]
    async fn gateway_failure_leaves_booking_unchanged() {
        let f = fixture();
        let booking = stored(&f, Timestamp::now()).await;
        f.gateway
            .set_method_error("create_payment", PaymentError::network("connection reset"));

        let err = f.handler.handle(command(&booking)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ExternalServiceError);
        let stored = reload(&f, &booking.id).await;
        assert_eq!(stored.status, BookingStatus::Reserved);
        assert!(stored.payment_reference.is_none());
    }

    #[tokio::test]
    async fn other_users_booking_is_not_found() {
        let f = fixture();
        let booking = stored(&f, Timestamp::now()).await;
        let mut cmd = command(&booking);
        cmd.user_id = UserId::new("mallory").unwrap();

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::BookingNotFound);
    }

    #[tokio::test]
    async fn relative_return_url_is_rejected() {
        let f = fixture();
        let booking = stored(&f, Timestamp::now()).await;
        let mut cmd = command(&booking);
        cmd.return_url = "/done".to_string();

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, BookingError::ValidationFailed { ref field, .. } if field == "return_url"));
    }
}
