//! ReconcilePaymentHandler - Drives gateway payment status into bookings.
//!
//! Gateway notifications can be redelivered any number of times. A
//! notification for a booking that is already settled is acknowledged
//! without an error, and the guarded transitions guarantee the booking
//! changes state at most once.

use std::sync::Arc;

use crate::domain::booking::{BookingError, BookingStatus, Resource};
use crate::domain::foundation::Timestamp;
use crate::ports::{BookingRepository, GatewayPaymentStatus, PaymentGateway, PaymentOutcome};

use crate::application::booking_lifecycle::BookingLifecycle;
use crate::application::handlers::booking::{ConfirmBookingCommand, ConfirmBookingHandler};
use crate::application::store_call::bounded;

/// Command to reconcile a gateway-reported payment status.
#[derive(Debug, Clone)]
pub struct ReconcilePaymentCommand {
    pub payment_reference: String,
    pub reported_status: GatewayPaymentStatus,
    /// Booking id the notification claims the payment belongs to.
    pub reported_order_id: Option<String>,
}

/// Result of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePaymentResult {
    /// Payment succeeded and the booking was confirmed.
    Confirmed,
    /// Payment was canceled and the booking was cancelled.
    Cancelled,
    /// The booking was already settled or the guard rejected the change.
    Unchanged(BookingStatus),
    /// Payment is still in flight; nothing to do yet.
    AwaitingPayment,
}

/// Handler for reconciling payment status.
pub struct ReconcilePaymentHandler {
    bookings: Arc<dyn BookingRepository>,
    lifecycle: Arc<BookingLifecycle>,
    confirm: ConfirmBookingHandler,
    gateway: Arc<dyn PaymentGateway>,
    verify_notifications: bool,
}

impl ReconcilePaymentHandler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        lifecycle: Arc<BookingLifecycle>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            bookings,
            confirm: ConfirmBookingHandler::new(Arc::clone(&lifecycle)),
            lifecycle,
            gateway,
            verify_notifications: true,
        }
    }

    /// When enabled, the reported status and order id are replaced by the
    /// gateway's own answer for the payment.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_notifications = verify;
        self
    }

    pub async fn handle(
        &self,
        cmd: ReconcilePaymentCommand,
    ) -> Result<ReconcilePaymentResult, BookingError> {
        // 1. Find the booking
        let booking = bounded(
            self.lifecycle.store_timeout(),
            "find booking by payment",
            self.bookings.find_by_payment_reference(&cmd.payment_reference),
        )
        .await?
        .ok_or_else(|| BookingError::not_found(Resource::Payment, &cmd.payment_reference))?;

        if !booking.status.is_open() {
            tracing::debug!(
                booking_id = %booking.id,
                payment_id = %cmd.payment_reference,
                status = %booking.status,
                "notification for settled booking acknowledged"
            );
            return Ok(ReconcilePaymentResult::Unchanged(booking.status));
        }

        // 2. Determine the authoritative status and order
        let (status, order_id) = if self.verify_notifications {
            let snapshot = self
                .gateway
                .get_payment(&cmd.payment_reference)
                .await
                .map_err(BookingError::from)?;
            if snapshot.status != cmd.reported_status {
                tracing::info!(
                    payment_id = %cmd.payment_reference,
                    reported = %cmd.reported_status,
                    actual = %snapshot.status,
                    "reported payment status superseded by gateway"
                );
            }
            (snapshot.status, snapshot.order_id)
        } else {
            (cmd.reported_status, cmd.reported_order_id.clone())
        };

        if let Some(order_id) = order_id.as_deref() {
            if order_id != booking.id.to_string() {
                tracing::warn!(
                    booking_id = %booking.id,
                    payment_id = %cmd.payment_reference,
                    order_id,
                    "payment belongs to a different booking"
                );
                return Err(BookingError::gateway(format!(
                    "Payment {} is bound to order {}, not booking {}",
                    cmd.payment_reference, order_id, booking.id
                )));
            }
        }

        // 3. Drive the state machine
        let now = Timestamp::now();
        let outcome = match status.outcome() {
            PaymentOutcome::InFlight => return Ok(ReconcilePaymentResult::AwaitingPayment),
            PaymentOutcome::Paid => self
                .confirm
                .handle(ConfirmBookingCommand {
                    booking_id: booking.id,
                })
                .await
                .map(|_| ReconcilePaymentResult::Confirmed),
            PaymentOutcome::Failed => self
                .lifecycle
                .cancel(booking.id, now)
                .await
                .map(|_| ReconcilePaymentResult::Cancelled),
        };

        match outcome {
            Ok(result) => {
                tracing::info!(
                    booking_id = %booking.id,
                    payment_id = %cmd.payment_reference,
                    status = %status,
                    "payment reconciled"
                );
                Ok(result)
            }
            Err(BookingError::InvalidTransition { current, attempted }) => {
                if status.outcome() == PaymentOutcome::Paid && current == BookingStatus::Expired.as_str() {
                    tracing::warn!(
                        alert = "late_payment",
                        booking_id = %booking.id,
                        payment_id = %cmd.payment_reference,
                        "payment succeeded after the reservation elapsed"
                    );
                } else {
                    tracing::debug!(
                        booking_id = %booking.id,
                        current = %current,
                        attempted = %attempted,
                        "redelivered notification ignored"
                    );
                }
                let current = self.lifecycle.load(&booking.id).await?;
                Ok(ReconcilePaymentResult::Unchanged(current.status))
            }
            Err(e) => Err(e),
        }
    }
}
