//! Payment handlers.
//!
//! - Creating a gateway payment session for an open booking
//! - Reconciling gateway-reported payment status into the booking lifecycle

mod create_payment_session;
mod reconcile_payment;

pub use create_payment_session::{
    CreatePaymentSessionCommand, CreatePaymentSessionHandler, CreatePaymentSessionResult,
};
pub use reconcile_payment::{ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult};
