//! Ticket ledger port.
//!
//! Owns the per-ticket-type `sold` counters. Every operation is a single
//! conditional update against the backing store; implementations must not
//! read and then write.
//!
//! # Example
//!
//! ```ignore
//! ledger.reserve(&event_id, &ticket_type_id, 2).await?;
//! // ...booking persistence failed
//! ledger.release(&event_id, &ticket_type_id, 2).await?;
//! ```

use crate::domain::foundation::{DomainError, EventId, TicketTypeId};
use async_trait::async_trait;

/// Port for atomic inventory counters.
#[async_trait]
pub trait TicketLedger: Send + Sync {
    /// Increments `sold` by `quantity` only if the result stays within
    /// capacity.
    ///
    /// # Errors
    ///
    /// - `SoldOut` if capacity would be exceeded or the ticket type does
    ///   not exist for the event
    /// - `DatabaseError` on store failure
    async fn reserve(
        &self,
        event_id: &EventId,
        ticket_type_id: &TicketTypeId,
        quantity: u32,
    ) -> Result<(), DomainError>;

    /// Decrements `sold` by `quantity`, floored at zero.
    ///
    /// Callers invoke this exactly once per quantity they reserved.
    async fn release(
        &self,
        event_id: &EventId,
        ticket_type_id: &TicketTypeId,
        quantity: u32,
    ) -> Result<(), DomainError>;

    /// Marks a reserved quantity as permanently sold.
    ///
    /// With a single `sold` counter this changes nothing; it is invoked
    /// once per line when a booking is confirmed.
    async fn confirm(
        &self,
        event_id: &EventId,
        ticket_type_id: &TicketTypeId,
        quantity: u32,
    ) -> Result<(), DomainError>;
}
