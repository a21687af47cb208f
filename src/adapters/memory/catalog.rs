//! In-Memory Catalog Adapter
//!
//! Holds events in memory and implements both the event repository and
//! the ticket ledger over the same data, so reads observe ledger changes.
//! Each ledger call takes the write lock once, which gives it the same
//! check-and-increment atomicity as the Postgres conditional update.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::event::{Event, TicketType};
use crate::domain::foundation::{DomainError, ErrorCode, EventId, Money, TicketTypeId};
use crate::ports::{EventRepository, TicketLedger};

/// In-memory event catalog and ticket ledger
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    events: Arc<RwLock<HashMap<EventId, Event>>>,
    fail_releases: Arc<AtomicBool>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an event
    pub async fn insert_event(&self, event: Event) {
        self.events.write().await.insert(event.id, event);
    }

    /// Current sold count of a ticket type
    pub async fn sold(&self, event_id: &EventId, ticket_type_id: &TicketTypeId) -> Option<u32> {
        let events = self.events.read().await;
        events
            .get(event_id)
            .and_then(|e| e.ticket_type(ticket_type_id))
            .map(|tt| tt.sold)
    }

    /// Change a catalog price (bookings keep their snapshot)
    pub async fn set_price(&self, event_id: &EventId, ticket_type_id: &TicketTypeId, price: Money) {
        let mut events = self.events.write().await;
        if let Some(tt) = events
            .get_mut(event_id)
            .and_then(|e| find_mut(e, ticket_type_id))
        {
            tt.price = price;
        }
    }

    /// Make every subsequent release fail (useful for tests)
    pub fn set_fail_releases(&self, fail: bool) {
        self.fail_releases.store(fail, Ordering::SeqCst);
    }
}

fn find_mut<'a>(event: &'a mut Event, id: &TicketTypeId) -> Option<&'a mut TicketType> {
    event.ticket_types.iter_mut().find(|tt| &tt.id == id)
}

#[async_trait]
impl EventRepository for InMemoryCatalog {
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, DomainError> {
        Ok(self.events.read().await.get(id).cloned())
    }
}

#[async_trait]
impl TicketLedger for InMemoryCatalog {
    async fn reserve(
        &self,
        event_id: &EventId,
        ticket_type_id: &TicketTypeId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        let mut events = self.events.write().await;
        let sold_out = || {
            DomainError::new(ErrorCode::SoldOut, "Not enough tickets left")
                .with_detail("ticket_type_id", ticket_type_id.to_string())
        };
        let tt = events
            .get_mut(event_id)
            .and_then(|e| find_mut(e, ticket_type_id))
            .ok_or_else(sold_out)?;

        match tt.sold.checked_add(quantity) {
            Some(next) if next <= tt.capacity => {
                tt.sold = next;
                Ok(())
            }
            _ => Err(sold_out()),
        }
    }

    async fn release(
        &self,
        event_id: &EventId,
        ticket_type_id: &TicketTypeId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        if self.fail_releases.load(Ordering::SeqCst) {
            return Err(DomainError::database("release failed (injected)"));
        }
        let mut events = self.events.write().await;
        let tt = events
            .get_mut(event_id)
            .and_then(|e| find_mut(e, ticket_type_id))
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TicketTypeNotFound, "Ticket type to release does not exist")
                    .with_detail("id", ticket_type_id.to_string())
            })?;
        tt.sold = tt.sold.saturating_sub(quantity);
        Ok(())
    }

    async fn confirm(
        &self,
        _event_id: &EventId,
        _ticket_type_id: &TicketTypeId,
        _quantity: u32,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}
