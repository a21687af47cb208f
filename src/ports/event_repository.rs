//! Event repository port (read side).
//!
//! Events are read-only to the booking core. Capacity and catalog changes
//! happen elsewhere.

use crate::domain::event::Event;
use crate::domain::foundation::{DomainError, EventId};
use async_trait::async_trait;

/// Repository port for loading events with their ticket catalog.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Find an event by its ID, including all ticket types.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, DomainError>;
}
