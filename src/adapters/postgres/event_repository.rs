//! PostgreSQL implementation of EventRepository.

use crate::domain::event::{Event, TicketType};
use crate::domain::foundation::{DomainError, ErrorCode, EventId, Money, TicketTypeId, Timestamp};
use crate::ports::EventRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the EventRepository port.
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Creates a new PostgresEventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    date: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct TicketTypeRow {
    id: Uuid,
    name: String,
    capacity: i32,
    sold: i32,
    price_minor: i64,
}

impl TryFrom<TicketTypeRow> for TicketType {
    type Error = DomainError;

    fn try_from(row: TicketTypeRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, value: i32| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid {} value for ticket type {}: {}", field, row.id, value),
            )
        };
        Ok(TicketType {
            id: TicketTypeId::from_uuid(row.id),
            name: row.name.clone(),
            capacity: u32::try_from(row.capacity).map_err(|_| corrupt("capacity", row.capacity))?,
            sold: u32::try_from(row.sold).map_err(|_| corrupt("sold", row.sold))?,
            price: Money::from_minor(row.price_minor),
        })
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, DomainError> {
        let event: Option<EventRow> = sqlx::query_as(
            r#"
            SELECT id, name, date FROM events WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load event: {}", e)))?;

        let Some(event) = event else {
            return Ok(None);
        };

        let rows: Vec<TicketTypeRow> = sqlx::query_as(
            r#"
            SELECT id, name, capacity, sold, price_minor
            FROM ticket_types
            WHERE event_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(event.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load ticket types: {}", e)))?;

        let ticket_types = rows
            .into_iter()
            .map(TicketType::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Event {
            id: EventId::from_uuid(event.id),
            name: event.name,
            date: Timestamp::from_datetime(event.date),
            ticket_types,
        }))
    }
}
