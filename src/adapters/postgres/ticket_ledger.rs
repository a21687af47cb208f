//! PostgreSQL implementation of TicketLedger.
//!
//! Every operation is a single conditional `UPDATE` on one `ticket_types`
//! row. Postgres serializes concurrent updates of the same row, so the
//! capacity predicate is evaluated against the latest committed `sold`.

use crate::domain::foundation::{DomainError, ErrorCode, EventId, TicketTypeId};
use crate::ports::TicketLedger;
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL implementation of the TicketLedger port.
pub struct PostgresTicketLedger {
    pool: PgPool,
}

impl PostgresTicketLedger {
    /// Creates a new PostgresTicketLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn quantity_param(quantity: u32) -> Result<i32, DomainError> {
    i32::try_from(quantity)
        .map_err(|_| DomainError::validation("quantity", format!("quantity {} is too large", quantity)))
}

#[async_trait]
impl TicketLedger for PostgresTicketLedger {
    async fn reserve(
        &self,
        event_id: &EventId,
        ticket_type_id: &TicketTypeId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        let qty = quantity_param(quantity)?;

        let result = sqlx::query(
            r#"
            UPDATE ticket_types
            SET sold = sold + $3
            WHERE event_id = $1 AND id = $2 AND sold + $3 <= capacity
            "#,
        )
        .bind(event_id.as_uuid())
        .bind(ticket_type_id.as_uuid())
        .bind(qty)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to reserve tickets: {}", e)))?;

        if result.rows_affected() == 0 {
            tracing::debug!(%event_id, %ticket_type_id, quantity, "reserve rejected");
            return Err(DomainError::new(ErrorCode::SoldOut, "Not enough tickets left")
                .with_detail("ticket_type_id", ticket_type_id.to_string()));
        }

        tracing::debug!(%event_id, %ticket_type_id, quantity, "tickets reserved");
        Ok(())
    }

    async fn release(
        &self,
        event_id: &EventId,
        ticket_type_id: &TicketTypeId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        let qty = quantity_param(quantity)?;

        let result = sqlx::query(
            r#"
            UPDATE ticket_types
            SET sold = GREATEST(sold - $3, 0)
            WHERE event_id = $1 AND id = $2
            "#,
        )
        .bind(event_id.as_uuid())
        .bind(ticket_type_id.as_uuid())
        .bind(qty)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to release tickets: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::TicketTypeNotFound,
                "Ticket type to release does not exist",
            )
            .with_detail("id", ticket_type_id.to_string()));
        }

        tracing::debug!(%event_id, %ticket_type_id, quantity, "tickets released");
        Ok(())
    }

    async fn confirm(
        &self,
        event_id: &EventId,
        ticket_type_id: &TicketTypeId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        // Single counter: the reserved units already count as sold.
        tracing::debug!(%event_id, %ticket_type_id, quantity, "tickets confirmed");
        Ok(())
    }
}
