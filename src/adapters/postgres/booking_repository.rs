//! PostgreSQL implementation of BookingRepository.
//!
//! Booking lines are stored as a JSONB snapshot. Status changes are a
//! single guarded `UPDATE`, so the status check and write cannot be
//! interleaved with a competing transition.

use crate::domain::booking::{Booking, BookingLine, BookingStatus, DeadlineGuard, StatusTransition};
use crate::domain::foundation::{
    BookingId, DomainError, ErrorCode, EventId, Money, Timestamp, UserId,
};
use crate::ports::BookingRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the BookingRepository port.
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// Creates a new PostgresBookingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_BOOKING: &str = r#"
    SELECT id, user_id, event_id, status, lines, subtotal_minor, service_fee_minor,
           total_minor, currency, reserved_until, payment_reference, created_at, updated_at
    FROM bookings
"#;

/// Database row representation of a booking.
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: String,
    event_id: Uuid,
    status: String,
    lines: Json<Vec<BookingLine>>,
    subtotal_minor: i64,
    service_fee_minor: i64,
    total_minor: i64,
    currency: String,
    reserved_until: DateTime<Utc>,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DomainError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row.status.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid status value: {}", e))
        })?;
        let user_id = UserId::new(row.user_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
        })?;

        Ok(Booking {
            id: BookingId::from_uuid(row.id),
            user_id,
            event_id: EventId::from_uuid(row.event_id),
            status,
            lines: row.lines.0,
            subtotal: Money::from_minor(row.subtotal_minor),
            service_fee: Money::from_minor(row.service_fee_minor),
            total: Money::from_minor(row.total_minor),
            currency: row.currency,
            reserved_until: Timestamp::from_datetime(row.reserved_until),
            payment_reference: row.payment_reference,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn deadline_clause(guard: DeadlineGuard) -> &'static str {
    match guard {
        DeadlineGuard::Any => "",
        DeadlineGuard::NotElapsed => "AND reserved_until > $4",
        DeadlineGuard::Elapsed => "AND reserved_until <= $4",
    }
}

fn status_params(statuses: &[BookingStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn save(&self, booking: &Booking) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, event_id, status, lines, subtotal_minor, service_fee_minor,
                total_minor, currency, reserved_until, payment_reference, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_str())
        .bind(booking.event_id.as_uuid())
        .bind(booking.status.as_str())
        .bind(Json(&booking.lines))
        .bind(booking.subtotal.minor())
        .bind(booking.service_fee.minor())
        .bind(booking.total.minor())
        .bind(&booking.currency)
        .bind(booking.reserved_until.as_datetime())
        .bind(&booking.payment_reference)
        .bind(booking.created_at.as_datetime())
        .bind(booking.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save booking: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_BOOKING))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find booking: {}", e)))?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_by_id_for_user(
        &self,
        id: &BookingId,
        user_id: &UserId,
    ) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("{} WHERE id = $1 AND user_id = $2", SELECT_BOOKING))
                .bind(id.as_uuid())
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find booking: {}", e)))?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("{} WHERE payment_reference = $1", SELECT_BOOKING))
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find booking by payment: {}", e))
                })?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_expired_reservations(
        &self,
        now: &Timestamp,
        limit: u32,
    ) -> Result<Vec<Booking>, DomainError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "{} WHERE status = ANY($1) AND reserved_until < $2 ORDER BY reserved_until LIMIT $3",
            SELECT_BOOKING
        ))
        .bind(status_params(&BookingStatus::OPEN))
        .bind(now.as_datetime())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find expired bookings: {}", e)))?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn transition_status(&self, transition: &StatusTransition) -> Result<bool, DomainError> {
        let sql = format!(
            r#"
            UPDATE bookings
            SET status = $2,
                payment_reference = COALESCE($3, payment_reference),
                updated_at = $4
            WHERE id = $1 AND status = ANY($5) {}
            "#,
            deadline_clause(transition.deadline)
        );

        let result = sqlx::query(&sql)
            .bind(transition.booking_id.as_uuid())
            .bind(transition.to.as_str())
            .bind(&transition.payment_reference)
            .bind(transition.at.as_datetime())
            .bind(status_params(&transition.from))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to update booking status: {}", e))
            })?;

        Ok(result.rows_affected() == 1)
    }
}
