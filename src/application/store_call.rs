//! Bounded calls into persistence ports.
//!
//! Every ledger and store call made by the application layer carries a
//! timeout. An elapsed timeout is reported like any other persistence
//! failure so callers compensate the same way.

use std::future::Future;
use std::time::Duration;

use crate::domain::booking::BookingError;
use crate::domain::foundation::DomainError;

/// Default timeout for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Awaits a port call with a timeout, converting errors to `BookingError`.
pub async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T, BookingError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(BookingError::from),
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "store call timed out");
            Err(BookingError::persistence(format!(
                "{} timed out after {}ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}
