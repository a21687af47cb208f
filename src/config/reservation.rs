//! Reservation housekeeping configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Reaper and store-call settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationConfig {
    /// Seconds between expiry sweeps
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_secs: u64,

    /// Maximum bookings examined per sweep
    #[serde(default = "default_reaper_batch_size")]
    pub reaper_batch_size: u32,

    /// Timeout for a single ledger or booking store call, in seconds
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,
}

impl ReservationConfig {
    /// Get reaper interval as Duration
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }

    /// Get store call timeout as Duration
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Validate reservation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Holds last 15 minutes; sweeping less often than that strands inventory.
        if self.reaper_interval_secs == 0 || self.reaper_interval_secs > 900 {
            return Err(ValidationError::InvalidReaperInterval);
        }
        if self.reaper_batch_size == 0 || self.reaper_batch_size > 10_000 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.store_timeout_secs == 0 || self.store_timeout_secs > 60 {
            return Err(ValidationError::InvalidStoreTimeout);
        }
        Ok(())
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            reaper_interval_secs: default_reaper_interval(),
            reaper_batch_size: default_reaper_batch_size(),
            store_timeout_secs: default_store_timeout(),
        }
    }
}

fn default_reaper_interval() -> u64 {
    60
}

fn default_reaper_batch_size() -> u32 {
    100
}

fn default_store_timeout() -> u64 {
    5
}
