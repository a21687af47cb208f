//! Booking-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed | 400 |
//! | NotFound | 404 |
//! | SoldOut | 409 |
//! | InvalidTransition | 409 |
//! | InvalidState | 409 |
//! | Gateway | 502 |
//! | Persistence | 500 |
//! | CompensationFailed | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

use super::BookingStatus;

/// Kind of entity that could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Event,
    TicketType,
    Booking,
    Payment,
}

impl Resource {
    fn label(&self) -> &'static str {
        match self {
            Resource::Event => "Event",
            Resource::TicketType => "Ticket type",
            Resource::Booking => "Booking",
            Resource::Payment => "Payment",
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Resource::Event => ErrorCode::EventNotFound,
            Resource::TicketType => ErrorCode::TicketTypeNotFound,
            Resource::Booking => ErrorCode::BookingNotFound,
            Resource::Payment => ErrorCode::PaymentNotFound,
        }
    }

    fn from_code(code: ErrorCode) -> Option<Self> {
        match code {
            ErrorCode::EventNotFound => Some(Resource::Event),
            ErrorCode::TicketTypeNotFound => Some(Resource::TicketType),
            ErrorCode::BookingNotFound | ErrorCode::NotFound => Some(Resource::Booking),
            ErrorCode::PaymentNotFound => Some(Resource::Payment),
            _ => None,
        }
    }
}

/// Booking-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Malformed input. Nothing was changed.
    ValidationFailed { field: String, message: String },

    /// Event, ticket type, booking or payment reference is absent.
    NotFound { resource: Resource, id: String },

    /// Capacity of a ticket type is exhausted.
    SoldOut { ticket_type_id: String },

    /// Illegal state change (terminal booking, elapsed hold, lost race).
    InvalidTransition { current: String, attempted: String },

    /// Operation not allowed in the booking's current state.
    InvalidState { current: String, operation: String },

    /// Store unavailable, timed out or rejected the write.
    Persistence(String),

    /// Payment gateway call failed or returned an unexpected shape.
    Gateway(String),

    /// Releasing held inventory failed during compensation.
    CompensationFailed(String),
}

impl BookingError {
    // Constructor functions for cleaner error creation

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BookingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: Resource, id: impl ToString) -> Self {
        BookingError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn sold_out(ticket_type_id: impl ToString) -> Self {
        BookingError::SoldOut {
            ticket_type_id: ticket_type_id.to_string(),
        }
    }

    pub fn invalid_transition(current: BookingStatus, attempted: BookingStatus) -> Self {
        BookingError::InvalidTransition {
            current: current.to_string(),
            attempted: attempted.to_string(),
        }
    }

    pub fn invalid_state(current: BookingStatus, operation: impl Into<String>) -> Self {
        BookingError::InvalidState {
            current: current.to_string(),
            operation: operation.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        BookingError::Persistence(message.into())
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        BookingError::Gateway(message.into())
    }

    pub fn compensation_failed(message: impl Into<String>) -> Self {
        BookingError::CompensationFailed(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BookingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BookingError::NotFound { resource, .. } => resource.code(),
            BookingError::SoldOut { .. } => ErrorCode::SoldOut,
            BookingError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            BookingError::InvalidState { .. } => ErrorCode::InvalidState,
            BookingError::Persistence(_) => ErrorCode::DatabaseError,
            BookingError::Gateway(_) => ErrorCode::ExternalServiceError,
            BookingError::CompensationFailed(_) => ErrorCode::InventoryInconsistency,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            BookingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BookingError::NotFound { resource, id } => {
                format!("{} not found: {}", resource.label(), id)
            }
            BookingError::SoldOut { ticket_type_id } => {
                format!("Not enough tickets left for ticket type {}", ticket_type_id)
            }
            BookingError::InvalidTransition { current, attempted } => {
                format!("Cannot move booking from {} to {}", current, attempted)
            }
            BookingError::InvalidState { current, operation } => {
                format!("Cannot {} a booking in {} state", operation, current)
            }
            BookingError::Persistence(msg) => format!("Storage error: {}", msg),
            BookingError::Gateway(msg) => format!("Payment gateway error: {}", msg),
            BookingError::CompensationFailed(msg) => {
                format!("Inventory inconsistency: {}", msg)
            }
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Persistence(_) | BookingError::Gateway(_))
    }
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BookingError {}

impl From<ValidationError> for BookingError {
    fn from(err: ValidationError) -> Self {
        BookingError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for BookingError {
    fn from(err: DomainError) -> Self {
        let detail = |key: &str| {
            err.details
                .get(key)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string())
        };
        if let Some(resource) = Resource::from_code(err.code) {
            return BookingError::NotFound {
                resource,
                id: detail("id"),
            };
        }
        match err.code {
            ErrorCode::ValidationFailed => BookingError::ValidationFailed {
                field: detail("field"),
                message: err.message.clone(),
            },
            ErrorCode::SoldOut => BookingError::SoldOut {
                ticket_type_id: detail("ticket_type_id"),
            },
            ErrorCode::InvalidStateTransition => BookingError::InvalidTransition {
                current: detail("current"),
                attempted: err.message.clone(),
            },
            ErrorCode::InvalidState => BookingError::InvalidState {
                current: detail("current"),
                operation: err.message.clone(),
            },
            ErrorCode::ExternalServiceError => BookingError::Gateway(err.message.clone()),
            ErrorCode::InventoryInconsistency => {
                BookingError::CompensationFailed(err.message.clone())
            }
            _ => BookingError::Persistence(err.to_string()),
        }
    }
}

impl From<BookingError> for DomainError {
    fn from(err: BookingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
