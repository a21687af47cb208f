//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, money, errors)
//! - `event` - Event catalog and ticket types
//! - `booking` - Booking lifecycle, pricing and guarded status transitions

pub mod booking;
pub mod event;
pub mod foundation;
