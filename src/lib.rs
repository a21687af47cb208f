//! Booking Service - Ticket reservations without oversell
//!
//! This crate holds ticket inventory for a limited time, prices bookings,
//! hands checkout to a payment gateway and reconciles the gateway's answer
//! back into each booking. Every inventory mutation is a conditional update,
//! and every multi-step operation compensates on failure.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
