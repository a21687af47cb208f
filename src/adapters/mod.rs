//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum REST API
//! - `memory` - In-memory catalog, ledger and booking store (tests, local runs)
//! - `postgres` - PostgreSQL ledger, catalog and booking store
//! - `yookassa` - Payment gateway client and mock

pub mod http;
pub mod memory;
pub mod postgres;
pub mod yookassa;

pub use memory::{InMemoryBookingRepository, InMemoryCatalog};
pub use postgres::{PostgresBookingRepository, PostgresEventRepository, PostgresTicketLedger};
pub use yookassa::{MockPaymentGateway, YooKassaConfig, YooKassaGateway};
