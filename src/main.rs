//! Booking service HTTP server.
//!
//! Wires Postgres adapters, the payment gateway and the expiry reaper, then
//! serves the REST API until Ctrl-C.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use booking_service::adapters::http::{app, BookingAppState};
use booking_service::adapters::{
    PostgresBookingRepository, PostgresEventRepository, PostgresTicketLedger, YooKassaConfig,
    YooKassaGateway,
};
use booking_service::application::{BookingLifecycle, ExpiryReaper, ReaperConfig};
use booking_service::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);
    info!(
        environment = ?config.server.environment,
        verify_notifications = config.payment.verify_notifications,
        currency = %config.payment.currency,
        "Starting booking service"
    );

    // Database
    let pool = config.database.connect().await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    // Adapters
    let events = Arc::new(PostgresEventRepository::new(pool.clone()));
    let ledger = Arc::new(PostgresTicketLedger::new(pool.clone()));
    let bookings = Arc::new(PostgresBookingRepository::new(pool));
    let gateway = Arc::new(YooKassaGateway::new(
        YooKassaConfig::new(config.payment.shop_id.clone(), config.payment.secret_key.clone())
            .with_base_url(config.payment.api_base_url.clone())
            .with_timeout(config.payment.request_timeout()),
    )?);

    // Application
    let store_timeout = config.reservation.store_timeout();
    let state = BookingAppState::new(events, ledger.clone(), bookings.clone(), gateway)
        .with_currency(config.payment.currency.clone())
        .with_store_timeout(store_timeout)
        .with_verification(config.payment.verify_notifications);

    let reaper = ExpiryReaper::with_config(
        bookings.clone(),
        Arc::new(BookingLifecycle::new(bookings, ledger).with_store_timeout(store_timeout)),
        ReaperConfig::default()
            .with_interval(config.reservation.reaper_interval())
            .with_batch_size(config.reservation.reaper_batch_size),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper_handle = tokio::spawn(async move { reaper.run(shutdown_rx).await });

    // HTTP
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app(state, config.server.request_timeout()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the reaper after its final sweep
    if shutdown_tx.send(true).is_err() {
        error!("expiry reaper exited before shutdown");
    }
    if let Err(e) = reaper_handle.await {
        error!(error = %e, "expiry reaper task failed");
    }

    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        // Without a signal handler the server keeps running until killed.
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
