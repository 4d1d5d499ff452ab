//! # Hotel Desk RS
//!
//! Front-desk booking workflow server.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export DESK_BACKEND_URL=https://api.hotel.example/api/v1
//! export DESK_API_TOKEN=...
//! export DESK_HOTEL_ID=3
//! export MOMO_BASE_URL=https://momo.example/api
//! export MOMO_API_KEY=...
//! export MOMO_DESTINATION_ACCOUNT=...
//!
//! # Run the server
//! hotel-desk
//! ```

use desk_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Hotel: {} ({})", state.hotel.name, state.hotel.id);
    info!(
        "Payment provider: {}",
        state.collaborators.payments.provider_name()
    );
    info!(
        "Polling: conversion every {}s, payment every {}s",
        state.flow_config.polling.conversion_interval_secs,
        state.flow_config.polling.payment_interval_secs
    );

    tokio::spawn(state.clone().sweep_idle_sessions());

    let app = routes::create_router(state);

    info!("Hotel desk starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Open session: POST http://{}/api/v1/workflows", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Hotel Desk RS
  ━━━━━━━━━━━━━━━━━━━━━━━
  Front-desk booking workflow
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
