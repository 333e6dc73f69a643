// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Narrisia.AI API Server
//!
//! Serves account, session and billing endpoints for the web client.

use narrisia_api::{
    config::Config, db::connect_user_store, services::StripeClient, AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are swept.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    tracing::info!(
        port = config.port,
        production = config.environment.is_production(),
        "Starting Narrisia.AI API"
    );

    if config.google.is_none() {
        tracing::warn!("Google OAuth credentials not set, Google sign-in disabled");
    }

    // Select the user store once for the process lifetime
    let users = connect_user_store(&config).await;
    tracing::info!(backend = users.backend_name(), "User store ready");

    let payments = Arc::new(StripeClient::new(config.stripe_secret_key.clone()));

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), users, payments));

    spawn_session_purge(state.clone());

    // Build router
    let app = narrisia_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drop expired sessions.
fn spawn_session_purge(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state.sessions.store.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Purged expired sessions");
            }
        }
    });
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("narrisia_api=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
