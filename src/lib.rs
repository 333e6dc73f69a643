// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Narrisia.AI: account and billing backend for the executive assistant app
//!
//! This crate provides the HTTP API behind the web client: email/password
//! and Google sign-in, cookie sessions and bearer tokens, profile management
//! and Stripe checkout.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DynUserStore;
use services::{BillingService, GoogleOAuthClient, PaymentProvider, SessionManager};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: DynUserStore,
    pub sessions: SessionManager,
    /// Present only when Google credentials are configured
    pub google: Option<GoogleOAuthClient>,
    pub billing: BillingService,
    pub started_at: Instant,
}

impl AppState {
    /// Wire up services around the selected store and payment provider.
    pub fn new(config: Config, users: DynUserStore, payments: Arc<dyn PaymentProvider>) -> Self {
        let sessions = SessionManager::new(&config.session_secret, config.environment);
        let google = config.google.as_ref().map(GoogleOAuthClient::new);
        let billing = BillingService::new(payments, users.clone());

        Self {
            config,
            users,
            sessions,
            google,
            billing,
            started_at: Instant::now(),
        }
    }
}
