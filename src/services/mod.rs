// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod billing;
pub mod google_oauth;
pub mod password;
pub mod session;
pub mod stripe;

pub use billing::{BillingService, SubscriptionOutcome, SubscriptionRequest};
pub use google_oauth::{GoogleOAuthClient, GoogleProfile, OAuthError};
pub use session::{SessionManager, SessionStore};
pub use stripe::{PaymentError, PaymentProvider, StripeClient};
