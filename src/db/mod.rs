// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store.
//!
//! A single [`UserStore`] implementation is chosen at startup by
//! [`connect_user_store`] and used for the lifetime of the process.

pub mod memory;
pub mod mongo;

pub use memory::MemoryUserStore;
pub use mongo::MongoUserStore;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{NewUser, OAuthAccount, User, UserUpdate};
use async_trait::async_trait;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const OAUTH_ACCOUNTS: &str = "oauth_accounts";
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User already exists with this email")]
    DuplicateEmail,

    #[error("User {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::NotFound(_) => AppError::NotFound("User not found".to_string()),
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

/// Persistence contract for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Short name for logs and health output.
    fn backend_name(&self) -> &'static str;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user, failing with [`StoreError::DuplicateEmail`] if the
    /// normalized email is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Apply a partial update and return the updated record.
    async fn update(&self, id: &str, update: UserUpdate) -> Result<User, StoreError>;

    /// Insert or refresh the link for `(provider, provider_account_id)`.
    async fn upsert_oauth_account(&self, account: OAuthAccount) -> Result<(), StoreError>;
}

/// Shared store handle held in `AppState`.
pub type DynUserStore = Arc<dyn UserStore>;

/// Connect to MongoDB, falling back to the in-memory store if it is unreachable.
///
/// The fallback is not durable and is logged as a degraded mode.
pub async fn connect_user_store(config: &Config) -> DynUserStore {
    match MongoUserStore::connect(&config.mongodb_uri, &config.mongodb_database).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "MongoDB unreachable, falling back to in-memory user store (not durable)"
            );
            Arc::new(MemoryUserStore::new())
        }
    }
}
