// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store used when MongoDB is unavailable, and in tests.

use super::{StoreError, UserStore};
use crate::models::user::normalize_email;
use crate::models::{NewUser, OAuthAccount, OAuthProvider, User, UserUpdate};
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    /// normalized email -> user id
    by_email: HashMap<String, String>,
    /// (provider, provider account id) -> link
    oauth_accounts: HashMap<(OAuthProvider, String), OAuthAccount>,
}

/// Non-durable user store.
///
/// The id map and the email index share one lock so that the uniqueness check
/// and the insert happen atomically.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Look up a stored OAuth link.
    pub async fn oauth_account(
        &self,
        provider: OAuthProvider,
        provider_account_id: &str,
    ) -> Option<OAuthAccount> {
        self.inner
            .read()
            .await
            .oauth_accounts
            .get(&(provider, provider_account_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user(uuid::Uuid::new_v4().to_string(), now_rfc3339());

        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.by_email.insert(user.email.clone(), user.id.clone());
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, id: &str, update: UserUpdate) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply(user, now_rfc3339());
        Ok(user.clone())
    }

    async fn upsert_oauth_account(&self, account: OAuthAccount) -> Result<(), StoreError> {
        let key = (account.provider, account.provider_account_id.clone());
        let mut inner = self.inner.write().await;
        let account = match inner.oauth_accounts.get(&key) {
            Some(existing) => OAuthAccount {
                refresh_token: account
                    .refresh_token
                    .or_else(|| existing.refresh_token.clone()),
                expires_at: account.expires_at.or_else(|| existing.expires_at.clone()),
                created_at: existing.created_at.clone(),
                ..account
            },
            None => account,
        };
        inner.oauth_accounts.insert(key, account);
        Ok(())
    }
}
