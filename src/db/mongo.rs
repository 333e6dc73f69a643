// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MongoDB-backed user store.
//!
//! Provides typed operations for:
//! - Users (profile, credentials, billing identifiers)
//! - OAuth accounts (provider tokens, keyed by provider + account id)

use super::{collections, StoreError, UserStore};
use crate::models::user::normalize_email;
use crate::models::{NewUser, OAuthAccount, User, UserUpdate};
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use mongodb::bson::{self, doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

/// Fail fast when the server is unreachable instead of the 30s driver default.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB user store.
#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<User>,
    oauth_accounts: Collection<Document>,
}

impl MongoUserStore {
    /// Connect, verify the server answers a ping, and ensure indexes exist.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await.map_err(backend)?;
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
        options.app_name = Some("narrisia-api".to_string());

        let client = Client::with_options(options).map_err(backend)?;
        let db = client.database(database);

        db.run_command(doc! { "ping": 1 }).await.map_err(backend)?;

        let store = Self::from_database(&db);
        store.ensure_indexes().await?;

        tracing::info!(database, "Connected to MongoDB");
        Ok(store)
    }

    fn from_database(db: &Database) -> Self {
        Self {
            users: db.collection(collections::USERS),
            oauth_accounts: db.collection(collections::OAUTH_ACCOUNTS),
        }
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(backend)?;

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "googleId": 1 })
                    .options(IndexOptions::builder().sparse(true).build())
                    .build(),
            )
            .await
            .map_err(backend)?;

        self.oauth_accounts
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "provider": 1, "providerAccountId": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<User>, StoreError> {
        self.users.find_one(filter).await.map_err(backend)
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one(doc! { "email": normalize_email(email) }).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.find_one(doc! { "_id": id }).await
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        self.find_one(doc! { "googleId": google_id }).await
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user(uuid::Uuid::new_v4().to_string(), now_rfc3339());

        match self.users.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicateEmail),
            Err(e) => Err(backend(e)),
        }
    }

    async fn update(&self, id: &str, update: UserUpdate) -> Result<User, StoreError> {
        let mut set = bson::to_document(&update).map_err(backend)?;
        set.insert("updatedAt", now_rfc3339());

        self.users
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn upsert_oauth_account(&self, account: OAuthAccount) -> Result<(), StoreError> {
        let mut set = bson::to_document(&account).map_err(backend)?;
        let created_at = set.remove("createdAt").unwrap_or_else(|| now_rfc3339().into());

        self.oauth_accounts
            .update_one(
                doc! {
                    "provider": account.provider.as_str(),
                    "providerAccountId": account.provider_account_id.as_str(),
                },
                doc! {
                    "$set": set,
                    "$setOnInsert": { "createdAt": created_at },
                },
            )
            .upsert(true)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}
