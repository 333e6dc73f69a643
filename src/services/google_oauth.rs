// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 authorization-code client and account resolution.
//!
//! Handles:
//! - Building the consent URL
//! - Exchanging the authorization code for tokens
//! - Fetching the userinfo profile
//! - Mapping the profile onto a local user (find, link or create)

use crate::config::GoogleCredentials;
use crate::db::{StoreError, UserStore};
use crate::models::{NewUser, OAuthAccount, OAuthProvider, User, UserRole, UserUpdate};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};
use serde::Deserialize;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &str = "email profile";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Google API error: {0}")]
    Upstream(String),

    #[error("Google profile has no email address")]
    MissingEmail,

    #[error("Account is deactivated")]
    AccountDisabled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OAuthError {
    /// Error code appended to the login redirect.
    pub fn redirect_code(&self) -> &'static str {
        match self {
            Self::TokenExchangeFailed(_) => "token_failed",
            Self::MissingEmail => "email_required",
            Self::AccountDisabled => "account_disabled",
            Self::Upstream(_) | Self::Store(_) => "oauth_failed",
        }
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Userinfo (v2) profile.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    token_url: String,
    userinfo_url: String,
    client_id: String,
    client_secret: String,
}

impl GoogleOAuthClient {
    pub fn new(credentials: &GoogleCredentials) -> Self {
        Self::with_endpoints(credentials, TOKEN_URL, USERINFO_URL)
    }

    /// Client talking to non-default token and userinfo endpoints.
    pub fn with_endpoints(
        credentials: &GoogleCredentials,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            userinfo_url: userinfo_url.into(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Consent screen URL for the given callback and signed state.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=offline&\
             prompt=consent&\
             state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    ///
    /// A response without an access token is a failed exchange regardless of
    /// HTTP status.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleTokenResponse, OAuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let status = response.status();
        let tokens: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(format!("HTTP {status}: {e}")))?;

        if tokens.access_token.is_none() {
            return Err(OAuthError::TokenExchangeFailed(format!(
                "HTTP {status}: {}",
                tokens.error.as_deref().unwrap_or("no access token returned")
            )));
        }

        Ok(tokens)
    }

    /// Fetch the signed-in user's profile.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Upstream(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::Upstream(format!("JSON parse error: {e}")))
    }
}

/// Map a Google profile onto a local user.
///
/// Lookup order: Google id, then email (linking the Google id to that
/// account), then a new account with the default role. Profiles without an
/// email are rejected.
pub async fn resolve_account(
    store: &dyn UserStore,
    profile: &GoogleProfile,
) -> Result<User, OAuthError> {
    let user = if let Some(user) = store.find_by_google_id(&profile.id).await? {
        user
    } else {
        let email = profile
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(OAuthError::MissingEmail)?;

        match store.find_by_email(email).await? {
            Some(existing) => {
                tracing::info!(user_id = %existing.id, "Linking Google account to existing user");
                let update = UserUpdate {
                    google_id: Some(profile.id.clone()),
                    profile_image_url: if existing.profile_image_url.is_none() {
                        profile.picture.clone()
                    } else {
                        None
                    },
                    ..Default::default()
                };
                store.update(&existing.id, update).await?
            }
            None => {
                let created = store
                    .create(NewUser {
                        email: email.to_string(),
                        first_name: profile.given_name.clone(),
                        last_name: profile.family_name.clone(),
                        profile_image_url: profile.picture.clone(),
                        role: Some(UserRole::Ceo),
                        google_id: Some(profile.id.clone()),
                        ..Default::default()
                    })
                    .await?;
                tracing::info!(user_id = %created.id, "Created user from Google profile");
                created
            }
        }
    };

    if !user.is_active {
        return Err(OAuthError::AccountDisabled);
    }

    Ok(user)
}

/// Build the stored provider-account link for a completed login.
pub fn oauth_account_record(
    user_id: &str,
    profile: &GoogleProfile,
    tokens: &GoogleTokenResponse,
) -> OAuthAccount {
    let now = now_rfc3339();
    let expires_at = tokens
        .expires_in
        .map(|secs| format_utc_rfc3339(chrono::Utc::now() + chrono::Duration::seconds(secs)));

    OAuthAccount {
        user_id: user_id.to_string(),
        provider: OAuthProvider::Google,
        provider_account_id: profile.id.clone(),
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        expires_at,
        token_type: tokens.token_type.clone(),
        scope: tokens.scope.clone(),
        created_at: now.clone(),
        updated_at: now,
    }
}
