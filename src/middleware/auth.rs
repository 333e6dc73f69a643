// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication middleware: bearer JWTs and session cookies.
//!
//! Protected routes share a single gate. Credentials are tried in a fixed
//! order: an `Authorization: Bearer` header decides the outcome when present,
//! otherwise the session cookie does. Either way the referenced user must
//! still exist and be active.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bearer token lifetime.
pub const TOKEN_TTL_SECS: usize = 7 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

/// How a request proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authenticator {
    BearerToken,
    SessionCookie,
}

impl Authenticator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BearerToken => "bearer",
            Self::SessionCookie => "session",
        }
    }
}

/// Authenticated user attached to request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub via: Authenticator,
    /// Session id when authenticated by cookie
    pub session_id: Option<String>,
}

/// Middleware that requires an authenticated, active user.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(&state, request.headers()).await?;
    let session_id = auth_user.session_id.clone();
    let jar = state.sessions.jar(request.headers());
    request.extensions_mut().insert(auth_user);

    let response = next.run(request).await;

    // Cookie lifetime slides with the server-side session.
    match session_id {
        Some(id) => Ok((state.sessions.renew(jar, id), response).into_response()),
        None => Ok(response),
    }
}

/// Resolve the caller from request headers.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    if let Some(token) = bearer_token(headers) {
        let claims = verify_jwt(token, &state.config.jwt_signing_key).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::InvalidToken
        })?;
        let user = active_user(state, &claims.sub).await?;
        return Ok(AuthUser {
            user,
            via: Authenticator::BearerToken,
            session_id: None,
        });
    }

    let jar = state.sessions.jar(headers);
    if let Some((session_id, record)) = state.sessions.current(&jar) {
        let user = match active_user(state, &record.user_id).await {
            Ok(user) => user,
            Err(AppError::Forbidden) => {
                state.sessions.store.destroy(&session_id);
                return Err(AppError::Forbidden);
            }
            Err(e) => return Err(e),
        };
        return Ok(AuthUser {
            user,
            via: Authenticator::SessionCookie,
            session_id: Some(session_id),
        });
    }

    Err(AppError::Unauthenticated)
}

async fn active_user(state: &AppState, user_id: &str) -> Result<User, AppError> {
    match state.users.find_by_id(user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => {
            tracing::info!(user_id, "Credential refers to missing or inactive user");
            Err(AppError::Forbidden)
        }
    }
}

/// Non-empty token from an `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Create a bearer token for a user.
pub fn create_jwt(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a bearer token and return its claims.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
}
