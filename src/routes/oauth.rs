// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth routes.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::google_oauth::{oauth_account_record, resolve_account, OAuthError};
use crate::services::GoogleOAuthClient;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed state parameter stays valid.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;
/// Tolerated clock skew for states stamped slightly in the future.
const STATE_MAX_SKEW_MS: u128 = 60 * 1000;

const CALLBACK_PATH: &str = "/api/auth/google/callback";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/google", get(google_start))
        .route(CALLBACK_PATH, get(google_callback))
}

/// Start the OAuth flow: redirect to the Google consent screen.
async fn google_start(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Redirect> {
    let Some(client) = state.google.as_ref() else {
        return Err(AppError::BadRequest(
            "Google OAuth not configured. Please provide GOOGLE_CLIENT_ID.".to_string(),
        ));
    };

    let oauth_state = sign_state(&state.config.session_secret, now_millis()?)?;
    let redirect_uri = callback_url(&headers, state.config.port);

    tracing::info!(
        client_id = %client.client_id(),
        redirect_uri = %redirect_uri,
        "Starting OAuth flow, redirecting to Google"
    );

    Ok(Redirect::temporary(
        &client.authorization_url(&redirect_uri, &oauth_state),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback: exchange the code, resolve the account, start a session.
///
/// Every outcome is a browser redirect; failures land on the login page with
/// an `error` code.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let login_error = |code: &str| {
        Redirect::temporary(&state.config.frontend_path(&format!("/login?error={code}")))
            .into_response()
    };

    if let Some(error) = &params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return login_error("oauth_failed");
    }

    let code = params.code.as_deref().filter(|c| !c.is_empty());
    let (Some(client), Some(code)) = (state.google.as_ref(), code) else {
        tracing::warn!(
            has_code = code.is_some(),
            has_credentials = state.google.is_some(),
            "Missing required OAuth parameters"
        );
        return login_error("oauth_failed");
    };

    let state_ok = match (params.state.as_deref(), now_millis()) {
        (Some(s), Ok(now)) => verify_state(s, &state.config.session_secret, now),
        _ => false,
    };
    if !state_ok {
        tracing::warn!("Invalid, expired or missing OAuth state parameter");
        return login_error("oauth_failed");
    }

    let redirect_uri = callback_url(&headers, state.config.port);
    let user = match complete_login(&state, client, code, &redirect_uri).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Google login failed");
            return login_error(e.redirect_code());
        }
    };

    let jar = state.sessions.jar(&headers);
    let jar = match state.sessions.establish(jar, &user) {
        Ok((jar, _)) => jar,
        Err(e) => {
            tracing::error!(error = %e, user_id = %user.id, "Failed to establish session");
            return login_error("session_failed");
        }
    };

    tracing::info!(user_id = %user.id, "Google login successful");
    (jar, Redirect::temporary(&state.config.frontend_path("/"))).into_response()
}

async fn complete_login(
    state: &AppState,
    client: &GoogleOAuthClient,
    code: &str,
    redirect_uri: &str,
) -> std::result::Result<User, OAuthError> {
    let tokens = client.exchange_code(code, redirect_uri).await?;
    let access_token = tokens
        .access_token
        .as_deref()
        .ok_or_else(|| OAuthError::TokenExchangeFailed("no access token returned".to_string()))?;

    let profile = client.fetch_profile(access_token).await?;
    let user = resolve_account(state.users.as_ref(), &profile).await?;

    state
        .users
        .upsert_oauth_account(oauth_account_record(&user.id, &profile, &tokens))
        .await?;

    Ok(user)
}

/// Callback URL derived from the request (`X-Forwarded-Proto` + `Host`).
fn callback_url(headers: &HeaderMap, port: u16) -> String {
    let scheme = match headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
    {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("localhost:{port}"));

    format!("{scheme}://{host}{CALLBACK_PATH}")
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Build a signed state parameter: `nonce_hex|timestamp_hex|signature_hex`,
/// base64url-encoded.
fn sign_state(secret: &[u8], now_ms: u128) -> Result<String> {
    let mut nonce = [0u8; 16];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate OAuth nonce")))?;

    let payload = format!("{}|{:x}", hex::encode(nonce), now_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Check the signature and age of a state parameter.
fn verify_state(state: &str, secret: &[u8], now_ms: u128) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|b| String::from_utf8(b).ok())
    else {
        return false;
    };

    let mut parts = state_str.splitn(3, '|');
    let (Some(nonce_hex), Some(timestamp_hex), Some(signature_hex)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(format!("{nonce_hex}|{timestamp_hex}").as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    let Ok(issued) = u128::from_str_radix(timestamp_hex, 16) else {
        return false;
    };
    issued <= now_ms + STATE_MAX_SKEW_MS && now_ms.saturating_sub(issued) <= STATE_MAX_AGE_MS
}
