// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password account routes: signup, login, logout and current user.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{CompanySize, GoalCategory, NewUser, PublicUser, UserRole};
use crate::services::password::{hash_password, verify_password};
use crate::AppState;

/// Routes that do not require an authenticated caller.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Routes mounted behind `require_auth`.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub confirm_password: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(required(message = "Please select your role"))]
    pub role: Option<UserRole>,
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
    #[validate(required(message = "Please select company size"))]
    pub company_size: Option<CompanySize>,
    #[validate(length(min = 1, message = "Industry is required"))]
    pub industry: String,
    #[validate(length(min = 1, message = "Please select at least one goal"))]
    pub goals: Vec<GoalCategory>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "client/src/lib/generated/")
)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Create an account and return a bearer token.
async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password(&req.password).await?;

    // The store enforces uniqueness again; a concurrent signup loses there.
    let user = state
        .users
        .create(NewUser {
            email: req.email,
            password_hash: Some(password_hash),
            first_name: Some(req.first_name),
            last_name: req.last_name,
            role: req.role,
            company_name: Some(req.company_name),
            company_size: req.company_size,
            industry: Some(req.industry),
            goals: req.goals,
            ..Default::default()
        })
        .await?;

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)?;

    tracing::info!(user_id = %user.id, email = %user.email, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            user: PublicUser::from(&user),
            token,
        }),
    ))
}

/// Verify credentials, start a session and return a bearer token.
async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(SignedCookieJar, Json<AuthResponse>)> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    // OAuth-only accounts have no password and cannot log in this way.
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(&req.password, hash).await? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(AppError::InvalidCredentials);
    }
    if !user.is_active {
        tracing::info!(user_id = %user.id, "Login refused for inactive user");
        return Err(AppError::InvalidCredentials);
    }

    let jar = state.sessions.jar(&headers);
    let (jar, _) = state
        .sessions
        .establish(jar, &user)
        .map_err(|e| AppError::Internal(e.into()))?;
    let token = create_jwt(&user.id, &state.config.jwt_signing_key)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: PublicUser::from(&user),
            token,
        }),
    ))
}

/// Destroy the session and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> (SignedCookieJar, Json<MessageResponse>) {
    let (jar, existed) = state.sessions.destroy(state.sessions.jar(&headers));

    let message = if existed {
        "Logged out successfully"
    } else {
        "Already logged out"
    };
    (jar, Json(MessageResponse { message }))
}

async fn me(Extension(auth): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user: PublicUser::from(&auth.user),
    })
}
