// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout routes (require authentication).

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::services::{SubscriptionOutcome, SubscriptionRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/create-payment-intent", post(create_payment_intent))
        .route("/api/create-setup-intent", post(create_setup_intent))
        .route("/api/create-subscription", post(create_subscription))
        .route("/api/billing/config", get(billing_config))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentIntentBody {
    #[serde(default, deserialize_with = "lenient_f64")]
    #[validate(range(min = 0.0))]
    pub amount: Option<f64>,
    #[serde(default)]
    pub plan: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionBody {
    /// Plan tag (`starter`, `professional`, ...)
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    #[validate(range(min = 0.0))]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub tasks: Option<u32>,
}

impl From<SubscriptionBody> for SubscriptionRequest {
    fn from(body: SubscriptionBody) -> Self {
        Self {
            plan: body.price_id,
            plan_name: body.plan_name,
            payment_method_id: body.payment_method_id,
            amount: body.amount,
            tasks: body.tasks,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "client/src/lib/generated/")
)]
pub struct ClientSecretResponse {
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "client/src/lib/generated/")
)]
pub struct SubscriptionResponse {
    pub subscription_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "client/src/lib/generated/")
)]
pub struct BillingConfigResponse {
    pub publishable_key: Option<String>,
}

async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<PaymentIntentBody>,
) -> Result<Json<ClientSecretResponse>> {
    let amount = body
        .amount
        .ok_or_else(|| AppError::invalid("amount", "Amount is required"))?;

    let client_secret = state
        .billing
        .create_payment_intent(&auth.user.id, amount, body.plan.as_deref())
        .await?;

    Ok(Json(ClientSecretResponse { client_secret }))
}

async fn create_setup_intent(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ClientSecretResponse>> {
    let (client_secret, user) = state.billing.create_setup_intent(&auth.user).await?;
    refresh_session(&state, &auth, &user);
    Ok(Json(ClientSecretResponse { client_secret }))
}

async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<SubscriptionBody>,
) -> Result<Json<SubscriptionResponse>> {
    let SubscriptionOutcome {
        subscription_id,
        status,
        plan,
        user,
    } = state
        .billing
        .create_subscription(&auth.user, body.into())
        .await?;

    refresh_session(&state, &auth, &user);

    Ok(Json(SubscriptionResponse {
        subscription_id,
        status,
        plan,
    }))
}

async fn billing_config(State(state): State<Arc<AppState>>) -> Json<BillingConfigResponse> {
    Json(BillingConfigResponse {
        publishable_key: state.config.stripe_public_key.clone(),
    })
}

fn refresh_session(state: &AppState, auth: &AuthUser, user: &crate::models::User) {
    if let Some(session_id) = &auth.session_id {
        state.sessions.store.refresh_snapshot(session_id, user);
    }
}

/// JSON number or numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number: {s}"))),
    }
}

/// Whole-number quota; fractional values are truncated.
fn lenient_u32<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error> {
    match lenient_f64(deserializer)? {
        None => Ok(None),
        Some(n) if n.is_finite() && n >= 0.0 && n <= u32::MAX as f64 => Ok(Some(n as u32)),
        Some(n) => Err(serde::de::Error::custom(format!("invalid task quota: {n}"))),
    }
}
