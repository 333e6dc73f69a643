// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Billing gateway: checkout operations on top of the payment provider.
//!
//! Every provider-side identifier (customer, subscription) and the resulting
//! subscription state is persisted on the user record. There is no webhook
//! reconciliation, so the stored status reflects the provider's answer at
//! creation time only.

use crate::db::DynUserStore;
use crate::error::{AppError, Result};
use crate::models::{User, UserUpdate};
use crate::services::stripe::{PaymentError, PaymentProvider, SubscriptionParams};
use std::sync::Arc;

/// Plan tag of the free tier.
pub const FREE_PLAN: &str = "starter";
/// Subscription id reported for the free tier (never sent to the provider).
pub const FREE_SUBSCRIPTION_ID: &str = "free_starter";
pub const DEFAULT_FREE_TASKS: u32 = 100;
pub const DEFAULT_PAID_TASKS: u32 = 1000;

/// Fallback monthly prices (minor units) when the client sends no amount.
const PROFESSIONAL_PRICE: i64 = 4900;
const DEFAULT_PAID_PRICE: i64 = 9900;

/// Largest charge Stripe accepts, in minor units.
pub const MAX_MINOR_UNITS: i64 = 99_999_999;

/// Convert a decimal currency amount to minor units (cents).
pub fn to_minor_units(amount: f64) -> Result<i64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::invalid("amount", "Amount must be a non-negative number"));
    }
    let minor = (amount * 100.0).round();
    if minor > MAX_MINOR_UNITS as f64 {
        return Err(AppError::invalid("amount", "Amount exceeds the maximum charge"));
    }
    Ok(minor as i64)
}

/// Subscription request after JSON decoding.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRequest {
    /// Plan tag (`starter`, `professional`, ...)
    pub plan: Option<String>,
    /// Human-readable plan name used for the provider-side product
    pub plan_name: Option<String>,
    pub payment_method_id: Option<String>,
    /// Monthly price as a decimal currency amount
    pub amount: Option<f64>,
    /// Requested task quota
    pub tasks: Option<u32>,
}

impl SubscriptionRequest {
    pub fn is_free_tier(&self) -> bool {
        self.plan.as_deref() == Some(FREE_PLAN) || self.amount == Some(0.0)
    }
}

/// Result of a subscription request.
#[derive(Debug, Clone)]
pub struct SubscriptionOutcome {
    pub subscription_id: String,
    pub status: String,
    /// Set for the free tier only
    pub plan: Option<String>,
    pub user: User,
}

/// Billing gateway.
#[derive(Clone)]
pub struct BillingService {
    provider: Arc<dyn PaymentProvider>,
    users: DynUserStore,
}

impl BillingService {
    pub fn new(provider: Arc<dyn PaymentProvider>, users: DynUserStore) -> Self {
        Self { provider, users }
    }

    /// Create a one-off payment intent and return its client secret.
    pub async fn create_payment_intent(
        &self,
        user_id: &str,
        amount: f64,
        plan: Option<&str>,
    ) -> Result<String> {
        let amount = to_minor_units(amount)?;
        let plan = plan.unwrap_or("pro");

        let intent = self
            .provider
            .create_payment_intent(amount, &[("userId", user_id), ("plan", plan)])
            .await
            .map_err(|e| upstream("payment intent", e))?;

        tracing::info!(user_id, amount, plan, "Payment intent created");

        intent
            .client_secret
            .ok_or_else(|| missing_secret("payment intent"))
    }

    /// Return the user's provider customer id, creating and storing one if needed.
    pub async fn create_or_get_customer(&self, user: &User) -> Result<(String, User)> {
        if let Some(id) = &user.stripe_customer_id {
            return Ok((id.clone(), user.clone()));
        }

        let name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        let customer_id = self
            .provider
            .create_customer(&user.email, &name, &user.id)
            .await
            .map_err(|e| upstream("customer", e))?;

        let user = self
            .users
            .update(
                &user.id,
                UserUpdate {
                    stripe_customer_id: Some(customer_id.clone()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "Payment customer created");
        Ok((customer_id, user))
    }

    /// Prepare off-session card collection; returns the setup intent client secret.
    pub async fn create_setup_intent(&self, user: &User) -> Result<(String, User)> {
        let (customer_id, user) = self.create_or_get_customer(user).await?;

        let intent = self
            .provider
            .create_setup_intent(&customer_id)
            .await
            .map_err(|e| upstream("setup intent", e))?;

        let secret = intent
            .client_secret
            .ok_or_else(|| missing_secret("setup intent"))?;
        Ok((secret, user))
    }

    /// Subscribe the user to a plan.
    ///
    /// The free tier is recorded locally without contacting the provider.
    pub async fn create_subscription(
        &self,
        user: &User,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionOutcome> {
        if request.is_free_tier() {
            let tasks = request.tasks.unwrap_or(DEFAULT_FREE_TASKS);
            let user = self
                .users
                .update(
                    &user.id,
                    UserUpdate {
                        subscription_plan: Some(FREE_PLAN.to_string()),
                        subscription_status: Some("active".to_string()),
                        task_limit: Some(tasks),
                        ..Default::default()
                    },
                )
                .await?;

            tracing::info!(user_id = %user.id, tasks, "Free plan activated");
            return Ok(SubscriptionOutcome {
                subscription_id: FREE_SUBSCRIPTION_ID.to_string(),
                status: "active".to_string(),
                plan: Some(FREE_PLAN.to_string()),
                user,
            });
        }

        let customer_id = user
            .stripe_customer_id
            .clone()
            .ok_or_else(|| AppError::BadRequest("Customer not found".to_string()))?;

        let payment_method_id = request
            .payment_method_id
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::invalid("paymentMethodId", "Payment method is required"))?;

        let unit_amount = match request.amount {
            Some(amount) => to_minor_units(amount)?,
            None if request.plan.as_deref() == Some("professional") => PROFESSIONAL_PRICE,
            None => DEFAULT_PAID_PRICE,
        };

        let plan_name = request
            .plan_name
            .clone()
            .or_else(|| request.plan.clone())
            .unwrap_or_else(|| "Custom".to_string());

        let product_id = self
            .provider
            .create_product(
                &format!("Narrisia.AI {plan_name} Plan"),
                &format!("{plan_name} subscription for AI productivity tools"),
            )
            .await
            .map_err(|e| upstream("subscription", e))?;

        let subscription = self
            .provider
            .create_subscription(&SubscriptionParams {
                customer_id,
                payment_method_id,
                product_id,
                unit_amount,
            })
            .await
            .map_err(|e| upstream("subscription", e))?;

        let tasks = request.tasks.unwrap_or(DEFAULT_PAID_TASKS);
        let user = self
            .users
            .update(
                &user.id,
                UserUpdate {
                    stripe_subscription_id: Some(subscription.id.clone()),
                    subscription_status: Some(subscription.status.clone()),
                    subscription_plan: request.plan.clone(),
                    task_limit: Some(tasks),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            unit_amount,
            "Subscription created"
        );

        Ok(SubscriptionOutcome {
            subscription_id: subscription.id,
            status: subscription.status,
            plan: None,
            user,
        })
    }
}

fn upstream(what: &str, err: PaymentError) -> AppError {
    AppError::Upstream(format!("Error creating {what}: {err}"))
}

fn missing_secret(what: &str) -> AppError {
    AppError::Upstream(format!("Error creating {what}: no client secret returned"))
}
