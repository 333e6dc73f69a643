// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stripe REST API client.
//!
//! Only the calls checkout needs: payment intents, customers, setup
//! intents, products and subscriptions. Requests are form-encoded and
//! authenticated with the secret key.

use async_trait::async_trait;
use serde::Deserialize;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
const STRIPE_API_VERSION: &str = "2025-05-28.basil";

/// Currency for every charge.
pub const CURRENCY: &str = "usd";

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Error reported by Stripe; the message is safe to show to the user.
    #[error("{0}")]
    Provider(String),

    #[error("Stripe request failed: {0}")]
    Transport(String),
}

/// Payment intent as returned to the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetupIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: String,
}

/// Parameters for a monthly subscription priced inline.
#[derive(Debug, Clone)]
pub struct SubscriptionParams {
    pub customer_id: String,
    pub payment_method_id: String,
    pub product_id: String,
    /// Monthly price in minor units
    pub unit_amount: i64,
}

/// Operations the billing gateway needs from the payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount: i64,
        metadata: &[(&str, &str)],
    ) -> Result<PaymentIntent, PaymentError>;

    /// Create a customer and return its id.
    async fn create_customer(
        &self,
        email: &str,
        name: &str,
        user_id: &str,
    ) -> Result<String, PaymentError>;

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError>;

    /// Create a product and return its id.
    async fn create_product(&self, name: &str, description: &str)
        -> Result<String, PaymentError>;

    async fn create_subscription(
        &self,
        params: &SubscriptionParams,
    ) -> Result<Subscription, PaymentError>;
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self::with_base_url(secret_key, STRIPE_API_BASE)
    }

    /// Client for a Stripe-compatible API at `base_url` (no trailing slash).
    pub fn with_base_url(secret_key: String, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key,
        }
    }

    /// POST a form to `path` and parse the JSON response.
    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, PaymentError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(form)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message.or(b.error.kind))
                .unwrap_or_else(|| format!("HTTP {}: {}", status, body));

            if status.as_u16() == 429 {
                tracing::warn!("Stripe rate limit hit (429)");
            }

            return Err(PaymentError::Provider(message));
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Transport(format!("JSON parse error: {}", e)))
    }
}

fn pair(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_payment_intent(
        &self,
        amount: i64,
        metadata: &[(&str, &str)],
    ) -> Result<PaymentIntent, PaymentError> {
        let mut form = vec![pair("amount", amount), pair("currency", CURRENCY)];
        for (k, v) in metadata {
            form.push(pair(&format!("metadata[{k}]"), v));
        }
        self.post_form("payment_intents", &form).await
    }

    async fn create_customer(
        &self,
        email: &str,
        name: &str,
        user_id: &str,
    ) -> Result<String, PaymentError> {
        let form = [
            pair("email", email),
            pair("name", name),
            pair("metadata[userId]", user_id),
        ];
        let customer: IdOnly = self.post_form("customers", &form).await?;
        Ok(customer.id)
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError> {
        let form = [
            pair("customer", customer_id),
            pair("usage", "off_session"),
            pair("payment_method_types[]", "card"),
        ];
        self.post_form("setup_intents", &form).await
    }

    async fn create_product(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, PaymentError> {
        let form = [pair("name", name), pair("description", description)];
        let product: IdOnly = self.post_form("products", &form).await?;
        Ok(product.id)
    }

    async fn create_subscription(
        &self,
        params: &SubscriptionParams,
    ) -> Result<Subscription, PaymentError> {
        let form = [
            pair("customer", &params.customer_id),
            pair("default_payment_method", &params.payment_method_id),
            pair("items[0][price_data][currency]", CURRENCY),
            pair("items[0][price_data][product]", &params.product_id),
            pair("items[0][price_data][unit_amount]", params.unit_amount),
            pair("items[0][price_data][recurring][interval]", "month"),
            pair("expand[]", "latest_invoice.payment_intent"),
        ];
        self.post_form("subscriptions", &form).await
    }
}
