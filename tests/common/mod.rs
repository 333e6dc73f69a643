// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use narrisia_api::config::{Config, Environment};
use narrisia_api::db::{MemoryUserStore, UserStore};
use narrisia_api::models::{NewUser, User, UserUpdate};
use narrisia_api::routes::create_router;
use narrisia_api::services::GoogleOAuthClient;
use narrisia_api::services::stripe::{
    PaymentError, PaymentIntent, PaymentProvider, SetupIntent, Subscription, SubscriptionParams,
};
use narrisia_api::AppState;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Payment provider that records every call and never touches the network.
#[derive(Default)]
pub struct MockPaymentProvider {
    calls: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
}

impl MockPaymentProvider {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every subsequent call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn record(&self, call: String) -> Result<(), PaymentError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(PaymentError::Provider(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_intent(
        &self,
        amount: i64,
        metadata: &[(&str, &str)],
    ) -> Result<PaymentIntent, PaymentError> {
        let plan = metadata
            .iter()
            .find(|(k, _)| *k == "plan")
            .map(|(_, v)| *v)
            .unwrap_or("");
        self.record(format!("payment_intent:{amount}:{plan}"))?;
        Ok(PaymentIntent {
            id: "pi_test".to_string(),
            client_secret: Some("pi_test_secret".to_string()),
        })
    }

    async fn create_customer(
        &self,
        email: &str,
        _name: &str,
        _user_id: &str,
    ) -> Result<String, PaymentError> {
        self.record(format!("customer:{email}"))?;
        Ok("cus_test".to_string())
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError> {
        self.record(format!("setup_intent:{customer_id}"))?;
        Ok(SetupIntent {
            id: "seti_test".to_string(),
            client_secret: Some("seti_test_secret".to_string()),
        })
    }

    async fn create_product(&self, name: &str, _description: &str) -> Result<String, PaymentError> {
        self.record(format!("product:{name}"))?;
        Ok("prod_test".to_string())
    }

    async fn create_subscription(
        &self,
        params: &SubscriptionParams,
    ) -> Result<Subscription, PaymentError> {
        self.record(format!(
            "subscription:{}:{}:{}",
            params.customer_id, params.payment_method_id, params.unit_amount
        ))?;
        Ok(Subscription {
            id: "sub_test".to_string(),
            status: "active".to_string(),
        })
    }
}

/// Router plus handles to its in-memory dependencies.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryUserStore>,
    pub payments: Arc<MockPaymentProvider>,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Create a test app with offline mock dependencies.
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default())
}

/// Create a test app configured for production cookies.
pub fn create_production_test_app() -> TestApp {
    let mut config = Config::test_default();
    config.environment = Environment::Production;
    create_test_app_with(config)
}

pub fn create_test_app_with(config: Config) -> TestApp {
    build_test_app(config, None)
}

/// Create a test app whose Google client talks to `google` endpoints.
pub fn create_test_app_with_google(google: GoogleOAuthClient) -> TestApp {
    build_test_app(Config::test_default(), Some(google))
}

fn build_test_app(config: Config, google: Option<GoogleOAuthClient>) -> TestApp {
    let store = Arc::new(MemoryUserStore::new());
    let payments = Arc::new(MockPaymentProvider::default());

    let mut state = AppState::new(config, store.clone(), payments.clone());
    if google.is_some() {
        state.google = google;
    }
    let state = Arc::new(state);

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        payments,
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn bearer_request(method: &str, uri: &str, token: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn cookie_request(method: &str, uri: &str, cookie: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// `name=value` pair of the session cookie set by `response`, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    set_cookie_headers(response)
        .into_iter()
        .find(|c| c.starts_with("narrisia_sid="))
        .and_then(|c| c.split(';').next().map(str::to_string))
}

pub fn signup_body(email: &str, password: &str) -> Value {
    serde_json::json!({
        "email": email,
        "password": password,
        "confirmPassword": password,
        "firstName": "Jane",
        "lastName": "Doe",
        "role": "CEO",
        "companyName": "Acme",
        "companySize": "11-50",
        "industry": "Tech",
        "goals": ["Strategy"]
    })
}

/// Insert a user directly with a cheap bcrypt hash.
pub async fn seed_user(app: &TestApp, email: &str, password: &str) -> User {
    let hash = bcrypt::hash(password, 4).unwrap();
    app.store
        .create(NewUser {
            email: email.to_string(),
            password_hash: Some(hash),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn deactivate(app: &TestApp, user_id: &str) {
    app.store
        .update(
            user_id,
            UserUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

/// Log in and return `(session cookie, bearer token)`.
pub async fn login(app: &TestApp, email: &str, password: &str) -> (String, String) {
    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
        ))
        .await;
    assert_eq!(response.status(), 200, "login failed for {email}");

    let cookie = session_cookie(&response).expect("login should set the session cookie");
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    (cookie, token)
}
