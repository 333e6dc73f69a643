// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie attribute tests.
//!
//! These tests verify the attributes of the session cookie on login and of
//! the removal cookie on logout, for development and production settings.

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{
    bearer_request, body_json, cookie_request, json_request, login, seed_user, session_cookie,
    set_cookie_headers, TestApp,
};

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn login_set_cookie(app: &TestApp) -> String {
    seed_user(app, "ceo@acme.com", "secret123").await;
    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            &json!({ "email": "ceo@acme.com", "password": "secret123" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    find_cookie(&set_cookie_headers(&response), "narrisia_sid")
}

#[tokio::test]
async fn test_login_cookie_development_attributes() {
    let app = common::create_test_app();
    let cookie = login_set_cookie(&app).await;

    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(!cookie.contains("Secure"));
    assert!(!cookie.contains("Domain="));
}

#[tokio::test]
async fn test_login_cookie_production_attributes() {
    let app = common::create_production_test_app();
    let cookie = login_set_cookie(&app).await;

    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Max-Age=86400"));
}

#[tokio::test]
async fn test_logout_cookie_removal_attributes() {
    let app = common::create_test_app();

    let response = app
        .send(cookie_request(
            "POST",
            "/api/auth/logout",
            "narrisia_sid=stale",
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = find_cookie(&set_cookie_headers(&response), "narrisia_sid");
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_cookie_removal_production() {
    let app = common::create_production_test_app();

    let response = app
        .send(cookie_request(
            "POST",
            "/api/auth/logout",
            "narrisia_sid=stale",
            None,
        ))
        .await;

    let cookie = find_cookie(&set_cookie_headers(&response), "narrisia_sid");
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_session_request_renews_cookie() {
    let app = common::create_test_app();
    seed_user(&app, "ceo@acme.com", "secret123").await;
    let (cookie, _) = login(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(cookie_request("GET", "/api/user", &cookie, None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let renewed = find_cookie(&set_cookie_headers(&response), "narrisia_sid");
    assert!(renewed.contains("Max-Age=86400"));
    assert!(renewed.contains("HttpOnly"));

    // The re-issued cookie carries the same live session
    let renewed = session_cookie(&response).unwrap();
    let response = app
        .send(cookie_request("GET", "/api/auth/me", &renewed, None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["email"], "ceo@acme.com");
    assert_eq!(app.state.sessions.store.len(), 1);
}

#[tokio::test]
async fn test_bearer_request_sets_no_cookie() {
    let app = common::create_test_app();
    seed_user(&app, "ceo@acme.com", "secret123").await;
    let (_, token) = login(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(bearer_request("GET", "/api/user", &token, None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie_headers(&response).is_empty());
}
