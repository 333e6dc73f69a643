// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password account flow tests: signup, login, session use, logout
//! and profile updates.

use axum::http::{header, HeaderMap, StatusCode};
use narrisia_api::db::UserStore;
use narrisia_api::middleware::auth::verify_jwt;
use narrisia_api::models::NewUser;
use serde_json::json;

mod common;

use common::{
    bearer_request, body_json, cookie_request, json_request, login, seed_user, session_cookie,
    signup_body,
};

#[tokio::test]
async fn test_signup_returns_user_and_token() {
    let app = common::create_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            &signup_body("ceo@acme.com", "secret123"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;

    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["email"], "ceo@acme.com");
    assert_eq!(body["user"]["role"], "CEO");
    assert_eq!(body["user"]["companySize"], "11-50");
    assert_eq!(body["user"]["goals"], json!(["Strategy"]));
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());

    let claims = verify_jwt(token, &app.state.config.jwt_signing_key).unwrap();
    assert_eq!(claims.sub, body["user"]["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_signup_without_last_name() {
    let app = common::create_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            &json!({
                "email": "ceo@acme.com",
                "password": "secret123",
                "confirmPassword": "secret123",
                "firstName": "Jane",
                "role": "CEO",
                "companyName": "Acme",
                "companySize": "11-50",
                "industry": "Tech",
                "goals": ["Strategy"]
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["user"].get("password").is_none());
    assert!(!body["token"].as_str().unwrap().is_empty());

    let user = app.store.find_by_email("ceo@acme.com").await.unwrap().unwrap();
    assert_eq!(user.first_name.as_deref(), Some("Jane"));
    assert_eq!(user.last_name, None);
}

#[tokio::test]
async fn test_signup_then_login_with_same_credentials() {
    let app = common::create_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            &signup_body("founder@acme.com", "secret123"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let signup = body_json(response).await;
    let user_id = signup["user"]["id"].as_str().unwrap().to_string();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            &json!({ "email": "founder@acme.com", "password": "secret123" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    assert_eq!(login["user"]["id"], user_id.as_str());

    let claims = verify_jwt(
        login["token"].as_str().unwrap(),
        &app.state.config.jwt_signing_key,
    )
    .unwrap();
    assert_eq!(claims.sub, user_id);
}

#[tokio::test]
async fn test_duplicate_signup_rejected() {
    let app = common::create_test_app();
    seed_user(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            &signup_body("CEO@Acme.com", "another123"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User already exists with this email");
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let app = common::create_test_app();

    let mut payload = signup_body("not-an-email", "secret123");
    payload["confirmPassword"] = json!("secret124");

    let response = app
        .send(json_request("POST", "/api/auth/signup", &payload))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["confirm_password", "email"]);
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = common::create_test_app();

    let response = app
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(axum::body::Body::from("{\"email\": "))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = common::create_test_app();
    seed_user(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            &json!({ "email": "ceo@acme.com", "password": "wrong-password" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(session_cookie(&response).is_none());
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_unknown_email_same_error() {
    let app = common::create_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            &json!({ "email": "nobody@acme.com", "password": "secret123" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_oauth_only_account_cannot_password_login() {
    let app = common::create_test_app();
    app.store
        .create(NewUser {
            email: "oauth@acme.com".to_string(),
            google_id: Some("g-1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            &json!({ "email": "oauth@acme.com", "password": "anything" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_establishes_session() {
    let app = common::create_test_app();
    let user = seed_user(&app, "ceo@acme.com", "secret123").await;

    let (cookie, token) = login(&app, "CEO@acme.com", "secret123").await;

    let claims = verify_jwt(&token, &app.state.config.jwt_signing_key).unwrap();
    assert_eq!(claims.sub, user.id);

    let response = app
        .send(cookie_request("GET", "/api/user", &cookie, None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], user.id);
    assert_eq!(body["email"], "ceo@acme.com");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_second_login_replaces_session() {
    let app = common::create_test_app();
    seed_user(&app, "ceo@acme.com", "secret123").await;

    let (first, _) = login(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(cookie_request(
            "POST",
            "/api/auth/login",
            &first,
            Some(&json!({ "email": "ceo@acme.com", "password": "secret123" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = session_cookie(&response).unwrap();
    assert_ne!(first, second);

    let old = app
        .send(cookie_request("GET", "/api/user", &first, None))
        .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.sessions.store.len(), 1);
}

#[tokio::test]
async fn test_me_with_bearer_token() {
    let app = common::create_test_app();
    let user = seed_user(&app, "ceo@acme.com", "secret123").await;
    let (_, token) = login(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(bearer_request("GET", "/api/auth/me", &token, None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], user.id);
    assert_eq!(body["user"]["firstName"], "Jane");
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let app = common::create_test_app();
    seed_user(&app, "ceo@acme.com", "secret123").await;
    let (cookie, _) = login(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(cookie_request("POST", "/api/auth/logout", &cookie, None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Logged out successfully");

    let response = app
        .send(cookie_request("GET", "/api/user", &cookie, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.state.sessions.store.is_empty());
}

#[tokio::test]
async fn test_logout_without_session() {
    let app = common::create_test_app();

    let response = app
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Already logged out");
}

#[tokio::test]
async fn test_profile_update_partial() {
    let app = common::create_test_app();
    let user = seed_user(&app, "ceo@acme.com", "secret123").await;
    let (cookie, _) = login(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(cookie_request(
            "PUT",
            "/api/user/profile",
            &cookie,
            Some(&json!({
                "firstName": "",
                "industry": "Fintech",
                "role": "CFO",
                "companySize": "201-500"
            })),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["firstName"], "Jane");
    assert_eq!(body["industry"], "Fintech");
    assert_eq!(body["role"], "CFO");
    assert_eq!(body["companySize"], "201-500");

    // Session snapshot follows the stored record
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, cookie.parse().unwrap());
    let jar = app.state.sessions.jar(&headers);
    let (_, record) = app.state.sessions.current(&jar).unwrap();
    assert_eq!(record.user_id, user.id);
    assert_eq!(record.user.industry.as_deref(), Some("Fintech"));
}

#[tokio::test]
async fn test_profile_update_rejects_unknown_enum() {
    let app = common::create_test_app();
    seed_user(&app, "ceo@acme.com", "secret123").await;
    let (cookie, _) = login(&app, "ceo@acme.com", "secret123").await;

    let response = app
        .send(cookie_request(
            "PUT",
            "/api/user/profile",
            &cookie,
            Some(&json!({ "role": "Emperor" })),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
