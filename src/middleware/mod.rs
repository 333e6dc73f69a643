// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security, error detail).

pub mod auth;
pub mod errors;
pub mod security;

pub use auth::{require_auth, AuthUser, Authenticator};
