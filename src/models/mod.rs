// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod oauth_account;
pub mod user;

pub use oauth_account::{OAuthAccount, OAuthProvider};
pub use user::{CompanySize, GoalCategory, NewUser, PublicUser, User, UserRole, UserUpdate};
