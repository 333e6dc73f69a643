// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Executive role selected at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "client/src/lib/generated/")
)]
pub enum UserRole {
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "CFO")]
    Cfo,
    #[serde(rename = "COO")]
    Coo,
    #[serde(rename = "CMO")]
    Cmo,
    #[serde(rename = "CTO")]
    Cto,
    #[serde(rename = "Board Member")]
    BoardMember,
    #[serde(rename = "Department Head")]
    DepartmentHead,
    Investor,
    Founder,
    Other,
}

/// Company headcount bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "client/src/lib/generated/")
)]
pub enum CompanySize {
    #[serde(rename = "1-10")]
    UpTo10,
    #[serde(rename = "11-50")]
    UpTo50,
    #[serde(rename = "51-200")]
    UpTo200,
    #[serde(rename = "201-500")]
    UpTo500,
    #[serde(rename = "501-1000")]
    UpTo1000,
    #[serde(rename = "1000+")]
    Over1000,
}

/// Goal category a user wants help with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "client/src/lib/generated/")
)]
pub enum GoalCategory {
    Strategy,
    Finance,
    Operations,
    Marketing,
    Technology,
    #[serde(rename = "R&D")]
    ResearchAndDevelopment,
    Sales,
    #[serde(rename = "HR")]
    HumanResources,
}

/// User record as persisted in the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    /// Unique, normalized (trimmed, lower-case)
    pub email: String,
    /// bcrypt hash; absent for OAuth-only accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_size: Option<CompanySize>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub goals: Vec<GoalCategory>,
    #[serde(default = "default_active")]
    pub is_active: bool,

    // OAuth identifiers
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub github_id: Option<String>,

    // Billing
    #[serde(default)]
    pub stripe_customer_id: Option<String>,
    #[serde(default)]
    pub stripe_subscription_id: Option<String>,
    #[serde(default)]
    pub subscription_plan: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub task_limit: Option<u32>,

    pub created_at: String,
    pub updated_at: String,
}

fn default_active() -> bool {
    true
}

/// Fields required to create a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Option<UserRole>,
    pub company_name: Option<String>,
    pub company_size: Option<CompanySize>,
    pub industry: Option<String>,
    pub goals: Vec<GoalCategory>,
    pub google_id: Option<String>,
}

impl NewUser {
    /// Materialize the record with a fresh id and timestamps.
    pub fn into_user(self, id: String, now: String) -> User {
        User {
            id,
            email: normalize_email(&self.email),
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            profile_image_url: self.profile_image_url,
            role: self.role,
            company_name: self.company_name,
            company_size: self.company_size,
            industry: self.industry,
            goals: self.goals,
            is_active: true,
            google_id: self.google_id,
            github_id: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscription_plan: None,
            subscription_status: None,
            task_limit: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Partial update; `None` leaves a field untouched.
///
/// Serializes to the `$set` document used by the MongoDB store.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<CompanySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<GoalCategory>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_limit: Option<u32>,
}

impl UserUpdate {
    /// Apply the present fields to `user` (used by the in-memory store).
    pub fn apply(self, user: &mut User, now: String) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set_opt(&mut user.first_name, self.first_name);
        set_opt(&mut user.last_name, self.last_name);
        set_opt(&mut user.profile_image_url, self.profile_image_url);
        set_opt(&mut user.role, self.role);
        set_opt(&mut user.company_name, self.company_name);
        set_opt(&mut user.company_size, self.company_size);
        set_opt(&mut user.industry, self.industry);
        set(&mut user.goals, self.goals);
        set(&mut user.is_active, self.is_active);
        set_opt(&mut user.google_id, self.google_id);
        set_opt(&mut user.stripe_customer_id, self.stripe_customer_id);
        set_opt(&mut user.stripe_subscription_id, self.stripe_subscription_id);
        set_opt(&mut user.subscription_plan, self.subscription_plan);
        set_opt(&mut user.subscription_status, self.subscription_status);
        set_opt(&mut user.task_limit, self.task_limit);
        user.updated_at = now;
    }
}

/// User as returned by the API: never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "client/src/lib/generated/")
)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Option<UserRole>,
    pub company_name: Option<String>,
    pub company_size: Option<CompanySize>,
    pub industry: Option<String>,
    pub goals: Vec<GoalCategory>,
    pub is_active: bool,
    pub subscription_plan: Option<String>,
    pub subscription_status: Option<String>,
    pub task_limit: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            role: user.role,
            company_name: user.company_name.clone(),
            company_size: user.company_size,
            industry: user.industry.clone(),
            goals: user.goals.clone(),
            is_active: user.is_active,
            subscription_plan: user.subscription_plan.clone(),
            subscription_status: user.subscription_status.clone(),
            task_limit: user.task_limit,
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
