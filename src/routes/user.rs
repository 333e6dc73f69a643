// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current-user routes (require authentication).

use axum::{
    extract::State,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::{CompanySize, GoalCategory, PublicUser, UserRole, UserUpdate};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user", get(get_user))
        .route("/api/user/profile", put(update_profile))
}

/// Profile fields a user may change. Absent or empty values keep the
/// current value.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    #[validate(length(max = 200))]
    pub company_name: Option<String>,
    pub company_size: Option<CompanySize>,
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    pub goals: Option<Vec<GoalCategory>>,
}

impl ProfileUpdateRequest {
    fn into_update(self) -> UserUpdate {
        UserUpdate {
            first_name: non_empty(self.first_name),
            last_name: non_empty(self.last_name),
            role: self.role,
            company_name: non_empty(self.company_name),
            company_size: self.company_size,
            industry: non_empty(self.industry),
            goals: self.goals.filter(|g| !g.is_empty()),
            ..Default::default()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Current user, without the password hash.
async fn get_user(Extension(auth): Extension<AuthUser>) -> Json<PublicUser> {
    Json(PublicUser::from(&auth.user))
}

/// Partially update the current user's profile.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<ProfileUpdateRequest>,
) -> Result<Json<PublicUser>> {
    let user = state.users.update(&auth.user.id, req.into_update()).await?;

    if let Some(session_id) = &auth.session_id {
        state.sessions.store.refresh_snapshot(session_id, &user);
    }

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(PublicUser::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_strings_are_ignored() {
        let req: ProfileUpdateRequest = serde_json::from_value(serde_json::json!({
            "firstName": "",
            "lastName": "  ",
            "industry": "Fintech",
            "goals": []
        }))
        .unwrap();

        let update = req.into_update();
        assert_eq!(update.first_name, None);
        assert_eq!(update.last_name, None);
        assert_eq!(update.industry.as_deref(), Some("Fintech"));
        assert_eq!(update.goals, None);
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        let result = serde_json::from_value::<ProfileUpdateRequest>(serde_json::json!({
            "role": "Emperor"
        }));
        assert!(result.is_err());
    }
}
