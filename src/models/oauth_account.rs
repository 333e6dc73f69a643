// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Link between a local user and an external identity provider account.

use serde::{Deserialize, Serialize};

/// Supported external identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

/// Provider tokens for a linked account.
///
/// `(provider, provider_account_id)` identifies at most one local user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthAccount {
    pub user_id: String,
    pub provider: OAuthProvider,
    pub provider_account_id: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Only sent on the first consent; an absent value keeps the stored one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the access token expires (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_tokens_not_serialized() {
        let account = OAuthAccount {
            user_id: "u1".to_string(),
            provider: OAuthProvider::Google,
            provider_account_id: "g-1".to_string(),
            access_token: Some("access".to_string()),
            refresh_token: None,
            expires_at: None,
            token_type: None,
            scope: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["provider"], "google");
        assert_eq!(json["providerAccountId"], "g-1");
        assert!(json.get("refreshToken").is_none());
        assert!(json.get("expiresAt").is_none());
    }
}
