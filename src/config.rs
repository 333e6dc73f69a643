// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. A `.env` file is honored for local
//! development.

use std::env;

/// Default MongoDB connection string for local development.
const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/narrisia-ai";
const DEFAULT_MONGODB_DATABASE: &str = "narrisia-ai";
const DEFAULT_PORT: u16 = 3001;

/// Origins accepted by CORS when `ALLOWED_ORIGINS` is not set in development.
const DEV_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5000",
    "http://localhost:5173",
];

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Google OAuth client credentials.
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    pub environment: Environment,
    /// Server port
    pub port: u16,
    /// MongoDB connection string
    pub mongodb_uri: String,
    /// MongoDB database name
    pub mongodb_database: String,
    /// Origins allowed to make credentialed CORS requests
    pub allowed_origins: Vec<String>,
    /// Prefix for browser redirects issued by the OAuth callback.
    /// Empty means same origin as the API.
    pub frontend_url: String,
    /// Stripe publishable key handed to the checkout page
    pub stripe_public_key: Option<String>,

    // --- Secrets ---
    /// Key material for signing the session cookie
    pub session_secret: Vec<u8>,
    /// JWT signing key for bearer tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Google OAuth credentials; OAuth routes are disabled without them
    pub google: Option<GoogleCredentials>,
    /// Stripe secret API key
    pub stripe_secret_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment =
            Environment::parse(&env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()));

        let port = env::var("PORT")
            .or_else(|_| env::var("BACKEND_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let allowed_origins = match env::var("ALLOWED_ORIGINS") {
            Ok(raw) => parse_origins(&raw),
            Err(_) if environment.is_production() => {
                return Err(ConfigError::Missing("ALLOWED_ORIGINS"))
            }
            Err(_) => DEV_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let google = match (
            non_empty_var("GOOGLE_CLIENT_ID"),
            non_empty_var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(GoogleCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Ok(Self {
            environment,
            port,
            mongodb_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| DEFAULT_MONGODB_URI.to_string()),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| DEFAULT_MONGODB_DATABASE.to_string()),
            allowed_origins,
            frontend_url: env::var("FRONTEND_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_default(),
            stripe_public_key: non_empty_var("STRIPE_PUBLIC_KEY"),

            session_secret: non_empty_var("SESSION_SECRET")
                .ok_or(ConfigError::Missing("SESSION_SECRET"))?
                .into_bytes(),
            jwt_signing_key: non_empty_var("JWT_SECRET")
                .ok_or(ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            google,
            stripe_secret_key: non_empty_var("STRIPE_SECRET_KEY")
                .ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))?,
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            port: DEFAULT_PORT,
            mongodb_uri: DEFAULT_MONGODB_URI.to_string(),
            mongodb_database: DEFAULT_MONGODB_DATABASE.to_string(),
            allowed_origins: DEV_ORIGINS.iter().map(|o| o.to_string()).collect(),
            frontend_url: String::new(),
            stripe_public_key: Some("pk_test_narrisia".to_string()),
            session_secret: b"test_session_secret_at_least_32_bytes!!".to_vec(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            google: Some(GoogleCredentials {
                client_id: "test-client-id.apps.googleusercontent.com".to_string(),
                client_secret: "test_google_secret".to_string(),
            }),
            stripe_secret_key: "sk_test_narrisia".to_string(),
        }
    }

    /// Build a browser redirect target relative to the frontend.
    pub fn frontend_path(&self, path: &str) -> String {
        format!("{}{}", self.frontend_url, path)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
