//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Google Cloud project hosting the Vertex AI endpoints
    pub google_cloud_project: String,
    pub google_cloud_region: String,
    /// Path to the service-account credentials JSON
    pub google_application_credentials: Option<String>,

    /// Root directory for generated artifacts, served under /storage/
    pub storage_path: String,

    /// Access / refresh token configuration
    pub jwt_secret_key: String,
    pub jwt_algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,

    /// When true, the generation backend is replaced by a mock that
    /// returns a stub artifact after a short random delay
    pub load_test_mode: bool,

    /// Runtime configuration
    pub port: u16,
}

impl Settings {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let settings = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,

            google_cloud_project: env::var("GOOGLE_CLOUD_PROJECT")
                .map_err(|_| anyhow::anyhow!("GOOGLE_CLOUD_PROJECT is required"))?,
            google_cloud_region: env::var("GOOGLE_CLOUD_REGION")
                .unwrap_or_else(|_| "us-central1".to_string()),
            google_application_credentials: env::var("GOOGLE_APPLICATION_CREDENTIALS").ok(),

            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| "/app/storage".to_string()),

            jwt_secret_key: env::var("JWT_SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET_KEY is required"))?,
            jwt_algorithm: env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            refresh_token_expire_days: env::var("REFRESH_TOKEN_EXPIRE_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),

            load_test_mode: env::var("LOAD_TEST_MODE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),

            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),
        };

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires .env file with all config vars - run locally only
    fn test_settings_from_env_loads_successfully() {
        let result = Settings::from_env();
        assert!(
            result.is_ok(),
            "Settings should load successfully in development environment: {}",
            result
                .err()
                .map_or("Unknown error".to_string(), |e| e.to_string())
        );

        let settings = result.unwrap();
        assert!(
            !settings.database_url.is_empty(),
            "DATABASE_URL should be populated"
        );
        assert!(settings.port > 0, "PORT should be a valid port number");
    }
}
