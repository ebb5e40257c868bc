use std::env;
use std::time::Duration;

use validator::Validate;

use crate::errors::SessionResult;

#[derive(Clone, Debug, Validate)]
pub struct Config {
    #[validate(url)]
    pub api_base_url: String,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
    #[validate(length(min = 1, max = 100))]
    pub token_storage_key: String,
    #[validate(length(min = 1, max = 100))]
    pub credential_storage_key: String,
    pub require_credential: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("QUIGO_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
            request_timeout_secs: env::var("QUIGO_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
            token_storage_key: env::var("QUIGO_TOKEN_STORAGE_KEY")
                .unwrap_or_else(|_| "token".to_string()),
            credential_storage_key: env::var("QUIGO_CREDENTIAL_STORAGE_KEY")
                .unwrap_or_else(|_| "api_key".to_string()),
            require_credential: env::var("QUIGO_REQUIRE_CREDENTIAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
        }
    }

    /// Reads `.env` if present, then the environment, and validates the result.
    pub fn load() -> SessionResult<Self> {
        if let Err(err) = dotenvy::dotenv() {
            log::debug!("No .env file loaded: {}", err);
        }
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 5,
            token_storage_key: "token".to_string(),
            credential_storage_key: "api_key".to_string(),
            require_credential: true,
        }
    }
}
