use base64::{engine::general_purpose, Engine as _};
use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
pub const DEFAULT_VERIFICATION_TTL_HOURS: i64 = 24;

/// Minimum length of the decoded JWT signing secret.
const MIN_SECRET_KEY_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// HMAC secret for signing access tokens (decoded from base64).
    pub secret_key: Vec<u8>,
    pub access_token_ttl_minutes: i64,
    pub verification_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub app_name: String,
    /// Public base URL used to build verification links in emails.
    pub public_base_url: String,
    pub no_reply_email: String,
    /// When absent, outbound email delivery is disabled.
    pub sendgrid_api_key: Option<SecretString>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let secret_key_base64 = vars
            .get("SECRET_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("SECRET_KEY".to_string()))?;

        let secret_key = general_purpose::STANDARD
            .decode(secret_key_base64)
            .map_err(ConfigError::Base64Error)?;

        if secret_key.len() < MIN_SECRET_KEY_BYTES {
            return Err(ConfigError::InvalidSecretKey(format!(
                "Expected at least {} bytes, got {}",
                MIN_SECRET_KEY_BYTES,
                secret_key.len()
            )));
        }

        let access_token_ttl_minutes =
            parse_i64(vars, "ACCESS_TOKEN_TTL_MINUTES", DEFAULT_ACCESS_TOKEN_TTL_MINUTES)?;
        let verification_ttl_hours =
            parse_i64(vars, "VERIFICATION_TTL_HOURS", DEFAULT_VERIFICATION_TTL_HOURS)?;

        let bcrypt_cost = match vars.get("BCRYPT_COST") {
            Some(value) => value.parse::<u32>().map_err(|_| {
                ConfigError::InvalidEnvVar("BCRYPT_COST".to_string(), value.clone())
            })?,
            None => DEFAULT_BCRYPT_COST,
        };

        let app_name = vars
            .get("APP_NAME")
            .cloned()
            .unwrap_or_else(|| "Portal".to_string());

        let public_base_url = vars
            .get("PUBLIC_BASE_URL")
            .cloned()
            .unwrap_or_else(|| format!("http://{}", bind_address));

        let no_reply_email = vars
            .get("NO_REPLY_EMAIL")
            .cloned()
            .unwrap_or_else(|| "no-reply@portal.local".to_string());

        let sendgrid_api_key = vars
            .get("SENDGRID_API_KEY")
            .map(|key| SecretString::from(key.clone()));

        Ok(Config {
            database_url,
            bind_address,
            secret_key,
            access_token_ttl_minutes,
            verification_ttl_hours,
            bcrypt_cost,
            app_name,
            public_base_url,
            no_reply_email,
            sendgrid_api_key,
        })
    }
}

fn parse_i64(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    match vars.get(name) {
        Some(value) => value
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), value.clone())),
        None => Ok(default),
    }
}
