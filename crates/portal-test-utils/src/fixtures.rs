//! Shared test fixtures.

use base64::{engine::general_purpose, Engine as _};
use portal_service::config::Config;
use std::collections::HashMap;

/// A password satisfying the signup policy.
pub const STRONG_PASSWORD: &str = "Aa1$aaaa";

/// Deterministic test configuration.
///
/// Uses a fixed signing secret and a low bcrypt cost so E2E tests stay
/// fast; production defaults to cost 12.
pub fn test_config() -> Config {
    let vars = HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://localhost/unused-in-tests".to_string(),
        ),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        (
            "SECRET_KEY".to_string(),
            general_purpose::STANDARD.encode([7u8; 32]),
        ),
        ("BCRYPT_COST".to_string(), "4".to_string()),
        ("APP_NAME".to_string(), "Portal Test".to_string()),
    ]);

    Config::from_vars(&vars).expect("test config should load")
}
