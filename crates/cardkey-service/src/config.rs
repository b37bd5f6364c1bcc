//! Service configuration.

use cardkey_core::DEFAULT_PREFIX;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/cardkey").
    pub data_dir: String,

    /// Prefix used when a generate request leaves it blank (default: "VIP").
    pub default_prefix: String,

    /// Largest batch a single generate request may ask for.
    pub max_batch_size: usize,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            default_prefix: std::env::var("DEFAULT_PREFIX")
                .ok()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.default_prefix),
            max_batch_size: env_parse("MAX_BATCH_SIZE").unwrap_or(defaults.max_batch_size),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

/// Read and parse an environment variable, ignoring unset or malformed values.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(name, value = %raw, "Ignoring malformed configuration value");
            None
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/cardkey".into(),
            default_prefix: DEFAULT_PREFIX.into(),
            max_batch_size: 1000,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.default_prefix, "VIP");
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn env_parse_ignores_garbage() {
        // Names unique to this test.
        std::env::set_var("CARDKEY_TEST_GOOD_NUMBER", " 42 ");
        std::env::set_var("CARDKEY_TEST_BAD_NUMBER", "lots");

        assert_eq!(env_parse::<usize>("CARDKEY_TEST_GOOD_NUMBER"), Some(42));
        assert_eq!(env_parse::<usize>("CARDKEY_TEST_BAD_NUMBER"), None);
        assert_eq!(env_parse::<usize>("CARDKEY_TEST_UNSET_NUMBER"), None);
    }
}
