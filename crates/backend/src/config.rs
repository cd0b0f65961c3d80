//! Backend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DUTCHNED_API_URL` - DutchNed delivery-date endpoint
//! - `DUTCHNED_API_CREDENTIALS` - Basic credentials as `user:password`
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ADMIN_ACCESS_TOKEN` - Admin API access token (HIGH PRIVILEGE)
//! - `SHOPIFY_API_SECRET` - App secret used to verify webhook HMACs
//!
//! ## Optional
//! - `BACKEND_HOST` - Bind address (default: 127.0.0.1)
//! - `BACKEND_PORT` - Listen port (default: 3002)
//! - `API_TIMEOUT` - DutchNed request timeout in milliseconds (default: 10000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `SHIPPING_FUNCTION_ID` - Shipping-method function id, required to install
//!   the delivery customization
//! - `WRITE_QUEUE_CAPACITY` - Pending Admin API writes (default: 1024)
//! - `WRITE_QUEUE_RATE_PER_SECOND` - Admin API writes per second (default: 2)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default DutchNed request timeout.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of queued Admin API writes.
pub const DEFAULT_WRITE_QUEUE_CAPACITY: usize = 1024;

/// Default Admin API write rate.
pub const DEFAULT_WRITE_QUEUE_RATE_PER_SECOND: u32 = 2;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Backend application configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// DutchNed scheduling API
    pub dutchned: DutchNedConfig,
    /// Shopify Admin API and webhooks
    pub shopify: ShopifyAdminConfig,
    /// Admin API write queue
    pub write_queue: WriteQueueConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// DutchNed scheduling API configuration.
///
/// Implements `Debug` manually to redact the credentials.
#[derive(Clone)]
pub struct DutchNedConfig {
    pub api_url: Url,
    /// Basic credentials, `user:password`
    pub credentials: SecretString,
    pub timeout: Duration,
}

impl std::fmt::Debug for DutchNedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DutchNedConfig")
            .field("api_url", &self.api_url.as_str())
            .field("credentials", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the HIGH PRIVILEGE credentials.
#[derive(Clone)]
pub struct ShopifyAdminConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Admin API access token (HIGH PRIVILEGE)
    pub access_token: SecretString,
    /// App secret for webhook HMAC verification
    pub api_secret: SecretString,
    /// Function id the delivery customization points at
    pub shipping_function_id: Option<String>,
}

impl std::fmt::Debug for ShopifyAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAdminConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("shipping_function_id", &self.shipping_function_id)
            .finish()
    }
}

/// Write queue sizing and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteQueueConfig {
    pub capacity: usize,
    pub rate_per_second: NonZeroU32,
}

impl Default for WriteQueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WRITE_QUEUE_CAPACITY,
            rate_per_second: NonZeroU32::new(DEFAULT_WRITE_QUEUE_RATE_PER_SECOND)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("BACKEND_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BACKEND_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_PORT".to_string(), e.to_string()))?;

        let dutchned = DutchNedConfig::from_env()?;
        let shopify = ShopifyAdminConfig::from_env()?;
        let write_queue = WriteQueueConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            dutchned,
            shopify,
            write_queue,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DutchNedConfig {
    /// Load the DutchNed settings alone, for tools that only call the API.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_url("DUTCHNED_API_URL", &get_required_env("DUTCHNED_API_URL")?)?;
        let credentials = get_required_env("DUTCHNED_API_CREDENTIALS")?;
        validate_credentials(&credentials, "DUTCHNED_API_CREDENTIALS")?;
        let timeout = parse_timeout_ms(
            "API_TIMEOUT",
            get_optional_env("API_TIMEOUT").as_deref(),
        )?;

        Ok(Self {
            api_url,
            credentials: SecretString::from(credentials),
            timeout,
        })
    }

    /// Split the credentials into user and password.
    #[must_use]
    pub fn basic_auth(&self) -> (String, String) {
        let raw = self.credentials.expose_secret();
        raw.split_once(':').map_or_else(
            || (raw.to_string(), String::new()),
            |(user, password)| (user.to_string(), password.to_string()),
        )
    }
}

impl ShopifyAdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2026-01"),
            access_token: get_validated_secret("SHOPIFY_ADMIN_ACCESS_TOKEN")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            shipping_function_id: get_optional_env("SHIPPING_FUNCTION_ID")
                .filter(|id| !id.trim().is_empty()),
        })
    }

    /// Admin GraphQL endpoint for this store and API version.
    #[must_use]
    pub fn graphql_endpoint(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.store, self.api_version
        )
    }
}

impl WriteQueueConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let capacity = get_env_or_default(
            "WRITE_QUEUE_CAPACITY",
            &DEFAULT_WRITE_QUEUE_CAPACITY.to_string(),
        )
        .parse::<usize>()
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "WRITE_QUEUE_CAPACITY".to_string(),
                "must be a positive integer".to_string(),
            )
        })?;
        let rate_per_second = get_env_or_default(
            "WRITE_QUEUE_RATE_PER_SECOND",
            &DEFAULT_WRITE_QUEUE_RATE_PER_SECOND.to_string(),
        )
        .parse::<NonZeroU32>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("WRITE_QUEUE_RATE_PER_SECOND".to_string(), e.to_string())
        })?;

        Ok(Self {
            capacity,
            rate_per_second,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse a millisecond timeout, defaulting to [`DEFAULT_API_TIMEOUT`].
fn parse_timeout_ms(var_name: &str, raw: Option<&str>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_API_TIMEOUT);
    };
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                var_name.to_string(),
                format!("expected a positive number of milliseconds, got '{raw}'"),
            )
        })
}

/// Check that credentials look like `user:password` and are not a placeholder.
fn validate_credentials(credentials: &str, var_name: &str) -> Result<(), ConfigError> {
    match credentials.split_once(':') {
        Some((user, password)) if !user.is_empty() && !password.is_empty() => {
            check_placeholder(credentials, var_name)
        }
        _ => Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "expected 'user:password'".to_string(),
        )),
    }
}

fn check_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    check_placeholder(secret, var_name)?;

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
