//! Back-office configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SAV_BASE_URL` - Public URL of the back office
//! - `FIRESTORE_PROJECT_ID` - Firestore project (when the backend is `firestore`)
//!
//! ## Optional
//! - `SAV_HOST` - Bind address (default: 127.0.0.1)
//! - `SAV_PORT` - Listen port (default: 3001)
//! - `SAV_STORE_BACKEND` - `firestore` or `memory` (default: firestore)
//! - `FIRESTORE_API_KEY` - Web API key sent as the `key` query parameter
//! - `FIRESTORE_EMULATOR_HOST` - `host:port` of a local emulator
//! - `SAV_STORE_PINS` - Store table override, `CODE:PIN[:Name],...`
//! - `SAV_MAX_PIN_ATTEMPTS` - Failures before lockout (default: 3)
//! - `SAV_LOCKOUT_SECONDS` - Lockout duration (default: 300)
//! - `SAV_SESSION_HOURS` - Session lifetime (default: 24)
//! - `SAV_REMEMBER_DAYS` - "Remember me" session lifetime (default: 30)
//! - `SAV_REFRESH_SECONDS` - Dashboard auto-refresh period (default: 60)
//! - `SAV_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking
//!
//! ## Optional (TLS)
//! - `SAV_TLS_CERT` - PEM-encoded certificate chain
//! - `SAV_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;

use chrono::TimeDelta;
use sav_core::{AuthPolicy, DirectoryError, StoreDirectory};
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
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
    #[error("Invalid store table in SAV_STORE_PINS: {0}")]
    StoreTable(#[from] DirectoryError),
}

/// Which document store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local, lost on restart.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidEnvVar(
                "SAV_STORE_BACKEND".to_string(),
                format!("unknown backend '{other}' (expected firestore or memory)"),
            )),
        }
    }
}

/// Back-office configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Document store backend
    pub backend: StoreBackend,
    /// Firestore connection (required for the firestore backend)
    pub firestore: Option<FirestoreConfig>,
    /// Stores and their PINs
    pub directory: StoreDirectory,
    /// Lockout and session lifetimes
    pub auth: AuthPolicy,
    /// Dashboard auto-refresh period in seconds
    pub refresh_seconds: u32,
    /// Emit JSON logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Firestore REST connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirestoreConfig {
    /// Google Cloud project id
    pub project_id: String,
    /// Web API key, appended to every request
    pub api_key: Option<SecretString>,
    /// `host:port` of a local emulator; switches to plain HTTP
    pub emulator_host: Option<String>,
}

impl std::fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("emulator_host", &self.emulator_host)
            .finish()
    }
}

impl FirestoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let emulator_host = get_optional_env("FIRESTORE_EMULATOR_HOST");
        let api_key = match get_optional_env("FIRESTORE_API_KEY") {
            Some(key) => {
                validate_secret_strength(&key, "FIRESTORE_API_KEY")?;
                Some(SecretString::from(key))
            }
            None => None,
        };
        if api_key.is_none() && emulator_host.is_none() {
            tracing::warn!("FIRESTORE_API_KEY not set; requests rely on open security rules");
        }

        Ok(Self {
            project_id: get_required_env("FIRESTORE_PROJECT_ID")?,
            api_key,
            emulator_host,
        })
    }

    /// Documents root URL, e.g.
    /// `https://firestore.googleapis.com/v1/projects/p/databases/(default)/documents`.
    #[must_use]
    pub fn documents_url(&self) -> String {
        let origin = self.emulator_host.as_ref().map_or_else(
            || "https://firestore.googleapis.com".to_string(),
            |host| format!("http://{}", host.trim_end_matches('/')),
        );
        format!(
            "{origin}/v1/projects/{}/databases/(default)/documents",
            self.project_id
        )
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("SAV_TLS_CERT");
        let key_pem = get_optional_env("SAV_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SAV_TLS_*".to_string(),
                "Both SAV_TLS_CERT and SAV_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("SAV_HOST", "127.0.0.1")?;
        let port = parse_env("SAV_PORT", "3001")?;
        let base_url = get_required_env("SAV_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SAV_BASE_URL".to_string(), e.to_string()))?;

        let backend: StoreBackend = get_env_or_default("SAV_STORE_BACKEND", "firestore").parse()?;
        let firestore = match backend {
            StoreBackend::Firestore => Some(FirestoreConfig::from_env()?),
            StoreBackend::Memory => None,
        };

        let directory = match get_optional_env("SAV_STORE_PINS") {
            Some(table) => StoreDirectory::parse(&table)?,
            None => StoreDirectory::builtin(),
        };

        let auth = AuthPolicy {
            max_attempts: parse_env("SAV_MAX_PIN_ATTEMPTS", "3")?,
            lockout: duration_env("SAV_LOCKOUT_SECONDS", "300", 1..=86_400, TimeDelta::try_seconds)?,
            session_ttl: duration_env("SAV_SESSION_HOURS", "24", 1..=8_784, TimeDelta::try_hours)?,
            remember_ttl: duration_env("SAV_REMEMBER_DAYS", "30", 1..=3_660, TimeDelta::try_days)?,
        };
        if auth.max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SAV_MAX_PIN_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            firestore,
            directory,
            auth,
            refresh_seconds: parse_env("SAV_REFRESH_SECONDS", "60")?,
            log_json: get_optional_env("SAV_LOG_JSON").is_some(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls: TlsConfig::from_env()?,
        })
    }

    /// In-memory configuration with the built-in store table.
    ///
    /// Used by tests and local tooling.
    #[must_use]
    pub fn local(base_url: &str) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: base_url.to_string(),
            backend: StoreBackend::Memory,
            firestore: None,
            directory: StoreDirectory::builtin(),
            auth: AuthPolicy::default(),
            refresh_seconds: 60,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked secure.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Read a whole number of `unit`s from the environment.
fn duration_env(
    key: &str,
    default: &str,
    range: RangeInclusive<u32>,
    unit: fn(i64) -> Option<TimeDelta>,
) -> Result<TimeDelta, ConfigError> {
    parse_duration(key, &get_env_or_default(key, default), range, unit)
}

/// Parse a count within `range` and turn it into a duration.
fn parse_duration(
    key: &str,
    raw: &str,
    range: RangeInclusive<u32>,
    unit: fn(i64) -> Option<TimeDelta>,
) -> Result<TimeDelta, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar(key.to_string(), reason);
    let count = raw
        .trim()
        .parse::<u32>()
        .map_err(|e| invalid(e.to_string()))?;
    if !range.contains(&count) {
        return Err(invalid(format!(
            "must be between {} and {}",
            range.start(),
            range.end()
        )));
    }
    unit(i64::from(count)).ok_or_else(|| invalid("duration out of range".to_string()))
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
    let len = s.chars().count() as f64;
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
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-firestore-key", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("AIzaSyD4r9Kq2mXbT7vLw1pHc8nZ0eUf3gJ6sQ", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_durations_must_be_positive_and_bounded() {
        assert_eq!(
            parse_duration("SAV_LOCKOUT_SECONDS", "300", 1..=86_400, TimeDelta::try_seconds).unwrap(),
            TimeDelta::minutes(5)
        );
        for raw in ["-5", "0", "86401", "99999999999999", "soon"] {
            assert!(
                matches!(
                    parse_duration("SAV_LOCKOUT_SECONDS", raw, 1..=86_400, TimeDelta::try_seconds),
                    Err(ConfigError::InvalidEnvVar(..))
                ),
                "{raw} should be refused"
            );
        }
        assert!(parse_duration("SAV_REMEMBER_DAYS", "3660", 1..=3_660, TimeDelta::try_days).is_ok());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(
            " firestore ".parse::<StoreBackend>().unwrap(),
            StoreBackend::Firestore
        );
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_documents_url() {
        let mut config = FirestoreConfig {
            project_id: "sav-audition".to_string(),
            api_key: None,
            emulator_host: None,
        };
        assert_eq!(
            config.documents_url(),
            "https://firestore.googleapis.com/v1/projects/sav-audition/databases/(default)/documents"
        );

        config.emulator_host = Some("localhost:8080".to_string());
        assert_eq!(
            config.documents_url(),
            "http://localhost:8080/v1/projects/sav-audition/databases/(default)/documents"
        );
    }

    #[test]
    fn test_firestore_config_debug_redacts_key() {
        let config = FirestoreConfig {
            project_id: "sav-audition".to_string(),
            api_key: Some(SecretString::from("AIzaSuperSecretKey")),
            emulator_host: None,
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("sav-audition"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaSuperSecretKey"));
    }

    #[test]
    fn test_local_config() {
        let config = AdminConfig::local("http://localhost:3001");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
        assert!(!config.is_https());
        assert_eq!(config.auth.max_attempts, 3);
    }
}
