//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TICKETSLAVE_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `TICKETSLAVE_DATABASE_PATH` - SQLite database file (default: ticketslave.db)
//! - `TICKETSLAVE_HOST` - Bind address (default: 127.0.0.1)
//! - `TICKETSLAVE_PORT` - Listen port (default: 3000)
//! - `TICKETSLAVE_BASE_URL` - Public URL, controls the Secure cookie flag
//!   (default: `http://localhost:3000`)
//! - `TICKETSLAVE_UPLOAD_DIR` - Attachment directory (default: uploads)
//! - `TICKETSLAVE_MAX_UPLOAD_BYTES` - Attachment size limit (default: 10 MiB)
//! - `TICKETSLAVE_ALLOWED_EXTENSIONS` - Comma-separated attachment extension
//!   allowlist; empty means any extension is accepted
//! - `TICKETSLAVE_ALLOW_REOPEN` - Whether closed tickets may be reopened
//!   (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Default attachment extension allowlist.
const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "csv", "doc", "docx", "gif", "jpeg", "jpg", "log", "md", "pdf", "png", "txt", "xls", "xlsx",
    "zip",
];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
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

/// TicketSlave application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite database file path
    pub database_path: PathBuf,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL; an `https://` base marks session cookies Secure
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Directory holding attachment files, one subdirectory per ticket
    pub upload_dir: PathBuf,
    /// Maximum accepted attachment size in bytes
    pub max_upload_bytes: u64,
    /// Allowed attachment extensions (lowercase, no dot); empty allows any
    pub allowed_extensions: Vec<String>,
    /// Whether closed tickets may transition back to open
    pub allow_reopen: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_path =
            PathBuf::from(get_env_or_default("TICKETSLAVE_DATABASE_PATH", "ticketslave.db"));
        let host = get_env_or_default("TICKETSLAVE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TICKETSLAVE_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("TICKETSLAVE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TICKETSLAVE_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_env_or_default("TICKETSLAVE_BASE_URL", "http://localhost:3000");

        let session_secret = get_validated_secret("TICKETSLAVE_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "TICKETSLAVE_SESSION_SECRET")?;

        let upload_dir = PathBuf::from(get_env_or_default("TICKETSLAVE_UPLOAD_DIR", "uploads"));
        let max_upload_bytes = match get_optional_env("TICKETSLAVE_MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "TICKETSLAVE_MAX_UPLOAD_BYTES".to_string(),
                    e.to_string(),
                )
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let allowed_extensions = match get_optional_env("TICKETSLAVE_ALLOWED_EXTENSIONS") {
            Some(raw) => parse_extension_list(&raw),
            None => DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        };
        let allow_reopen = match get_env_or_default("TICKETSLAVE_ALLOW_REOPEN", "true").as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "TICKETSLAVE_ALLOW_REOPEN".to_string(),
                    format!("expected true/false, got {other}"),
                ));
            }
        };
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_path,
            host,
            port,
            base_url,
            session_secret,
            upload_dir,
            max_upload_bytes,
            allowed_extensions,
            allow_reopen,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether an attachment extension is accepted.
    ///
    /// `extension` is compared case-insensitively; an empty allowlist
    /// accepts anything.
    #[must_use]
    pub fn is_extension_allowed(&self, extension: Option<&str>) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        extension.is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            self.allowed_extensions.iter().any(|allowed| *allowed == ext)
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

/// Parse a comma-separated extension list into lowercase entries.
fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
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
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets have high entropy)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            database_path: PathBuf::from("test.db"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(64)),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec!["png".to_string(), "txt".to_string()],
            allow_reopen: true,
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-session-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_extension_list() {
        let exts = parse_extension_list("PNG, .jpg,, txt ");
        assert_eq!(exts, vec!["png", "jpg", "txt"]);
    }

    #[test]
    fn test_extension_allowlist() {
        let config = test_config();
        assert!(config.is_extension_allowed(Some("png")));
        assert!(config.is_extension_allowed(Some("TXT")));
        assert!(!config.is_extension_allowed(Some("exe")));
        assert!(!config.is_extension_allowed(None));
    }

    #[test]
    fn test_empty_allowlist_accepts_anything() {
        let mut config = test_config();
        config.allowed_extensions.clear();
        assert!(config.is_extension_allowed(Some("exe")));
        assert!(config.is_extension_allowed(None));
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
