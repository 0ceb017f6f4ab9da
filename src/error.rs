//! Unified error type for astradb-manager.
//!
//! Internal APIs return `Result<T, ManagerError>`. The variants follow the
//! failure categories callers need to tell apart (archive, structural
//! validation, connectivity, lookup, persistence) while remaining easy to
//! construct from string messages. The manager boundary converts every error
//! into a `{ success: false, message }` reply, so nothing here ever reaches a
//! caller as a raised fault.

use std::fmt;

/// The unified error type for all astradb-manager operations.
#[derive(Debug)]
pub enum ManagerError {
    // ── I/O & filesystem ───────────────────────────────────────────────
    /// Filesystem or I/O operation failed.
    Io(std::io::Error),

    // ── Serialization ──────────────────────────────────────────────────
    /// JSON serialization/deserialization error.
    Json(serde_json::Error),

    /// KDL config file parsing error.
    Config(String),

    // ── Bundle & credentials ───────────────────────────────────────────
    /// The bundle could not be opened as a zip archive, or an entry could
    /// not be read.
    Archive(String),

    /// A bundle or credentials document failed a structural check.
    Validation(String),

    // ── Remote service ─────────────────────────────────────────────────
    /// Handshake failure, timeout, or authentication rejection.
    Connectivity(String),

    // ── Lookup errors ──────────────────────────────────────────────────
    /// A saved database, keyspace, table or type was not found.
    NotFound(String),

    // ── Local state ────────────────────────────────────────────────────
    /// Writing the managed directory or the database index failed.
    Persistence(String),

    /// The OS secret store rejected an operation.
    Keychain(String),

    // ── Catch-all ──────────────────────────────────────────────────────
    /// Any other error.
    Other(String),
}

// ── Display ────────────────────────────────────────────────────────────

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerError::Io(e) => write!(f, "{}", e),
            ManagerError::Json(e) => write!(f, "JSON error: {}", e),
            ManagerError::Config(msg) => write!(f, "config error: {}", msg),
            ManagerError::Archive(msg) => write!(f, "{}", msg),
            ManagerError::Validation(msg) => write!(f, "{}", msg),
            ManagerError::Connectivity(msg) => write!(f, "{}", msg),
            ManagerError::NotFound(msg) => write!(f, "{}", msg),
            ManagerError::Persistence(msg) => write!(f, "{}", msg),
            ManagerError::Keychain(msg) => write!(f, "secret store error: {}", msg),
            ManagerError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManagerError::Io(e) => Some(e),
            ManagerError::Json(e) => Some(e),
            _ => None,
        }
    }
}

// ── From implementations for common error types ────────────────────────

impl From<std::io::Error> for ManagerError {
    fn from(e: std::io::Error) -> Self {
        ManagerError::Io(e)
    }
}

impl From<serde_json::Error> for ManagerError {
    fn from(e: serde_json::Error) -> Self {
        ManagerError::Json(e)
    }
}

impl From<zip::result::ZipError> for ManagerError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::InvalidArchive(_) | zip::result::ZipError::UnsupportedArchive(_) => {
                ManagerError::Archive(format!("Bundle is not a valid zip file: {}", e))
            }
            other => ManagerError::Archive(format!("Failed to read bundle: {}", other)),
        }
    }
}

impl From<keyring::Error> for ManagerError {
    fn from(e: keyring::Error) -> Self {
        ManagerError::Keychain(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ManagerError {
    fn from(e: tokio::task::JoinError) -> Self {
        ManagerError::Other(format!("background task failed: {}", e))
    }
}

impl From<String> for ManagerError {
    fn from(s: String) -> Self {
        ManagerError::Other(s)
    }
}

impl From<&str> for ManagerError {
    fn from(s: &str) -> Self {
        ManagerError::Other(s.to_string())
    }
}

// ── Convenience constructors ───────────────────────────────────────────

impl ManagerError {
    /// Create an archive error.
    pub fn archive(message: impl Into<String>) -> Self {
        ManagerError::Archive(message.into())
    }

    /// Create a structural validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ManagerError::Validation(message.into())
    }

    /// Create a connectivity error.
    pub fn connectivity(message: impl Into<String>) -> Self {
        ManagerError::Connectivity(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ManagerError::NotFound(message.into())
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        ManagerError::Persistence(message.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        ManagerError::Config(message.into())
    }

    /// Create a connectivity error from a driver failure, translating the
    /// common CQL driver errors into user-friendly messages.
    pub fn driver(e: impl std::fmt::Display) -> Self {
        let msg = e.to_string();
        let lower = msg.to_lowercase();

        let friendly = if lower.contains("authentication") || lower.contains("bad credentials") {
            "Authentication rejected (check the token)".to_string()
        } else if lower.contains("timed out") || lower.contains("timeout") {
            "Connection attempt timed out".to_string()
        } else if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
            format!("TLS handshake failed ({})", msg)
        } else if lower.contains("connection refused") || lower.contains("failed to resolve") {
            "Remote service unreachable (check network access)".to_string()
        } else if lower.contains("no known nodes") || lower.contains("all connections") {
            "No reachable database nodes".to_string()
        } else {
            msg
        };

        ManagerError::Connectivity(friendly)
    }

    /// Strip `secret` from the message, keeping the category.
    pub fn redacted(self, secret: &str) -> Self {
        match self {
            ManagerError::Archive(m) => ManagerError::Archive(redact(&m, secret)),
            ManagerError::Validation(m) => ManagerError::Validation(redact(&m, secret)),
            ManagerError::Connectivity(m) => ManagerError::Connectivity(redact(&m, secret)),
            ManagerError::NotFound(m) => ManagerError::NotFound(redact(&m, secret)),
            ManagerError::Persistence(m) => ManagerError::Persistence(redact(&m, secret)),
            ManagerError::Keychain(m) => ManagerError::Keychain(redact(&m, secret)),
            ManagerError::Other(m) => ManagerError::Other(redact(&m, secret)),
            other => other,
        }
    }
}

/// Replace every occurrence of `secret` in `message` with `***`.
///
/// Messages built from third-party error text go through this before they
/// leave the crate. Blank secrets leave the message untouched.
pub fn redact(message: &str, secret: &str) -> String {
    if secret.trim().is_empty() {
        return message.to_string();
    }
    message.replace(secret, "***")
}

/// Convenience type alias for Results using ManagerError.
pub type Result<T> = std::result::Result<T, ManagerError>;
