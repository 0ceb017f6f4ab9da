//! Credentials document parsing and validation.
//!
//! An Astra credentials file is a JSON object. Each semantic role may appear
//! under one of several aliases:
//!
//! | role       | accepted keys              |
//! |------------|----------------------------|
//! | `clientId` | `clientId`, `clientID`     |
//! | `secret`   | `clientSecret`, `secret`   |
//! | `token`    | `token`, `tokenJwt`        |
//!
//! A document is accepted when at least one authentication scheme is
//! complete: client id + secret, or token. Failures name the missing
//! canonical roles, never the aliases, and never include any value.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{ManagerError, Result};

/// A semantic field of a credentials document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialRole {
    ClientId,
    Secret,
    Token,
}

impl CredentialRole {
    /// All roles in canonical order.
    pub const ALL: [CredentialRole; 3] = [
        CredentialRole::ClientId,
        CredentialRole::Secret,
        CredentialRole::Token,
    ];

    /// Canonical role name used in messages.
    pub fn canonical_name(self) -> &'static str {
        match self {
            CredentialRole::ClientId => "clientId",
            CredentialRole::Secret => "secret",
            CredentialRole::Token => "token",
        }
    }

    /// JSON keys accepted for this role, in lookup order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CredentialRole::ClientId => &["clientId", "clientID"],
            CredentialRole::Secret => &["clientSecret", "secret"],
            CredentialRole::Token => &["token", "tokenJwt"],
        }
    }
}

impl fmt::Display for CredentialRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// A parsed credentials document.
///
/// `Debug` is implemented by hand so the values never end up in logs.
#[derive(Clone)]
pub struct CredentialsDocument {
    fields: Map<String, Value>,
    raw: String,
}

impl fmt::Debug for CredentialsDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsDocument")
            .field("client_id", &self.has(CredentialRole::ClientId))
            .field("secret", &self.has(CredentialRole::Secret))
            .field("token", &self.has(CredentialRole::Token))
            .finish()
    }
}

impl CredentialsDocument {
    /// Parse a credentials document from JSON text.
    ///
    /// Only checks that the text is a JSON object; see [`Self::validate`].
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|_| ManagerError::validation("Credentials file is not valid JSON"))?;
        let Value::Object(fields) = value else {
            return Err(ManagerError::validation(
                "Credentials file must contain a JSON object",
            ));
        };
        Ok(Self {
            fields,
            raw: text.to_string(),
        })
    }

    /// First non-blank string value among the role's aliases.
    pub fn get(&self, role: CredentialRole) -> Option<&str> {
        role.aliases()
            .iter()
            .filter_map(|key| self.fields.get(*key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    /// Whether the role is satisfied by any alias.
    pub fn has(&self, role: CredentialRole) -> bool {
        self.get(role).is_some()
    }

    /// The bearer token, if present.
    pub fn token(&self) -> Option<&str> {
        self.get(CredentialRole::Token)
    }

    /// Roles not satisfied by any alias, in canonical order.
    pub fn missing_roles(&self) -> Vec<CredentialRole> {
        CredentialRole::ALL
            .into_iter()
            .filter(|role| !self.has(*role))
            .collect()
    }

    /// Check that at least one authentication scheme is complete.
    pub fn validate(&self) -> Result<()> {
        let client_pair = self.has(CredentialRole::ClientId) && self.has(CredentialRole::Secret);
        if client_pair || self.has(CredentialRole::Token) {
            return Ok(());
        }
        let missing: Vec<&str> = self
            .missing_roles()
            .into_iter()
            .map(CredentialRole::canonical_name)
            .collect();
        Err(ManagerError::validation(format!(
            "Credentials are missing required fields: {}",
            missing.join(", ")
        )))
    }

    /// The original document text, as stored in the secret store.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Read, parse and validate a credentials file.
pub async fn validate_credentials(path: &Path) -> Result<CredentialsDocument> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ManagerError::validation(format!("Credentials file not found: {}", path.display()))
        } else {
            ManagerError::validation(format!(
                "Cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        }
    })?;
    let doc = CredentialsDocument::parse(&text)?;
    doc.validate()?;
    Ok(doc)
}
