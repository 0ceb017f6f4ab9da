//! The `{ success, ... }` result shape returned by every manager operation.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::store::DatabaseEntry;

/// Outcome of a manager operation.
///
/// Serializes flat: `success`, then the payload's fields, then `message`
/// when there is one. Failures carry no payload.
#[derive(Debug, Clone, Serialize)]
pub struct Reply<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl<T> From<Result<T>> for Reply<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Reply::ok(data),
            Err(e) => Reply::failure(e.to_string()),
        }
    }
}

/// No payload beyond `success` and `message`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Empty {}

#[derive(Debug, Clone, Serialize)]
pub struct SaveData {
    pub db: DatabaseEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntriesData {
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleConfigData {
    pub config: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabasesData {
    pub databases: Vec<DatabaseEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCqlData {
    #[serde(rename = "createCql")]
    pub create_cql: String,
}
