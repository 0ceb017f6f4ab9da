//! Utility functions shared across the application.

pub(crate) mod permissions;

pub use permissions::{copy_private, restrict_file_permissions};
