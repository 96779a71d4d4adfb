use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A lookup key that the registry does not declare.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// Input whose width or encoding doesn't match what the platform expects.
    #[error("invalid {format} address: {reason}")]
    InvalidAddress { format: String, reason: String },

    /// Malformed registry data: a key or value that must be unique appears twice.
    #[error("duplicate entry in {table}: {key}")]
    DuplicateEntry { table: &'static str, key: String },

    /// Malformed registry data: an entry that contradicts another table.
    #[error("invalid entry in {table}: {key}")]
    InvalidEntry { table: &'static str, key: String },
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, key: impl fmt::Display) -> Self {
        Error::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid_address(format: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Error::InvalidAddress {
            format: format.to_string(),
            reason: reason.to_string(),
        }
    }
}
