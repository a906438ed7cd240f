//! Unified error types for the `TrackVault` core.
//!
//! Settlement failures are all-or-nothing: whenever one of these errors is
//! returned from a core operation, the wallets, ledger, ownership registry,
//! and counters are exactly as they were before the call.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The referenced entity is missing or has been soft-deleted.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up (e.g. `"track"`, `"pack"`)
        entity: &'static str,
        /// Identifier used for the lookup
        id: String,
    },

    /// The buyer's wallet cannot cover the requested charge.
    #[error("insufficient tokens: need {required}, have {available}")]
    InsufficientFunds {
        /// Tokens the operation would have charged
        required: i64,
        /// Tokens actually available in the wallet
        available: i64,
    },

    /// A record that must be unique already exists. Settlement callers treat
    /// this as "already owned" rather than a hard failure.
    #[error("conflict: {message}")]
    Conflict {
        /// What already exists
        message: String,
    },

    /// Malformed input: empty track set, unknown token package, and similar.
    #[error("invalid request: {message}")]
    Invalid {
        /// What was wrong with the request
        message: String,
    },

    /// Configuration loading or validation failure.
    #[error("configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying store error. Transient connectivity failures in this class
    /// are retried by [`crate::core::retry`] before being surfaced.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (config file reads).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds a [`Error::NotFound`] for an id-keyed entity.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Whether a store error is a unique-constraint violation. Settlement leans
/// on this to turn a lost purchase race into an "already owned" outcome.
pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
