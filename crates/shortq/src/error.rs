//! Error types for shortq
//!
//! Two layers:
//! - [`DbError`] carries full driver/pool/codec detail and never leaves the crate
//!   boundary without being logged first.
//! - [`OpError`] is what the operation surface returns to the routing layer. It
//!   carries no driver text.

use crate::codec::CodecError;
use thiserror::Error;

/// Result type alias for internal database operations
pub type DbResult<T> = Result<T, DbError>;

/// Result type alias for the caller-facing operations
pub type OpResult<T> = Result<T, OpError>;

/// Internal error types for statement execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Secret column transform error
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a codec error
    pub fn is_codec(&self) -> bool {
        matches!(self, Self::Codec(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

/// Failure signal returned across the operation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    /// Caller contract violation (mismatched positional arrays, bad identifiers, ...).
    /// Raised before any SQL is built.
    #[error("Invalid request: {0}")]
    Contract(String),

    /// The secret column transform could not be applied.
    #[error("Secret column transform failed")]
    Codec,

    /// Statement execution failed. Details are logged, not returned.
    #[error("Query failed")]
    Failed,
}

impl OpError {
    /// Create a contract violation error
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }

    /// Check if this is a contract violation
    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract(_))
    }
}

impl From<DbError> for OpError {
    fn from(err: DbError) -> Self {
        if err.is_codec() {
            Self::Codec
        } else {
            Self::Failed
        }
    }
}
