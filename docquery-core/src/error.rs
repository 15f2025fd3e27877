//! Error types and result types for facade operations.
//!
//! Every request method returns [`DocQueryResult<T>`]. Errors carry string
//! payloads so that a single initialization failure can be cloned out to
//! every caller that waited on it.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors produced by the query facade and its backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocQueryError {
    /// The client could not be created for the requested URI.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The pool is bound to a different URI than the one a request named.
    #[error("Client is bound to {bound}, request targeted {requested}")]
    ClientMismatch {
        bound: String,
        requested: String,
    },
    /// A filter was missing or could not be understood.
    #[error("Invalid criterion: {0}")]
    InvalidCriterion(String),
    /// An update document was malformed or used unsupported operators.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    /// Page or page size out of range.
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),
    /// No document matched a find-one filter.
    /// The first argument is the rendered filter, the second is the collection name.
    #[error("No document matching {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// A write was rejected because it would duplicate a unique key.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    /// Serialization/deserialization error when converting between document formats.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error reported by the underlying driver.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for facade operations.
pub type DocQueryResult<T> = Result<T, DocQueryError>;

impl From<BsonError> for DocQueryError {
    fn from(err: BsonError) -> Self {
        DocQueryError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocQueryError {
    fn from(err: SerdeJsonError) -> Self {
        DocQueryError::Serialization(err.to_string())
    }
}
