//! Connection targets: where an operation runs.

use std::fmt;
use serde::{Deserialize, Serialize};


/// The URI, database and collection a request operates on.
///
/// Targets are plain values built per call site. They can also be loaded
/// from configuration:
///
/// ```ignore
/// let target: ConnectionTarget = serde_json::from_str(r#"{
///     "uri": "mongodb://localhost:27017",
///     "database": "app",
///     "collection": "users"
/// }"#)?;
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Connection string of the deployment.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
}

impl ConnectionTarget {
    pub fn new(uri: impl Into<String>, database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// The database/collection pair handed to backends.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.database, &self.collection)
    }
}

/// A `(database, collection)` pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_target_from_json_config() {
        let target: ConnectionTarget = serde_json::from_str(
            r#"{"uri": "mongodb://db:27017", "database": "app", "collection": "users"}"#,
        )
        .unwrap();

        assert_eq!(target, ConnectionTarget::new("mongodb://db:27017", "app", "users"));
        assert_eq!(target.namespace().to_string(), "app.users");
    }

    #[test]
    fn rejects_incomplete_target_config() {
        let result = serde_json::from_str::<ConnectionTarget>(r#"{"uri": "mongodb://db"}"#);

        assert!(result.is_err());
    }
}
