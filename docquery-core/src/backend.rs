//! Driver abstraction behind the query facade.
//!
//! The facade never talks to a database directly. It asks a
//! [`ClientConnector`] for a client once, then calls the [`ClientBackend`]
//! primitives (find, find-one, insert-one, update-one, delete-one) on it.
//!
//! # Traits
//!
//! - [`ClientBackend`]: one connected client, shared by every request
//! - [`ClientConnector`]: creates a client from a connection string

use async_trait::async_trait;
use bson::Document;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::{error::DocQueryResult, page::Pagination, target::Namespace};

/// Result of a single-document update.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents that matched the filter (0 or 1).
    pub matched_count: u64,
    /// Documents whose content actually changed.
    pub modified_count: u64,
}

impl UpdateOutcome {
    /// `true` when the filter matched no document.
    pub fn is_unmatched(&self) -> bool {
        self.matched_count == 0
    }
}

/// Result of a single-document delete.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Documents removed (0 or 1).
    pub deleted_count: u64,
}

impl DeleteOutcome {
    /// `true` when the filter matched no document.
    pub fn is_unmatched(&self) -> bool {
        self.deleted_count == 0
    }
}

/// A connected document-database client.
///
/// Implementations must be safe to share across tasks; a single client serves
/// every request made through a [`ClientPool`](crate::pool::ClientPool).
///
/// Filters and update documents arrive in driver-native form and must be
/// honored as given. Backends report failures through the returned error and
/// leave logging to the facade.
#[async_trait]
pub trait ClientBackend: Send + Sync + Debug {
    /// Returns every document matching `filter`, fully buffered, in the
    /// collection's natural order.
    ///
    /// When `pagination` is given, only that page of the matches is returned.
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        pagination: Option<Pagination>,
    ) -> DocQueryResult<Vec<Document>>;

    /// Returns the first document matching `filter`, or `None`.
    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> DocQueryResult<Option<Document>>;

    /// Inserts one document verbatim.
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> DocQueryResult<()>;

    /// Applies `update` (an operator document such as `{ "$set": ... }`) to
    /// the first document matching `filter`.
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> DocQueryResult<UpdateOutcome>;

    /// Deletes the first document matching `filter`.
    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> DocQueryResult<DeleteOutcome>;

    /// Releases the client's resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocQueryResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Creates a [`ClientBackend`] from a connection string.
#[async_trait]
pub trait ClientConnector: Send + Sync {
    type Backend: ClientBackend;

    async fn connect(&self, uri: &str) -> DocQueryResult<Self::Backend>;
}
