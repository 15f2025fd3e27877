//! A thin request facade over document-database collections.
//!
//! Each operation is a plain request value (a connection target plus
//! criteria) with a single async method that runs it on a shared client:
//!
//! | request | method | |
//! |---|---|---|
//! | [`QueryRequest`](request::QueryRequest) | `find_all` | every document |
//! | | `find_one` | first document where `key == value` |
//! | | `find` | all documents where `key == value` |
//! | [`InsertRequest`](request::InsertRequest) | `insert_one` | write one document |
//! | [`UpdateRequest`](request::UpdateRequest) | `update_one` | `$set` fields on the first match |
//! | [`DeleteRequest`](request::DeleteRequest) | `delete_one` | remove the first match |
//! | [`RawQueryRequest`](request::RawQueryRequest) | `find_raw` | find with a driver-native filter |
//! | [`RawUpdateRequest`](request::RawUpdateRequest) | `update_raw` | update with driver-native filter and update |
//!
//! # Quick Start
//!
//! ```ignore
//! use docquery::{prelude::*, memory::InMemoryConnector};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocQueryResult<()> {
//!     let uri = "memory://local";
//!     let pool = ClientPool::connect(InMemoryConnector::new(), uri).await?;
//!     let people = ConnectionTarget::new(uri, "app", "people");
//!
//!     InsertRequest::new(people.clone(), doc! { "name": "a", "age": 5 }).insert_one(&pool).await?;
//!     InsertRequest::new(people.clone(), doc! { "name": "b", "age": 10 }).insert_one(&pool).await?;
//!
//!     let older = RawQueryRequest::new(people.clone(), Filter::gt("age", 7).to_document()?)
//!         .find_raw(&pool)
//!         .await?;
//!     println!("older than 7: {older:?}");
//!
//!     let outcome = UpdateRequest::new(people, "name", "nobody", doc! { "age": 1 })
//!         .update_one(&pool)
//!         .await?;
//!     assert!(outcome.is_unmatched());
//!
//!     pool.shutdown().await
//! }
//! ```
//!
//! # The shared client
//!
//! A [`ClientPool`](pool::ClientPool) is built once, at startup or lazily on
//! first use, and passed to every request. It connects exactly once, even
//! when many tasks race to be first, and refuses requests aimed at a
//! different URI than the one it is bound to. Connection failures are
//! returned as [`DocQueryError::Initialization`](error::DocQueryError::Initialization).
//!
//! # Logging
//!
//! Failures are reported through `tracing` at the point they happen and
//! returned unchanged. Install a subscriber in the application to see them.
//!
//! # Backends
//!
//! - [`memory`] - In-process client for tests and local development
//! - [`mongodb`] - MongoDB driver client (requires `mongodb` feature)

pub mod prelude;

pub use docquery_core::{backend, criterion, error, page, pool, query, request, target};

// Re-export BSON types for convenience
pub use bson;

/// In-memory client backend.
pub mod memory {
    pub use docquery_memory::{InMemoryClient, InMemoryConnector};
}

/// MongoDB client backend.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docquery_mongodb::{MongoClient, MongoClientConfig, MongoConnector};
}
