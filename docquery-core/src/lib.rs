//! Core of the docquery facade: request values over a shared document-database client.
//!
//! This crate provides:
//!
//! - **Request shapes** ([`request`]) - One value per operation, each with a single async method
//! - **Connection targets** ([`target`]) - URI, database and collection of a request
//! - **Criteria** ([`criterion`]) - Key/value equality filters and raw driver-native documents
//! - **Filter expressions** ([`query`]) - Typed construction and parsing of raw filters
//! - **Pagination** ([`page`]) - Page/per-page translated to skip/limit
//! - **Backend abstraction** ([`backend`]) - The driver primitives a client must provide
//! - **Client pool** ([`pool`]) - The single client shared by every request
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docquery_core::{pool::ClientPool, request::InsertRequest, target::ConnectionTarget};
//! use bson::doc;
//!
//! let pool = ClientPool::connect(connector, "mongodb://localhost:27017").await?;
//! let target = ConnectionTarget::new("mongodb://localhost:27017", "app", "users");
//!
//! InsertRequest::new(target, doc! { "name": "a", "age": 5 })
//!     .insert_one(&pool)
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docquery_core;

pub mod backend;
pub mod criterion;
pub mod error;
pub mod page;
pub mod pool;
pub mod query;
pub mod request;
pub mod target;
