//! In-memory client backend for docquery.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `ClientBackend` trait. It evaluates raw filters and update operators
//! itself and is intended for tests and local development.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Driver-compatible filters** - Equality, comparison, `$in`/`$nin`, `$exists` and logical operators
//! - **Update operators** - `$set`, `$unset` and `$inc` with dotted paths
//! - **Natural order** - Documents come back in insertion order
//!
//! # Quick Start
//!
//! ```ignore
//! use docquery::{prelude::*, memory::InMemoryConnector};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = ClientPool::connect(InMemoryConnector::new(), "memory://local").await?;
//!     let target = ConnectionTarget::new("memory://local", "app", "users");
//!
//!     InsertRequest::new(target.clone(), doc! { "name": "Alice" })
//!         .insert_one(&pool)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docquery_memory;

pub mod store;
pub(crate) mod evaluator;
pub(crate) mod update;

pub use store::{InMemoryClient, InMemoryConnector};
