//! MongoDB backend implementation for docquery.
//!
//! This crate provides a `ClientBackend` over the official async MongoDB
//! driver. Filters and updates are handed to the driver exactly as the
//! facade built them; cursors are buffered into vectors before returning.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docquery = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! A [`MongoConnector`] parses the connection string, applies its
//! [`MongoClientConfig`] (a pool of up to 1000 connections by default) and
//! builds the driver client. Hand it to a `ClientPool` once at startup.
//!
//! # Example
//!
//! ```ignore
//! use docquery::{prelude::*, mongodb::MongoConnector};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let uri = "mongodb://localhost:27017";
//!     let pool = ClientPool::connect(MongoConnector::new().verify_on_connect(true), uri).await?;
//!
//!     let older = RawQueryRequest::new(
//!         ConnectionTarget::new(uri, "app", "users"),
//!         doc! { "age": { "$gt": 7 } },
//!     )
//!     .find_raw(&pool)
//!     .await?;
//!
//!     pool.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docquery_mongodb;

pub mod client;
pub mod config;

pub use client::{MongoClient, MongoConnector};
pub use config::MongoClientConfig;
