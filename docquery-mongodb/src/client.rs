use std::time::Duration;
use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions},
};
use docquery_core::{
    backend::{ClientBackend, ClientConnector, DeleteOutcome, UpdateOutcome},
    error::{DocQueryError, DocQueryResult},
    page::Pagination,
    target::Namespace,
};

use crate::config::MongoClientConfig;

const DUPLICATE_KEY_CODE: i32 = 11000;

fn backend_error(err: MongoError) -> DocQueryError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE => {
            DocQueryError::DuplicateKey(write_error.message.clone())
        }
        _ => DocQueryError::Backend(err.to_string()),
    }
}


/// A connected MongoDB client.
///
/// Cloning is cheap; clones share the driver's connection pool.
#[derive(Debug, Clone)]
pub struct MongoClient {
    client: Client,
}

impl MongoClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, namespace: &Namespace) -> MongoCollection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }

    async fn shutdown(self) -> DocQueryResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl ClientBackend for MongoClient {
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        pagination: Option<Pagination>,
    ) -> DocQueryResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(pagination) = pagination {
            options.skip = Some(pagination.offset());
            options.limit = Some(i64::try_from(pagination.limit()).unwrap_or(i64::MAX));
        }

        self.get_collection(namespace)
            .find(filter)
            .with_options(options)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn find_one(&self, namespace: &Namespace, filter: Document) -> DocQueryResult<Option<Document>> {
        self.get_collection(namespace)
            .find_one(filter)
            .await
            .map_err(backend_error)
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> DocQueryResult<()> {
        self.get_collection(namespace)
            .insert_one(document)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> DocQueryResult<UpdateOutcome> {
        let result = self.get_collection(namespace)
            .update_one(filter, update)
            .await
            .map_err(backend_error)?;

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> DocQueryResult<DeleteOutcome> {
        let result = self.get_collection(namespace)
            .delete_one(filter)
            .await
            .map_err(backend_error)?;

        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn shutdown(self) -> DocQueryResult<()> {
        self.shutdown().await
    }
}

/// Creates [`MongoClient`]s from connection strings.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use docquery::{prelude::*, mongodb::MongoConnector};
///
/// let connector = MongoConnector::new()
///     .app_name("billing")
///     .server_selection_timeout(Duration::from_secs(5))
///     .verify_on_connect(true);
///
/// let pool = ClientPool::connect(connector, "mongodb://localhost:27017").await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MongoConnector {
    config: MongoClientConfig,
}

impl MongoConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MongoClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MongoClientConfig {
        &self.config
    }

    pub fn max_pool_size(mut self, max_pool_size: u32) -> Self {
        self.config.max_pool_size = max_pool_size;
        self
    }

    pub fn min_pool_size(mut self, min_pool_size: u32) -> Self {
        self.config.min_pool_size = Some(min_pool_size);
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.config.app_name = Some(app_name.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.config.server_selection_timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Ping the deployment while connecting.
    pub fn verify_on_connect(mut self, verify: bool) -> Self {
        self.config.verify_on_connect = verify;
        self
    }

    /// Parses `uri` and layers this connector's configuration on top.
    pub async fn client_options(&self, uri: &str) -> DocQueryResult<ClientOptions> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| DocQueryError::Initialization(e.to_string()))?;

        self.config.apply(&mut options);

        Ok(options)
    }
}

#[async_trait]
impl ClientConnector for MongoConnector {
    type Backend = MongoClient;

    async fn connect(&self, uri: &str) -> DocQueryResult<Self::Backend> {
        let options = self.client_options(uri).await?;
        tracing::debug!(
            max_pool_size = ?options.max_pool_size,
            app_name = ?options.app_name,
            "creating mongodb client",
        );

        let client = Client::with_options(options)
            .map_err(|e| DocQueryError::Initialization(e.to_string()))?;

        if self.config.verify_on_connect {
            client
                .database("admin")
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(|e| DocQueryError::Initialization(format!("ping failed: {e}")))?;
        }

        Ok(MongoClient::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_setters_update_config() {
        let connector = MongoConnector::new()
            .max_pool_size(50)
            .min_pool_size(2)
            .app_name("billing")
            .connect_timeout(Duration::from_secs(2))
            .verify_on_connect(true);

        assert_eq!(
            connector.config(),
            &MongoClientConfig {
                max_pool_size: 50,
                min_pool_size: Some(2),
                app_name: Some("billing".into()),
                connect_timeout_ms: Some(2000),
                server_selection_timeout_ms: None,
                verify_on_connect: true,
            }
        );
    }

    #[tokio::test]
    async fn invalid_uri_is_an_initialization_error() {
        let err = MongoConnector::new().connect("postgres://localhost").await.unwrap_err();

        assert!(matches!(err, DocQueryError::Initialization(_)));
    }

    #[tokio::test]
    async fn connect_without_verification_does_not_need_a_server() {
        let client = MongoConnector::new()
            .connect("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=10")
            .await;

        assert!(client.is_ok());
    }
}
