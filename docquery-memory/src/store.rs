//! In-memory client implementation.
//!
//! Collections are kept as insertion-ordered vectors, keyed by namespace,
//! behind an async-safe read-write lock. Insertion order is the natural
//! order that find and find-one report.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, oid::ObjectId};

use docquery_core::{
    backend::{ClientBackend, ClientConnector, DeleteOutcome, UpdateOutcome},
    error::{DocQueryError, DocQueryResult},
    page::Pagination,
    query::Expr,
    target::Namespace,
};

use crate::{evaluator::{DocumentEvaluator, values_equal}, update::UpdateApplier};

type CollectionMap = HashMap<Namespace, Vec<Document>>;


/// Thread-safe in-memory document client.
///
/// Implements the same primitives the MongoDB driver offers, with the same
/// observable rules: inserts without `_id` get a fresh `ObjectId`, duplicate
/// `_id` values are rejected, and updates must consist of operators.
///
/// # Thread Safety
///
/// `InMemoryClient` is cloneable and uses an `Arc`-wrapped internal state.
/// Multiple clones of the same instance share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use docquery_memory::InMemoryClient;
/// use docquery::backend::ClientBackend;
/// use bson::doc;
///
/// let client = InMemoryClient::new();
/// let users = Namespace::new("app", "users");
///
/// client.insert_one(&users, doc! { "name": "Alice", "age": 30 }).await?;
/// let found = client.find_one(&users, doc! { "name": "Alice" }).await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryClient {
    collections: Arc<RwLock<CollectionMap>>,
}

impl InMemoryClient {
    /// Creates a new empty client.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(CollectionMap::new())),
        }
    }

    /// Number of documents currently stored in `namespace`.
    pub async fn count(&self, namespace: &Namespace) -> usize {
        self.collections
            .read()
            .await
            .get(namespace)
            .map_or(0, Vec::len)
    }

    fn position(documents: &[Document], expr: &Expr) -> DocQueryResult<Option<usize>> {
        for (index, document) in documents.iter().enumerate() {
            if DocumentEvaluator::new(document).evaluate(expr)? {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl ClientBackend for InMemoryClient {
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        pagination: Option<Pagination>,
    ) -> DocQueryResult<Vec<Document>> {
        let expr = Expr::parse(&filter)?;
        let collections = self.collections.read().await;
        let documents = match collections.get(namespace) {
            Some(documents) => documents,
            None => return Ok(vec![]),
        };

        let matched = DocumentEvaluator::filter_documents(documents, &expr)?
            .into_iter()
            .cloned();

        Ok(match pagination {
            Some(pagination) => pagination.apply(matched),
            None => matched.collect(),
        })
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> DocQueryResult<Option<Document>> {
        let expr = Expr::parse(&filter)?;
        let collections = self.collections.read().await;
        let documents = match collections.get(namespace) {
            Some(documents) => documents,
            None => return Ok(None),
        };

        Ok(Self::position(documents, &expr)?.map(|index| documents[index].clone()))
    }

    async fn insert_one(
        &self,
        namespace: &Namespace,
        mut document: Document,
    ) -> DocQueryResult<()> {
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }

        let mut collections = self.collections.write().await;
        let documents = collections
            .entry(namespace.clone())
            .or_default();

        let id = document.get("_id").cloned().unwrap_or(Bson::Null);
        if documents
            .iter()
            .any(|existing| existing.get("_id").is_some_and(|existing_id| values_equal(existing_id, &id)))
        {
            return Err(DocQueryError::DuplicateKey(format!(
                "{namespace} already holds a document with _id {id}"
            )));
        }

        documents.push(document);

        Ok(())
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> DocQueryResult<UpdateOutcome> {
        let expr = Expr::parse(&filter)?;
        UpdateApplier::validate(&update)?;

        let mut collections = self.collections.write().await;
        let documents = match collections.get_mut(namespace) {
            Some(documents) => documents,
            None => return Ok(UpdateOutcome::default()),
        };

        let Some(index) = Self::position(documents, &expr)? else {
            return Ok(UpdateOutcome::default());
        };

        // Work on a copy so a failing operator leaves the stored document intact.
        let mut updated = documents[index].clone();
        let modified = UpdateApplier::apply(&mut updated, &update)?;
        documents[index] = updated;

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> DocQueryResult<DeleteOutcome> {
        let expr = Expr::parse(&filter)?;

        let mut collections = self.collections.write().await;
        let documents = match collections.get_mut(namespace) {
            Some(documents) => documents,
            None => return Ok(DeleteOutcome::default()),
        };

        Ok(match Self::position(documents, &expr)? {
            Some(index) => {
                documents.remove(index);
                DeleteOutcome { deleted_count: 1 }
            }
            None => DeleteOutcome::default(),
        })
    }
}


/// Connector handing out clones of one shared [`InMemoryClient`].
///
/// Every URI resolves to the same data, so tests can seed or inspect the
/// client directly while requests go through a pool.
///
/// # Example
///
/// ```ignore
/// let client = InMemoryClient::new();
/// let pool = ClientPool::connect(InMemoryConnector::with_client(client.clone()), "memory://").await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryConnector {
    client: InMemoryClient,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: InMemoryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClientConnector for InMemoryConnector {
    type Backend = InMemoryClient;

    async fn connect(&self, _uri: &str) -> DocQueryResult<Self::Backend> {
        Ok(self.client.clone())
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    fn users() -> Namespace {
        Namespace::new("app", "users")
    }

    #[tokio::test]
    async fn insert_assigns_object_id_when_missing() {
        let client = InMemoryClient::new();

        client.insert_one(&users(), doc! { "name": "a" }).await.unwrap();
        let stored = client.find_one(&users(), doc! { "name": "a" }).await.unwrap().unwrap();

        assert!(matches!(stored.get("_id"), Some(Bson::ObjectId(_))));
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id_of_another_numeric_width() {
        let client = InMemoryClient::new();

        client.insert_one(&users(), doc! { "_id": 1_i32 }).await.unwrap();
        let err = client.insert_one(&users(), doc! { "_id": 1_i64 }).await.unwrap_err();

        assert!(matches!(err, DocQueryError::DuplicateKey(_)));
        assert_eq!(client.count(&users()).await, 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let client = InMemoryClient::new();

        client.insert_one(&users(), doc! { "_id": 1, "name": "a" }).await.unwrap();
        let err = client.insert_one(&users(), doc! { "_id": 1, "name": "b" }).await.unwrap_err();

        assert!(matches!(err, DocQueryError::DuplicateKey(_)));
        assert_eq!(client.count(&users()).await, 1);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let client = InMemoryClient::new();

        client.insert_one(&users(), doc! { "name": "a" }).await.unwrap();

        assert!(client.find(&Namespace::new("other", "users"), doc! {}, None).await.unwrap().is_empty());
        assert!(client.find(&Namespace::new("app", "teams"), doc! {}, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_touches_first_match_only() {
        let client = InMemoryClient::new();
        client.insert_one(&users(), doc! { "_id": 1, "team": "core" }).await.unwrap();
        client.insert_one(&users(), doc! { "_id": 2, "team": "core" }).await.unwrap();

        let outcome = client
            .update_one(&users(), doc! { "team": "core" }, doc! { "$set": { "lead": true } })
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome { matched_count: 1, modified_count: 1 });
        let leads = client.find(&users(), doc! { "lead": true }, None).await.unwrap();
        assert_eq!(leads, vec![doc! { "_id": 1, "team": "core", "lead": true }]);
    }

    #[tokio::test]
    async fn failed_update_leaves_document_intact() {
        let client = InMemoryClient::new();
        client.insert_one(&users(), doc! { "_id": 1, "name": "a", "age": 5 }).await.unwrap();

        let result = client
            .update_one(&users(), doc! { "_id": 1 }, doc! { "$set": { "age": 6 }, "$inc": { "name": 1 } })
            .await;

        assert!(result.is_err());
        assert_eq!(
            client.find_one(&users(), doc! { "_id": 1 }).await.unwrap(),
            Some(doc! { "_id": 1, "name": "a", "age": 5 })
        );
    }

    #[tokio::test]
    async fn delete_removes_first_match_only() {
        let client = InMemoryClient::new();
        client.insert_one(&users(), doc! { "_id": 1, "team": "core" }).await.unwrap();
        client.insert_one(&users(), doc! { "_id": 2, "team": "core" }).await.unwrap();

        let outcome = client.delete_one(&users(), doc! { "team": "core" }).await.unwrap();

        assert_eq!(outcome.deleted_count, 1);
        assert_eq!(client.find(&users(), doc! {}, None).await.unwrap(), vec![doc! { "_id": 2, "team": "core" }]);
    }

    #[tokio::test]
    async fn find_applies_pagination_after_filtering() {
        let client = InMemoryClient::new();
        for n in 1..=7 {
            client.insert_one(&users(), doc! { "_id": n, "odd": n % 2 == 1 }).await.unwrap();
        }

        let page = client
            .find(&users(), doc! { "odd": true }, Some(Pagination::new(2, 2)))
            .await
            .unwrap();

        assert_eq!(page, vec![doc! { "_id": 5, "odd": true }, doc! { "_id": 7, "odd": true }]);
    }
}
