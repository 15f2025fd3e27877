//! Request shapes of the query facade.
//!
//! Each request is a plain value holding a [`ConnectionTarget`] plus the
//! criteria for one kind of operation. Its method resolves the shared client
//! from a [`ClientPool`], builds the filter and update documents, delegates
//! to the backend and returns the result.
//!
//! Every failure is logged once here, with the operation name and target,
//! and then returned unchanged.
//!
//! | request | method | result |
//! |---|---|---|
//! | [`QueryRequest`] | `find_all`, `find_one`, `find` | documents |
//! | [`InsertRequest`] | `insert_one` | `()` |
//! | [`UpdateRequest`] | `update_one` | [`UpdateOutcome`] |
//! | [`DeleteRequest`] | `delete_one` | [`DeleteOutcome`] |
//! | [`RawQueryRequest`] | `find_raw` | documents |
//! | [`RawUpdateRequest`] | `update_raw` | [`UpdateOutcome`] |

use bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};

use crate::{
    backend::{ClientBackend, ClientConnector, DeleteOutcome, UpdateOutcome},
    criterion::{KeyValueCriterion, RawCriterion},
    error::{DocQueryError, DocQueryResult},
    page::Pagination,
    pool::ClientPool,
    target::ConnectionTarget,
};

fn log_failure<'a>(operation: &'static str, target: &'a ConnectionTarget) -> impl FnOnce(&DocQueryError) + 'a {
    move |err: &DocQueryError| {
        tracing::error!(
            operation,
            database = %target.database,
            collection = %target.collection,
            error = %err,
            "document operation failed",
        );
    }
}

fn log_fetched(operation: &'static str, target: &ConnectionTarget, count: usize) {
    tracing::debug!(
        operation,
        database = %target.database,
        collection = %target.collection,
        count,
        "documents fetched",
    );
}

async fn find_documents<C: ClientConnector>(
    pool: &ClientPool<C>,
    target: &ConnectionTarget,
    filter: Document,
    pagination: Option<Pagination>,
) -> DocQueryResult<Vec<Document>> {
    if let Some(pagination) = &pagination {
        pagination.validate()?;
    }

    pool.client(&target.uri)
        .await?
        .find(&target.namespace(), filter, pagination)
        .await
}

async fn update_document<C: ClientConnector>(
    pool: &ClientPool<C>,
    target: &ConnectionTarget,
    filter: Document,
    update: Document,
) -> DocQueryResult<UpdateOutcome> {
    pool.client(&target.uri)
        .await?
        .update_one(&target.namespace(), filter, update)
        .await
}

/// Reads documents, either all of them or those matching one key/value pair.
///
/// # Example
///
/// ```ignore
/// let target = ConnectionTarget::new("mongodb://localhost:27017", "app", "users");
///
/// let everyone = QueryRequest::new(target.clone()).find_all(&pool).await?;
/// let alice = QueryRequest::new(target.clone())
///     .with_criterion("name", "alice")
///     .find_one(&pool)
///     .await?;
/// let second_page = QueryRequest::new(target)
///     .with_criterion("team", "core")
///     .with_pagination(2, 50)
///     .find(&pool)
///     .await?;
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub target: ConnectionTarget,
    /// Equality filter for `find_one` and `find`; ignored by `find_all`.
    pub criterion: Option<KeyValueCriterion>,
    /// Page to return from `find_all` and `find`; everything when `None`.
    pub pagination: Option<Pagination>,
}

impl QueryRequest {
    pub fn new(target: ConnectionTarget) -> Self {
        Self {
            target,
            criterion: None,
            pagination: None,
        }
    }

    pub fn with_criterion(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.criterion = Some(KeyValueCriterion::new(key, value));
        self
    }

    pub fn with_pagination(mut self, page: u64, per_page: u64) -> Self {
        self.pagination = Some(Pagination::new(page, per_page));
        self
    }

    fn criterion_filter(&self) -> DocQueryResult<Document> {
        self.criterion
            .as_ref()
            .map(KeyValueCriterion::to_filter)
            .ok_or_else(|| DocQueryError::InvalidCriterion("query has no key/value criterion".into()))
    }

    /// Returns every document in the collection.
    ///
    /// An empty collection yields an empty vector, not an error.
    pub async fn find_all<C: ClientConnector>(&self, pool: &ClientPool<C>) -> DocQueryResult<Vec<Document>> {
        let documents = find_documents(pool, &self.target, Document::new(), self.pagination)
            .await
            .inspect_err(log_failure("find_all", &self.target))?;

        log_fetched("find_all", &self.target, documents.len());
        Ok(documents)
    }

    /// Returns the first document whose `key` equals `value`.
    ///
    /// Fails with [`DocQueryError::DocumentNotFound`] when nothing matches.
    pub async fn find_one<C: ClientConnector>(&self, pool: &ClientPool<C>) -> DocQueryResult<Document> {
        async {
            let filter = self.criterion_filter()?;
            let rendered = filter.to_string();

            pool.client(&self.target.uri)
                .await?
                .find_one(&self.target.namespace(), filter)
                .await?
                .ok_or_else(|| DocQueryError::DocumentNotFound(rendered, self.target.collection.clone()))
        }
        .await
        .inspect_err(log_failure("find_one", &self.target))
    }

    /// Returns every document whose `key` equals `value`.
    pub async fn find<C: ClientConnector>(&self, pool: &ClientPool<C>) -> DocQueryResult<Vec<Document>> {
        let documents = async {
            let filter = self.criterion_filter()?;
            find_documents(pool, &self.target, filter, self.pagination).await
        }
        .await
        .inspect_err(log_failure("find", &self.target))?;

        log_fetched("find", &self.target, documents.len());
        Ok(documents)
    }
}

/// Inserts one document, shaped by the caller, into the target collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsertRequest {
    pub target: ConnectionTarget,
    pub document: Document,
}

impl InsertRequest {
    pub fn new(target: ConnectionTarget, document: Document) -> Self {
        Self { target, document }
    }

    /// Writes the document verbatim. Rejections such as a duplicate `_id`
    /// are returned as errors; nothing is retried.
    pub async fn insert_one<C: ClientConnector>(&self, pool: &ClientPool<C>) -> DocQueryResult<()> {
        async {
            pool.client(&self.target.uri)
                .await?
                .insert_one(&self.target.namespace(), self.document.clone())
                .await
        }
        .await
        .inspect_err(log_failure("insert_one", &self.target))
    }
}

/// Merges fields into the first document whose `filter_key` equals `filter_value`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub target: ConnectionTarget,
    pub filter: KeyValueCriterion,
    /// Fields to set; fields not listed here are left untouched.
    pub document: Document,
}

impl UpdateRequest {
    pub fn new(
        target: ConnectionTarget,
        filter_key: impl Into<String>,
        filter_value: impl Into<Bson>,
        document: Document,
    ) -> Self {
        Self {
            target,
            filter: KeyValueCriterion::new(filter_key, filter_value),
            document,
        }
    }

    /// Applies `{ "$set": document }` to the first match.
    ///
    /// Matching nothing is not an error; check
    /// [`UpdateOutcome::is_unmatched`] to tell the cases apart.
    pub async fn update_one<C: ClientConnector>(&self, pool: &ClientPool<C>) -> DocQueryResult<UpdateOutcome> {
        let outcome = update_document(
            pool,
            &self.target,
            self.filter.to_filter(),
            doc! { "$set": self.document.clone() },
        )
        .await
        .inspect_err(log_failure("update_one", &self.target))?;

        tracing::debug!(
            database = %self.target.database,
            collection = %self.target.collection,
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            "update applied",
        );
        Ok(outcome)
    }
}

/// Deletes the first document whose `filter_key` equals `filter_value`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub target: ConnectionTarget,
    pub filter: KeyValueCriterion,
}

impl DeleteRequest {
    pub fn new(target: ConnectionTarget, filter_key: impl Into<String>, filter_value: impl Into<Bson>) -> Self {
        Self {
            target,
            filter: KeyValueCriterion::new(filter_key, filter_value),
        }
    }

    /// Matching nothing is not an error; check [`DeleteOutcome::is_unmatched`].
    pub async fn delete_one<C: ClientConnector>(&self, pool: &ClientPool<C>) -> DocQueryResult<DeleteOutcome> {
        async {
            pool.client(&self.target.uri)
                .await?
                .delete_one(&self.target.namespace(), self.filter.to_filter())
                .await
        }
        .await
        .inspect_err(log_failure("delete_one", &self.target))
    }
}

/// Reads documents matching a caller-supplied driver-native filter.
///
/// ```ignore
/// let adults = RawQueryRequest::new(target, doc! { "age": { "$gte": 18 } })
///     .find_raw(&pool)
///     .await?;
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawQueryRequest {
    pub target: ConnectionTarget,
    pub query: RawCriterion,
    pub pagination: Option<Pagination>,
}

impl RawQueryRequest {
    pub fn new(target: ConnectionTarget, query: impl Into<RawCriterion>) -> Self {
        Self {
            target,
            query: query.into(),
            pagination: None,
        }
    }

    pub fn with_pagination(mut self, page: u64, per_page: u64) -> Self {
        self.pagination = Some(Pagination::new(page, per_page));
        self
    }

    /// Passes the filter to the driver unchanged.
    pub async fn find_raw<C: ClientConnector>(&self, pool: &ClientPool<C>) -> DocQueryResult<Vec<Document>> {
        let documents = find_documents(pool, &self.target, self.query.as_document().clone(), self.pagination)
            .await
            .inspect_err(log_failure("find_raw", &self.target))?;

        log_fetched("find_raw", &self.target, documents.len());
        Ok(documents)
    }
}

/// Updates the first document matching a raw filter with a raw update.
///
/// The update is not wrapped in `$set`; it must carry its own operators.
///
/// ```ignore
/// RawUpdateRequest::new(target, doc! { "name": "b" }, doc! { "$inc": { "age": 1 } })
///     .update_raw(&pool)
///     .await?;
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawUpdateRequest {
    pub target: ConnectionTarget,
    pub filter: RawCriterion,
    pub update: RawCriterion,
}

impl RawUpdateRequest {
    pub fn new(target: ConnectionTarget, filter: impl Into<RawCriterion>, update: impl Into<RawCriterion>) -> Self {
        Self {
            target,
            filter: filter.into(),
            update: update.into(),
        }
    }

    pub async fn update_raw<C: ClientConnector>(&self, pool: &ClientPool<C>) -> DocQueryResult<UpdateOutcome> {
        update_document(
            pool,
            &self.target,
            self.filter.as_document().clone(),
            self.update.as_document().clone(),
        )
        .await
        .inspect_err(log_failure("update_raw", &self.target))
    }
}
