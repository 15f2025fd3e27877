//! Convenient re-exports of commonly used types from docquery.
//!
//! ```ignore
//! use docquery::prelude::*;
//! ```

pub use docquery_core::{
    backend::{ClientBackend, ClientConnector, DeleteOutcome, UpdateOutcome},
    criterion::{KeyValueCriterion, RawCriterion},
    error::{DocQueryError, DocQueryResult},
    page::Pagination,
    pool::ClientPool,
    query::{Expr, FieldOp, Filter, QueryVisitor},
    request::{DeleteRequest, InsertRequest, QueryRequest, RawQueryRequest, RawUpdateRequest, UpdateRequest},
    target::{ConnectionTarget, Namespace},
};
