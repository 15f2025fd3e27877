//! Criteria identifying which documents an operation targets.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::{error::DocQueryResult, query::Expr};


/// A single equality filter, `key == value`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KeyValueCriterion {
    pub key: String,
    pub value: Bson,
}

impl KeyValueCriterion {
    pub fn new(key: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Renders the criterion as a filter document, `{ key: value }`.
    pub fn to_filter(&self) -> Document {
        let mut filter = Document::new();
        filter.insert(self.key.clone(), self.value.clone());
        filter
    }
}

/// A driver-native filter or update document supplied by the caller.
///
/// The facade never inspects a raw criterion; it is handed to the driver
/// exactly as given. Build one from a document, or from a typed [`Expr`]:
///
/// ```ignore
/// let by_doc = RawCriterion::from(doc! { "age": { "$gt": 7 } });
/// let by_expr = RawCriterion::try_from(Filter::gt("age", 7))?;
/// assert_eq!(by_doc, by_expr);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct RawCriterion(Document);

impl RawCriterion {
    pub fn new(document: Document) -> Self {
        Self(document)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

impl From<Document> for RawCriterion {
    fn from(document: Document) -> Self {
        Self(document)
    }
}

impl TryFrom<Expr> for RawCriterion {
    type Error = crate::error::DocQueryError;

    fn try_from(expr: Expr) -> DocQueryResult<Self> {
        expr.to_document().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;
    use crate::query::Filter;

    #[test]
    fn key_value_renders_equality_filter() {
        let criterion = KeyValueCriterion::new("name", "a");

        assert_eq!(criterion.to_filter(), doc! { "name": "a" });
    }

    #[test]
    fn raw_criterion_from_expr_matches_handwritten_document() {
        let by_doc = RawCriterion::from(doc! { "age": { "$gt": 7 } });
        let by_expr = RawCriterion::try_from(Filter::gt("age", 7)).unwrap();

        assert_eq!(by_doc, by_expr);
    }

    #[test]
    fn raw_criterion_keeps_field_order() {
        let raw = RawCriterion::from(doc! { "z": 1, "a": 2 });

        assert_eq!(raw.as_document().keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }
}
