//! Filter evaluation for in-memory documents.
//!
//! Raw filters are parsed into [`Expr`] trees and evaluated against each
//! stored document, following the driver's matching rules for the supported
//! operators: numbers compare across integer and double types, a missing
//! field never satisfies a comparison, embedded documents are equal only
//! field by field in the same order, and an array field matches when any
//! element does.

use std::cmp::Ordering;
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docquery_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::{DocQueryError, DocQueryResult},
};


/// Comparable view of a BSON value.
///
/// Both integer widths widen to `i64` and compare exactly; doubles only meet
/// integers in mixed comparisons.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Types the evaluator does not order (binary, regex, ...).
    Opaque(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            other => Comparable::Opaque(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Int(a), Comparable::Double(b)) | (Comparable::Double(b), Comparable::Int(a)) => {
                int_equals_double(*a, *b)
            },
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Opaque(a), Comparable::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Double(b)) => compare_int_double(*a, *b),
            (Comparable::Double(a), Comparable::Int(b)) => compare_int_double(*b, *a).map(Ordering::reverse),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

fn int_equals_double(int: i64, double: f64) -> bool {
    // 2^63 is exactly representable, so the range check is exact.
    let in_range = (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&double);

    in_range && double.fract() == 0.0 && double as i64 == int
}

fn compare_int_double(int: i64, double: f64) -> Option<Ordering> {
    if int_equals_double(int, double) {
        Some(Ordering::Equal)
    } else {
        (int as f64).partial_cmp(&double)
    }
}

/// Equality under the evaluator's matching rules (`1_i32` equals `1_i64` and `1.0`).
pub(crate) fn values_equal(left: &Bson, right: &Bson) -> bool {
    Comparable::from(left) == Comparable::from(right)
}

/// Resolves a dotted path (`address.city`) inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocQueryResult<bool> {
        self.visit_expr(expr)
    }

    /// Keeps the documents matching `expr`, preserving their order.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: &Expr,
    ) -> DocQueryResult<Vec<&'a Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(expr)? {
                matched.push(document);
            }
        }

        Ok(matched)
    }

    fn compare(field_value: &Bson, op: &FieldOp, value: &Bson) -> bool {
        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        match op {
            FieldOp::Eq => left == right,
            FieldOp::Ne => left != right,
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                match left.partial_cmp(&right) {
                    Some(ordering) => match op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    },
                    None => false,
                }
            },
            FieldOp::In | FieldOp::Nin => {
                let found = match &right {
                    Comparable::Array(candidates) => candidates.iter().any(|candidate| candidate == &left),
                    _ => false,
                };
                found == matches!(op, FieldOp::In)
            },
        }
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocQueryError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(lookup(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = lookup(self.document, field) else {
            // A missing field only equals null, and is never equal to anything else.
            let null_listed = matches!(value, Bson::Array(items) if items.contains(&Bson::Null));
            return Ok(match op {
                FieldOp::Eq => matches!(value, Bson::Null),
                FieldOp::Ne => !matches!(value, Bson::Null),
                FieldOp::In => null_listed,
                FieldOp::Nin => !null_listed,
                _ => false,
            });
        };

        let direct = Self::compare(field_value, op, value);

        Ok(match (field_value, op) {
            // Negative operators must hold for every element of an array field.
            (Bson::Array(items), FieldOp::Ne | FieldOp::Nin) => {
                direct && items.iter().all(|item| Self::compare(item, op, value))
            },
            (Bson::Array(items), _) => {
                direct || items.iter().any(|item| Self::compare(item, op, value))
            },
            _ => direct,
        })
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    fn matches(document: Document, filter: Document) -> bool {
        let expr = Expr::parse(&filter).unwrap();
        DocumentEvaluator::new(&document).evaluate(&expr).unwrap()
    }

    #[test]
    fn numbers_compare_across_types() {
        assert!(matches(doc! { "age": 10_i64 }, doc! { "age": { "$gt": 7 } }));
        assert!(matches(doc! { "age": 7.0 }, doc! { "age": 7 }));
        assert!(!matches(doc! { "age": 5 }, doc! { "age": { "$gt": 7 } }));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let stored = doc! { "n": 9_007_199_254_740_993_i64 };

        assert!(!matches(stored.clone(), doc! { "n": 9_007_199_254_740_992_i64 }));
        assert!(matches(stored.clone(), doc! { "n": 9_007_199_254_740_993_i64 }));
        assert!(matches(stored.clone(), doc! { "n": { "$gt": 9_007_199_254_740_992_i64 } }));
        assert!(!matches(stored, doc! { "n": 9_007_199_254_740_992.0 }));
        assert!(matches(doc! { "n": 3 }, doc! { "n": { "$lt": 3.5 } }));
        assert!(!matches(doc! { "n": 3 }, doc! { "n": 3.5 }));
    }

    #[test]
    fn embedded_documents_compare_in_field_order() {
        let stored = doc! { "a": { "x": 1, "y": 2 } };

        assert!(matches(stored.clone(), doc! { "a": { "x": 1, "y": 2 } }));
        assert!(!matches(stored.clone(), doc! { "a": { "y": 2, "x": 1 } }));
        assert!(matches(stored, doc! { "a": { "x": 1_i64, "y": 2.0 } }));
    }

    #[test]
    fn missing_field_is_listed_null() {
        let document = doc! { "name": "a" };

        assert!(matches(document.clone(), doc! { "age": { "$in": [5, null] } }));
        assert!(!matches(document.clone(), doc! { "age": { "$in": [5] } }));
        assert!(!matches(document.clone(), doc! { "age": { "$nin": [null] } }));
        assert!(matches(document, doc! { "age": { "$nin": [5] } }));
    }

    #[test]
    fn values_equal_ignores_integer_width() {
        assert!(values_equal(&Bson::Int32(1), &Bson::Int64(1)));
        assert!(values_equal(&Bson::Int64(1), &Bson::Double(1.0)));
        assert!(!values_equal(&Bson::Int64(i64::MAX), &Bson::Double(i64::MAX as f64)));
    }

    #[test]
    fn missing_field_fails_comparisons() {
        assert!(!matches(doc! { "name": "a" }, doc! { "age": { "$lt": 100 } }));
        assert!(matches(doc! { "name": "a" }, doc! { "age": null }));
        assert!(matches(doc! { "name": "a" }, doc! { "age": { "$ne": 5 } }));
    }

    #[test]
    fn mismatched_types_do_not_order() {
        assert!(!matches(doc! { "age": "ten" }, doc! { "age": { "$gt": 7 } }));
    }

    #[test]
    fn dotted_paths_reach_embedded_documents() {
        let document = doc! { "address": { "city": "Oslo", "zip": 150 } };

        assert!(matches(document.clone(), doc! { "address.city": "Oslo" }));
        assert!(matches(document.clone(), doc! { "address.zip": { "$gte": 100 } }));
        assert!(!matches(document, doc! { "address.country": { "$exists": true } }));
    }

    #[test]
    fn array_fields_match_any_element() {
        let document = doc! { "tags": ["red", "blue"] };

        assert!(matches(document.clone(), doc! { "tags": "blue" }));
        assert!(matches(document.clone(), doc! { "tags": { "$in": ["green", "red"] } }));
        assert!(!matches(document.clone(), doc! { "tags": { "$nin": ["red"] } }));
        assert!(!matches(document, doc! { "tags": { "$ne": "red" } }));
    }

    #[test]
    fn logical_operators_combine() {
        let document = doc! { "name": "b", "age": 10 };

        assert!(matches(document.clone(), doc! { "$or": [{ "name": "a" }, { "age": { "$gt": 7 } }] }));
        assert!(!matches(document.clone(), doc! { "$nor": [{ "name": "b" }] }));
        assert!(matches(document, doc! { "age": { "$not": { "$lt": 7 } } }));
    }

    #[test]
    fn filter_documents_keeps_order() {
        let documents = vec![
            doc! { "n": 1, "keep": true },
            doc! { "n": 2, "keep": false },
            doc! { "n": 3, "keep": true },
        ];
        let expr = Expr::parse(&doc! { "keep": true }).unwrap();

        let kept = DocumentEvaluator::filter_documents(&documents, &expr).unwrap();

        assert_eq!(kept.iter().map(|d| d.get_i32("n").unwrap()).collect::<Vec<_>>(), vec![1, 3]);
    }
}
