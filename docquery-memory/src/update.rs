//! Update operators for in-memory documents.
//!
//! Supports `$set`, `$unset` and `$inc`, each with dotted paths. An update
//! document must consist solely of operators, as the driver requires for
//! `update_one`.

use bson::{Bson, Document};

use docquery_core::error::{DocQueryError, DocQueryResult};


pub(crate) struct UpdateApplier;

impl UpdateApplier {
    /// Checks the update before any document is touched.
    pub fn validate(update: &Document) -> DocQueryResult<()> {
        if update.is_empty() {
            return Err(DocQueryError::InvalidUpdate("update document must not be empty".into()));
        }

        for (operator, fields) in update {
            match operator.as_str() {
                "$set" | "$unset" | "$inc" => {}
                other if other.starts_with('$') => {
                    return Err(DocQueryError::InvalidUpdate(format!("unsupported update operator {other}")));
                }
                other => {
                    return Err(DocQueryError::InvalidUpdate(format!(
                        "update document must contain only operators, found field {other}"
                    )));
                }
            }

            if !matches!(fields, Bson::Document(_)) {
                return Err(DocQueryError::InvalidUpdate(format!("{operator} requires a document")));
            }
            if Self::fields(fields).any(|(path, _)| path == "_id" || path.starts_with("_id.")) {
                return Err(DocQueryError::InvalidUpdate("_id is immutable".into()));
            }
        }

        Ok(())
    }

    /// Applies an update in place; call [`UpdateApplier::validate`] first so a
    /// bad update cannot leave the document half-modified.
    ///
    /// Returns whether the document changed.
    pub fn apply(document: &mut Document, update: &Document) -> DocQueryResult<bool> {
        let before = document.clone();

        for (operator, fields) in update {
            for (path, value) in Self::fields(fields) {
                match operator.as_str() {
                    "$set" => set_path(document, path, value.clone())?,
                    "$unset" => unset_path(document, path),
                    "$inc" => increment_path(document, path, value)?,
                    other => {
                        return Err(DocQueryError::InvalidUpdate(format!("unsupported update operator {other}")));
                    }
                }
            }
        }

        Ok(*document != before)
    }

    fn fields(fields: &Bson) -> impl Iterator<Item = (&str, &Bson)> {
        fields
            .as_document()
            .into_iter()
            .flat_map(|fields| fields.iter().map(|(path, value)| (path.as_str(), value)))
    }
}

fn parent_mut<'a>(document: &'a mut Document, path: &'a str) -> DocQueryResult<(&'a mut Document, &'a str)> {
    let Some((head, leaf)) = path.rsplit_once('.') else {
        return Ok((document, path));
    };

    let mut current = document;
    for segment in head.split('.') {
        if !current.contains_key(segment) {
            current.insert(segment, Document::new());
        }
        current = match current.get_mut(segment) {
            Some(Bson::Document(inner)) => inner,
            _ => {
                return Err(DocQueryError::InvalidUpdate(format!(
                    "cannot traverse {segment} in {path}: not a document"
                )));
            }
        };
    }

    Ok((current, leaf))
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> DocQueryResult<()> {
    let (parent, leaf) = parent_mut(document, path)?;
    parent.insert(leaf, value);

    Ok(())
}

fn unset_path(document: &mut Document, path: &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = document;
    for segment in segments {
        current = match current.get_mut(segment) {
            Some(Bson::Document(inner)) => inner,
            _ => return,
        };
    }

    current.remove(leaf);
}

fn increment_path(document: &mut Document, path: &str, amount: &Bson) -> DocQueryResult<()> {
    let (parent, leaf) = parent_mut(document, path)?;
    let overflow = || DocQueryError::InvalidUpdate(format!("$inc on {path} overflows a 64-bit integer"));

    let incremented = match (parent.get(leaf), amount) {
        (None, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => amount.clone(),
        (Some(Bson::Int32(a)), Bson::Int32(b)) => match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(*a as i64 + *b as i64),
        },
        (Some(Bson::Int32(a)), Bson::Int64(b)) => Bson::Int64(b.checked_add(*a as i64).ok_or_else(overflow)?),
        (Some(Bson::Int64(a)), Bson::Int32(b)) => Bson::Int64(a.checked_add(*b as i64).ok_or_else(overflow)?),
        (Some(Bson::Int64(a)), Bson::Int64(b)) => Bson::Int64(a.checked_add(*b).ok_or_else(overflow)?),
        (Some(Bson::Double(a)), Bson::Int32(b)) => Bson::Double(a + *b as f64),
        (Some(Bson::Double(a)), Bson::Int64(b)) => Bson::Double(a + *b as f64),
        (Some(Bson::Int32(a)), Bson::Double(b)) => Bson::Double(*a as f64 + b),
        (Some(Bson::Int64(a)), Bson::Double(b)) => Bson::Double(*a as f64 + b),
        (Some(Bson::Double(a)), Bson::Double(b)) => Bson::Double(a + b),
        (_, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => {
            return Err(DocQueryError::InvalidUpdate(format!("cannot $inc non-numeric field {path}")));
        }
        _ => {
            return Err(DocQueryError::InvalidUpdate(format!("$inc on {path} requires a numeric amount")));
        }
    };

    parent.insert(leaf, incremented);

    Ok(())
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    fn updated(mut document: Document, update: Document) -> Document {
        UpdateApplier::validate(&update).unwrap();
        UpdateApplier::apply(&mut document, &update).unwrap();
        document
    }

    #[test]
    fn set_merges_without_touching_other_fields() {
        let document = updated(doc! { "name": "a", "age": 5 }, doc! { "$set": { "age": 6, "city": "Oslo" } });

        assert_eq!(document, doc! { "name": "a", "age": 6, "city": "Oslo" });
    }

    #[test]
    fn set_creates_embedded_documents_for_dotted_paths() {
        let document = updated(doc! { "name": "a" }, doc! { "$set": { "address.city": "Oslo" } });

        assert_eq!(document, doc! { "name": "a", "address": { "city": "Oslo" } });
    }

    #[test]
    fn unset_and_inc() {
        let document = updated(
            doc! { "name": "a", "age": 5, "visits": 1.5 },
            doc! { "$unset": { "name": "" }, "$inc": { "age": 2, "visits": 1, "fresh": 3 } },
        );

        assert_eq!(document, doc! { "age": 7, "visits": 2.5, "fresh": 3 });
    }

    #[test]
    fn apply_reports_unchanged_documents() {
        let mut document = doc! { "age": 5 };

        assert!(!UpdateApplier::apply(&mut document, &doc! { "$set": { "age": 5 } }).unwrap());
    }

    #[test]
    fn rejects_replacement_documents() {
        let err = UpdateApplier::validate(&doc! { "age": 6 }).unwrap_err();

        assert!(matches!(err, DocQueryError::InvalidUpdate(_)));
    }

    #[test]
    fn rejects_unknown_operators_and_id_changes() {
        assert!(UpdateApplier::validate(&doc! { "$push": { "tags": "x" } }).is_err());
        assert!(UpdateApplier::validate(&doc! { "$set": { "_id": 1 } }).is_err());
    }

    #[test]
    fn inc_rejects_non_numeric_targets() {
        let mut document = doc! { "name": "a" };

        assert!(UpdateApplier::apply(&mut document, &doc! { "$inc": { "name": 1 } }).is_err());
    }
}
