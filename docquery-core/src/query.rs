//! Filter expressions for raw criteria.
//!
//! Raw criteria are driver-native BSON documents and are normally passed
//! through untouched. This module offers a typed way to write them and a
//! parser for backends that evaluate filters themselves.
//!
//! # Building filters
//!
//! ```ignore
//! use docquery::query::Filter;
//! use docquery::criterion::RawCriterion;
//!
//! let criterion = RawCriterion::try_from(
//!     Filter::gt("age", 7).and(Filter::ne("name", "admin")),
//! )?;
//! // { "$and": [ { "age": { "$gt": 7 } }, { "name": { "$ne": "admin" } } ] }
//! ```
//!
//! # Parsing filters
//!
//! [`Expr::parse`] accepts the subset of the query language the facade's
//! own backends understand: implicit equality, `$eq`, `$ne`, `$gt`, `$gte`,
//! `$lt`, `$lte`, `$in`, `$nin`, `$exists`, `$not`, `$and`, `$or` and `$nor`.
//! Anything else is rejected with [`DocQueryError::InvalidCriterion`].

use bson::{Bson, Document, doc};

use crate::error::{DocQueryError, DocQueryResult};

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Field equals any of the listed values.
    In,
    /// Field equals none of the listed values.
    Nin,
}

impl FieldOp {
    /// The query operator this variant renders to.
    pub fn operator(&self) -> &'static str {
        match self {
            FieldOp::Eq => "$eq",
            FieldOp::Ne => "$ne",
            FieldOp::Gt => "$gt",
            FieldOp::Gte => "$gte",
            FieldOp::Lt => "$lt",
            FieldOp::Lte => "$lte",
            FieldOp::In => "$in",
            FieldOp::Nin => "$nin",
        }
    }

    fn from_operator(operator: &str) -> Option<Self> {
        Some(match operator {
            "$eq" => FieldOp::Eq,
            "$ne" => FieldOp::Ne,
            "$gt" => FieldOp::Gt,
            "$gte" => FieldOp::Gte,
            "$lt" => FieldOp::Lt,
            "$lte" => FieldOp::Lte,
            "$in" => FieldOp::In,
            "$nin" => FieldOp::Nin,
            _ => return None,
        })
    }
}

/// A filter expression.
///
/// Expressions can be combined using logical operators (`And`, `Or`, `Not`)
/// to build complex filter predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression (inverts the result).
    Not(Box<Expr>),
    /// Checks if a field exists or doesn't exist.
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        /// The field name (dotted paths address embedded documents).
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Renders this expression as a driver-native filter document.
    pub fn to_document(&self) -> DocQueryResult<Document> {
        FilterRenderer.visit_expr(self)
    }

    /// Parses a driver-native filter document into an expression.
    ///
    /// An empty document parses to an empty `And`, which matches everything.
    pub fn parse(filter: &Document) -> DocQueryResult<Expr> {
        let mut exprs = Vec::with_capacity(filter.len());

        for (key, value) in filter {
            exprs.push(match key.as_str() {
                "$and" => Expr::And(parse_clauses(key, value)?),
                "$or" => Expr::Or(parse_clauses(key, value)?),
                "$nor" => Expr::Or(parse_clauses(key, value)?).not(),
                operator if operator.starts_with('$') => {
                    return Err(DocQueryError::InvalidCriterion(format!(
                        "unsupported top-level operator {operator}"
                    )));
                }
                field => parse_field(field, value)?,
            });
        }

        Ok(match <[Expr; 1]>::try_from(exprs) {
            Ok([expr]) => expr,
            Err(exprs) => Expr::And(exprs),
        })
    }
}

fn parse_clauses(operator: &str, value: &Bson) -> DocQueryResult<Vec<Expr>> {
    let Bson::Array(clauses) = value else {
        return Err(DocQueryError::InvalidCriterion(format!("{operator} requires an array")));
    };

    clauses
        .iter()
        .map(|clause| match clause {
            Bson::Document(clause) => Expr::parse(clause),
            _ => Err(DocQueryError::InvalidCriterion(format!(
                "{operator} entries must be documents"
            ))),
        })
        .collect()
}

fn parse_field(field: &str, value: &Bson) -> DocQueryResult<Expr> {
    let operators = match value {
        Bson::Document(operators) if operators.keys().any(|k| k.starts_with('$')) => operators,
        // Plain values, including embedded documents, compare by equality.
        _ => return Ok(Expr::field(field.to_string(), FieldOp::Eq, value.clone())),
    };

    let mut exprs = Vec::with_capacity(operators.len());

    for (operator, operand) in operators {
        exprs.push(match operator.as_str() {
            "$exists" => Expr::Exists(field.to_string(), is_truthy(operand)),
            "$not" => match operand {
                Bson::Document(_) => parse_field(field, operand)?.not(),
                _ => {
                    return Err(DocQueryError::InvalidCriterion(format!(
                        "$not on {field} requires an operator document"
                    )));
                }
            },
            other => match FieldOp::from_operator(other) {
                Some(op @ (FieldOp::In | FieldOp::Nin)) if !matches!(operand, Bson::Array(_)) => {
                    return Err(DocQueryError::InvalidCriterion(format!(
                        "{} on {field} requires an array", op.operator()
                    )));
                }
                Some(op) => Expr::field(field.to_string(), op, operand.clone()),
                None => {
                    return Err(DocQueryError::InvalidCriterion(format!(
                        "unsupported operator {other} on {field}"
                    )));
                }
            },
        });
    }

    Ok(match <[Expr; 1]>::try_from(exprs) {
        Ok([expr]) => expr,
        Err(exprs) => Expr::And(exprs),
    })
}

fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// Helper for constructing filter expressions.
///
/// ```ignore
/// use docquery::query::Filter;
///
/// let expr = Filter::eq("name", "Alice")
///     .and(Filter::gt("age", 18));
/// ```
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches documents where the field equals any of the values.
    pub fn any_of(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Expr {
        Expr::field(
            field.into(),
            FieldOp::In,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Matches documents where the field equals none of the values.
    pub fn none_of(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Expr {
        Expr::field(
            field.into(),
            FieldOp::Nin,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// Combines expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines expressions such that any can match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<DocQueryError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

/// Renders expressions into driver-native filter documents.
pub(crate) struct FilterRenderer;

impl QueryVisitor for FilterRenderer {
    type Output = Document;
    type Error = DocQueryError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(Document::new());
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    // `$not` is only valid inside a field, so negation of a whole clause goes through `$nor`.
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        let clause = self.visit_expr(expr)?;

        Ok(doc! {
            "$nor": [clause],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        if matches!(op, FieldOp::In | FieldOp::Nin) && !matches!(value, Bson::Array(_)) {
            return Err(DocQueryError::InvalidCriterion(format!(
                "{} on {field} requires an array", op.operator()
            )));
        }

        Ok(doc! {
            field: { op.operator(): value.clone() },
        })
    }
}
