//! Query expression evaluation for in-memory document filtering.

use std::cmp::Ordering;
use bson::{Bson, Document};

use docmap_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::{StoreError, StoreResult},
};


/// Borrowed view of a BSON value that can be compared across numeric widths.
///
/// Integers and doubles are all compared as `f64`. Types without a sensible ordering
/// (binary, object ids, ...) only compare equal to themselves structurally.
#[derive(Debug, PartialEq)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    DateTime(bson::DateTime),
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(values) => Comparable::Array(values.iter().map(Comparable::from).collect()),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl<'a> Comparable<'a> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Other(_) => 1,
            Comparable::Bool(_) => 2,
            Comparable::Number(_) => 3,
            Comparable::DateTime(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::String(_) => 6,
        }
    }

    /// Total order for sorting: values group by type first, so missing and foreign-typed
    /// sort fields land before strings. Unorderable values of one type tie.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.sort_cmp(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self
                .rank()
                .cmp(&other.rank())
                .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal)),
        }
    }
}


/// Evaluates filter expressions against a single stored document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Bson) -> StoreResult<Self> {
        document
            .as_document()
            .map(|document| Self { document })
            .ok_or_else(|| StoreError::InvalidDocument(format!(
                "expected a document, found {:?}",
                document.element_type()
            )))
    }

    pub fn evaluate(&mut self, expr: &Expr) -> StoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Keeps the documents matching `expr`, cloning them out of the store.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Bson>,
        expr: &Expr,
    ) -> StoreResult<Vec<Bson>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document)?.evaluate(expr)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(field) else {
            return Ok(false);
        };
        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => left == right,
            FieldOp::Gt => left.partial_cmp(&right) == Some(Ordering::Greater),
        })
    }
}
