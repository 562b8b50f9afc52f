//! Predicates that backends execute on behalf of a mapped store.
//!
//! A mapped store only ever asks two things of a backend beyond id lookups: a page of
//! records after some identifier, in identifier order, and occasionally an exact match on a
//! field. [`Query`] carries exactly that; backends either evaluate the [`Expr`] tree
//! themselves or translate it through a [`QueryVisitor`].
//!
//! ```ignore
//! use docmap::query::{Filter, Query};
//!
//! let page = Query::builder()
//!     .filter(Filter::gt("Identifier", "\"a\""))
//!     .sort_by("Identifier")
//!     .limit(256)
//!     .build();
//! ```

use bson::Bson;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Eq,
    /// Strictly greater than, comparing strings bytewise and numbers by value.
    Gt,
}

/// A filter expression over top-level document fields.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Every expression must match. An empty list matches everything.
    And(Vec<Expr>),
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    /// Conjunction with `other`, flattening into an existing `And`.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }
}

/// Filter, ascending sort and limit, applied in that order.
///
/// Documents missing the sort field, or holding a value of another type, sort before
/// strings.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Expr>,
    /// Field to sort by, ascending.
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }
}

pub struct Filter;

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::Field { field: field.into(), op: FieldOp::Eq, value: value.into() }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::Field { field: field.into(), op: FieldOp::Gt, value: value.into() }
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.query.sort = Some(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree, producing one output per node.
pub trait QueryVisitor {
    type Output;
    type Error: Into<StoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_into_existing_list() {
        let expr = Filter::gt("Identifier", "a")
            .and(Filter::eq("Value", 1i32))
            .and(Filter::eq("Value", 2i32));

        match expr {
            Expr::And(list) => assert_eq!(list.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn builder_sets_every_part() {
        let query = Query::builder()
            .filter(Filter::gt("Identifier", "a"))
            .sort_by("Identifier")
            .limit(10)
            .build();

        assert!(matches!(
            query.filter,
            Some(Expr::Field { op: FieldOp::Gt, .. })
        ));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.sort.as_deref(), Some("Identifier"));
    }

    #[test]
    fn empty_query_has_no_parts() {
        let query = Query::new();

        assert!(query.filter.is_none() && query.sort.is_none() && query.limit.is_none());
    }
}
