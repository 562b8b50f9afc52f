//! Translation of filter expressions into MongoDB query documents.

use bson::{Document, Bson, doc};

use docmap_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::StoreError,
};

use crate::sanitizer::ValueSanitizer;


/// Translates filter expressions into MongoDB's native query syntax.
///
/// Field names and keys inside compared values go through [`ValueSanitizer`] so they line
/// up with how documents were written. String values are passed through untouched.
pub(crate) struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        let clauses = exprs
            .iter()
            .map(|expr| self.visit_expr(expr))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(doc! { "$and": clauses })
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let value = ValueSanitizer::sanitize_value(value);
        let condition = match op {
            FieldOp::Eq => doc! { "$eq": value },
            FieldOp::Gt => doc! { "$gt": value },
        };

        Ok(doc! { ValueSanitizer::sanitize_string(field): condition })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmap_core::query::Filter;

    fn translate(expr: Expr) -> Document {
        MongoQueryTranslator.visit_expr(&expr).unwrap()
    }

    #[test]
    fn identifier_comparisons_keep_string_values() {
        assert_eq!(
            translate(Filter::gt("Identifier", "\"a.b\"")),
            doc! { "Identifier": { "$gt": "\"a.b\"" } }
        );
        assert_eq!(
            translate(Filter::eq("Identifier", "$x")),
            doc! { "Identifier": { "$eq": "$x" } }
        );
    }

    #[test]
    fn field_names_and_nested_keys_are_sanitized() {
        assert_eq!(
            translate(Filter::eq("Key", doc! { "a.b": 1 })),
            doc! { "Key": { "$eq": { "a%2Eb": 1 } } }
        );
        assert_eq!(
            translate(Filter::gt("odd.name", 1i32)),
            doc! { "odd%2Ename": { "$gt": 1 } }
        );
    }

    #[test]
    fn conjunctions_become_and_lists() {
        assert_eq!(
            translate(Filter::gt("Identifier", "a").and(Filter::eq("Value", 2i32))),
            doc! { "$and": [
                { "Identifier": { "$gt": "a" } },
                { "Value": { "$eq": 2 } },
            ] }
        );
        assert_eq!(translate(Filter::and([])), doc! {});
    }
}
