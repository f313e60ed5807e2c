//! In-memory [`DataSource`] over a vector of rows.
//!
//! A relation column `author.name` is read from the nested object stored
//! under the row's `author` key. A missing or `null` relation behaves like an
//! unmatched LEFT JOIN: every column of it reads as `NULL`.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;
use tracing::trace;

use crate::Error;
use crate::predicate::{ColumnRef, CompareOp, Predicate};
use crate::query::{DataSource, FilterMode, Query, Row};
use crate::sort::SortDirection;
use crate::value::{compare_values, has_element, like_match, sort_cmp};

/// Rows held in memory, queried with SQLite-compatible semantics.
#[derive(Debug, Clone)]
pub struct MemorySource {
   rows: Vec<Row>,
   identifier: String,
   mode: FilterMode,
}

impl MemorySource {
   pub fn new(rows: Vec<Row>) -> Self {
      Self {
         rows,
         identifier: "id".to_string(),
         mode: FilterMode::Composite,
      }
   }

   /// Build from JSON values, skipping anything that is not an object.
   pub fn from_values(values: impl IntoIterator<Item = JsonValue>) -> Self {
      let rows = values
         .into_iter()
         .filter_map(|value| match value {
            JsonValue::Object(map) => Some(map.into_iter().collect()),
            _ => None,
         })
         .collect();
      Self::new(rows)
   }

   pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
      self.identifier = identifier.into();
      self
   }

   /// Only accept conjunctive filters, like a backend without OR support.
   pub fn flat(mut self) -> Self {
      self.mode = FilterMode::Flat;
      self
   }

   pub fn rows(&self) -> &[Row] {
      &self.rows
   }

   pub fn push(&mut self, row: Row) {
      self.rows.push(row);
   }

   fn check_mode(&self, query: &Query) -> Result<(), Error> {
      if self.mode == FilterMode::Flat
         && let Some(filter) = &query.filter
         && filter.is_composite()
      {
         return Err(Error::UnsupportedOperation {
            field: "filter".to_string(),
            reason: "composite predicates are not supported by this data source".to_string(),
         });
      }
      Ok(())
   }

   fn matching<'a>(&'a self, query: &Query) -> Vec<&'a Row> {
      self
         .rows
         .iter()
         .filter(|row| {
            query
               .filter
               .as_ref()
               .is_none_or(|predicate| evaluate(row, predicate))
         })
         .collect()
   }
}

fn lookup(row: &Row, column: &ColumnRef) -> Option<JsonValue> {
   match &column.alias {
      None => row.get(&column.column).cloned(),
      Some(alias) => match row.get(alias) {
         None | Some(JsonValue::Null) => Some(JsonValue::Null),
         Some(JsonValue::Object(related)) => related.get(&column.column).cloned(),
         Some(_) => None,
      },
   }
}

fn evaluate(row: &Row, predicate: &Predicate) -> bool {
   match predicate {
      Predicate::And(parts) => parts.iter().all(|p| evaluate(row, p)),
      Predicate::Or(parts) => parts.iter().any(|p| evaluate(row, p)),
      Predicate::Compare { column, op, value } => {
         let actual = lookup(row, column).unwrap_or(JsonValue::Null);
         let ordering = || compare_values(&actual, value);
         match op {
            CompareOp::Eq => ordering() == Some(Ordering::Equal),
            CompareOp::Ne => ordering().is_some_and(|o| o != Ordering::Equal),
            CompareOp::Gt => ordering() == Some(Ordering::Greater),
            CompareOp::Gte => ordering().is_some_and(|o| o != Ordering::Less),
            CompareOp::Lt => ordering() == Some(Ordering::Less),
            CompareOp::Lte => ordering().is_some_and(|o| o != Ordering::Greater),
            CompareOp::Like => like_match(&actual, value, false),
            CompareOp::ILike => like_match(&actual, value, true),
            CompareOp::Has => has_element(&actual, value),
            CompareOp::IsNull => actual.is_null(),
            CompareOp::IsNotNull => !actual.is_null(),
         }
      }
   }
}

impl DataSource for MemorySource {
   type Record = Row;
   type Error = Error;

   fn identifier(&self) -> &str {
      &self.identifier
   }

   fn filter_mode(&self) -> FilterMode {
      self.mode
   }

   async fn fetch(&self, query: &Query) -> Result<Vec<Row>, Error> {
      self.check_mode(query)?;

      let mut rows = self.matching(query);
      rows.sort_by(|a, b| {
         for col in &query.order {
            let left = lookup(a, &col.column).unwrap_or(JsonValue::Null);
            let right = lookup(b, &col.column).unwrap_or(JsonValue::Null);
            let ord = match col.direction {
               SortDirection::Asc => sort_cmp(&left, &right),
               SortDirection::Desc => sort_cmp(&right, &left),
            };
            if ord != Ordering::Equal {
               return ord;
            }
         }
         Ordering::Equal
      });

      let offset = query.offset.unwrap_or(0);
      let limit = query.limit.unwrap_or(usize::MAX);
      let page: Vec<Row> = rows.into_iter().skip(offset).take(limit).cloned().collect();

      trace!(rows = page.len(), "memory source fetch");
      Ok(page)
   }

   async fn fetch_by_id(&self, _query: &Query, id: &JsonValue) -> Result<Option<Row>, Error> {
      let id_column = ColumnRef::root(self.identifier.as_str());
      Ok(self
         .rows
         .iter()
         .find(|row| {
            lookup(row, &id_column)
               .is_some_and(|value| compare_values(&value, id) == Some(Ordering::Equal))
         })
         .cloned())
   }

   async fn count(&self, query: &Query) -> Result<u64, Error> {
      self.check_mode(query)?;
      Ok(self.matching(query).len() as u64)
   }

   fn value_of(&self, record: &Row, column: &ColumnRef) -> Option<JsonValue> {
      lookup(record, column)
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::predicate::OrderColumn;
   use serde_json::json;

   fn source() -> MemorySource {
      MemorySource::from_values([
         json!({"id": 1, "name": "beta", "score": 5, "author": {"name": "ann"}}),
         json!({"id": 2, "name": "Alpha", "score": null, "author": null}),
         json!({"id": 3, "name": "gamma", "score": 5, "author": {"name": "bob"}}),
      ])
   }

   fn ids(rows: &[Row]) -> Vec<i64> {
      rows.iter().filter_map(|r| r["id"].as_i64()).collect()
   }

   #[tokio::test]
   async fn fetch_orders_nulls_first_with_ties_in_listed_order() {
      let query = Query::default().ordered_by(vec![
         OrderColumn::new(ColumnRef::root("score"), SortDirection::Asc),
         OrderColumn::new(ColumnRef::root("id"), SortDirection::Desc),
      ]);

      let rows = source().fetch(&query).await.unwrap();

      assert_eq!(ids(&rows), vec![2, 3, 1]);
   }

   #[tokio::test]
   async fn fetch_applies_offset_and_limit() {
      let query = Query::default()
         .ordered_by(vec![OrderColumn::new(ColumnRef::root("id"), SortDirection::Asc)])
         .offset(1)
         .limit(1);

      let rows = source().fetch(&query).await.unwrap();

      assert_eq!(ids(&rows), vec![2]);
   }

   #[tokio::test]
   async fn relation_columns_read_nested_objects() {
      let query = Query::default().and_filter(Predicate::compare(
         ColumnRef::joined("author", "name"),
         CompareOp::Eq,
         "bob",
      ));

      let rows = source().fetch(&query).await.unwrap();

      assert_eq!(ids(&rows), vec![3]);
   }

   #[test]
   fn missing_relation_reads_as_null() {
      let source = source();
      let row = &source.rows()[1];

      assert_eq!(
         source.value_of(row, &ColumnRef::joined("author", "name")),
         Some(JsonValue::Null)
      );
      assert_eq!(source.value_of(row, &ColumnRef::root("missing")), None);
   }

   #[tokio::test]
   async fn null_never_satisfies_comparison() {
      let query = Query::default().and_filter(Predicate::compare(
         ColumnRef::root("score"),
         CompareOp::Ne,
         "5",
      ));

      assert_eq!(source().count(&query).await.unwrap(), 0);
   }

   #[tokio::test]
   async fn fetch_by_id_ignores_filter() {
      let query = Query::default().and_filter(Predicate::compare(
         ColumnRef::root("id"),
         CompareOp::Eq,
         99,
      ));

      let row = source().fetch_by_id(&query, &json!(2)).await.unwrap();

      assert_eq!(row.map(|r| r["name"].clone()), Some(json!("Alpha")));
   }

   #[tokio::test]
   async fn flat_source_rejects_composite_filter() {
      let query = Query::default().and_filter(Predicate::Or(vec![
         Predicate::compare(ColumnRef::root("id"), CompareOp::Eq, 1),
         Predicate::compare(ColumnRef::root("id"), CompareOp::Eq, 2),
      ]));

      let err = source().flat().fetch(&query).await.unwrap_err();

      assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");
   }
}
