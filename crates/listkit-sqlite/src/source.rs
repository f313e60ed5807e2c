//! [`DataSource`] implementation over one SQLite table.

use std::sync::Arc;

use indexmap::IndexMap;
use listkit_core::{ColumnRef, DataSource, Query, Row};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::database::SqliteDatabase;
use crate::error::Error;
use crate::sql::{self, Statement};

/// A belongs-to relation: `table.target_key = <listed table>.foreign_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
   pub table: String,
   pub foreign_key: String,
   pub target_key: String,
}

/// Schema of the listed table: its name, identifier column and the relations
/// `relation.field` paths may traverse.
///
/// ```
/// use listkit_sqlite::TableSource;
///
/// let posts = TableSource::new("posts")
///    .belongs_to("author", "users", "author_id")
///    .belongs_to_with_key("category", "categories", "category_slug", "slug");
///
/// assert_eq!(posts.identifier(), "id");
/// assert_eq!(posts.relation("category").unwrap().target_key, "slug");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
   name: String,
   identifier: String,
   relations: IndexMap<String, Relation>,
}

impl TableSource {
   pub fn new(name: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         identifier: "id".to_string(),
         relations: IndexMap::new(),
      }
   }

   pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
      self.identifier = identifier.into();
      self
   }

   /// Declare a relation joined on the related table's `id`.
   pub fn belongs_to(
      self,
      relation: impl Into<String>,
      table: impl Into<String>,
      foreign_key: impl Into<String>,
   ) -> Self {
      self.belongs_to_with_key(relation, table, foreign_key, "id")
   }

   pub fn belongs_to_with_key(
      mut self,
      relation: impl Into<String>,
      table: impl Into<String>,
      foreign_key: impl Into<String>,
      target_key: impl Into<String>,
   ) -> Self {
      self.relations.insert(
         relation.into(),
         Relation {
            table: table.into(),
            foreign_key: foreign_key.into(),
            target_key: target_key.into(),
         },
      );
      self
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn identifier(&self) -> &str {
      &self.identifier
   }

   pub fn relation(&self, name: &str) -> Option<&Relation> {
      self.relations.get(name)
   }
}

/// A table of a [`SqliteDatabase`] as a listkit data source.
#[derive(Debug, Clone)]
pub struct SqliteSource {
   db: Arc<SqliteDatabase>,
   table: TableSource,
}

impl SqliteSource {
   pub fn new(db: Arc<SqliteDatabase>, table: TableSource) -> Self {
      Self { db, table }
   }

   pub fn table(&self) -> &TableSource {
      &self.table
   }

   pub fn database(&self) -> &Arc<SqliteDatabase> {
      &self.db
   }

   async fn run(&self, statement: Statement) -> Result<Vec<Row>, Error> {
      debug!(sql = %statement.sql, binds = statement.values.len(), "running list query");
      self.db.fetch_all(&statement.sql, statement.values).await
   }
}

impl DataSource for SqliteSource {
   type Record = Row;
   type Error = Error;

   fn identifier(&self) -> &str {
      self.table.identifier()
   }

   async fn fetch(&self, query: &Query) -> Result<Vec<Row>, Error> {
      let statement = sql::select(&self.table, query)?;
      self.run(statement).await
   }

   async fn fetch_by_id(&self, query: &Query, id: &JsonValue) -> Result<Option<Row>, Error> {
      let statement = sql::select_by_id(&self.table, query, id)?;
      Ok(self.run(statement).await?.into_iter().next())
   }

   async fn count(&self, query: &Query) -> Result<u64, Error> {
      let statement = sql::count(&self.table, query)?;
      let rows = self.run(statement).await?;
      read_count(&rows)
   }

   fn value_of(&self, record: &Row, column: &ColumnRef) -> Option<JsonValue> {
      record.get(&column.key()).cloned()
   }
}

fn read_count(rows: &[Row]) -> Result<u64, Error> {
   match rows.first().map(|row| row.get("count")) {
      Some(Some(value)) => value
         .as_u64()
         .ok_or_else(|| Error::InvalidCount(value.to_string())),
      Some(None) => Err(Error::InvalidCount("a row without a count column".to_string())),
      None => Err(Error::InvalidCount("no rows".to_string())),
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   fn row(value: JsonValue) -> Row {
      Row::from_iter([("count".to_string(), value)])
   }

   #[test]
   fn read_count_returns_the_count() {
      assert_eq!(read_count(&[row(json!(9))]).unwrap(), 9);
      assert_eq!(read_count(&[row(json!(0))]).unwrap(), 0);
   }

   #[test]
   fn read_count_rejects_missing_or_malformed_results() {
      for rows in [vec![], vec![Row::new()], vec![row(json!("nine"))], vec![row(json!(-1))]] {
         let err = read_count(&rows).unwrap_err();
         assert_eq!(err.error_code(), "INVALID_COUNT");
      }
   }
}
