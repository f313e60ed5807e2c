//! Compilation of listkit queries to SQLite SQL.
//!
//! Identifiers are validated and double-quoted before interpolation; every
//! value is bound through a numbered `$N` placeholder. A compiled statement
//! for the `posts` table with an `author` relation reads like:
//!
//! ```text
//! SELECT "posts".*, "author"."name" AS "author.name"
//!    FROM "posts"
//!    LEFT JOIN "users" AS "author" ON "author"."id" = "posts"."author_id"
//!    WHERE ("posts"."status" = $1 OR "posts"."status" = $2)
//!    ORDER BY "author"."name" ASC, "posts"."id" ASC
//!    LIMIT 11
//! ```
//!
//! Relation columns used for ordering are projected under `relation.field`
//! so the keyset paginator can read an anchor's values back from the row.

use listkit_core::{
   ColumnRef, CompareOp, Join, LIKE_ESCAPE, OrderColumn, Predicate, Query, SortDirection,
};
use serde_json::Value as JsonValue;

use crate::Error;
use crate::source::TableSource;

/// SQL text with the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
   pub sql: String,
   pub values: Vec<JsonValue>,
}

/// Validate that an identifier is safe for SQL interpolation.
///
/// Accepts names matching `[a-zA-Z_][a-zA-Z0-9_]*`. Qualified names are
/// validated one part at a time.
pub(crate) fn validate_column_name(name: &str) -> Result<(), Error> {
   let mut chars = name.chars();
   let valid_start = chars
      .next()
      .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');

   if !valid_start || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
      return Err(Error::InvalidColumnName {
         name: name.to_string(),
      });
   }

   Ok(())
}

/// Quote a name with double-quote identifiers.
///
/// Any embedded double quotes are doubled per SQL standard (`"` → `""`).
pub(crate) fn quote_identifier(name: &str) -> String {
   format!("\"{}\"", name.replace('"', "\"\""))
}

struct SqlWriter<'t> {
   table: &'t TableSource,
   values: Vec<JsonValue>,
}

impl<'t> SqlWriter<'t> {
   fn new(table: &'t TableSource) -> Self {
      Self {
         table,
         values: Vec::new(),
      }
   }

   fn placeholder(&mut self, value: JsonValue) -> String {
      self.values.push(value);
      format!("${}", self.values.len())
   }

   fn column(&self, column: &ColumnRef) -> Result<String, Error> {
      let owner = column.alias.as_deref().unwrap_or(self.table.name());
      validate_column_name(owner)?;
      validate_column_name(&column.column)?;
      Ok(format!(
         "{}.{}",
         quote_identifier(owner),
         quote_identifier(&column.column)
      ))
   }

   fn projection(&self, order: &[OrderColumn]) -> Result<String, Error> {
      let mut parts = vec![format!("{}.*", quote_identifier(self.table.name()))];
      let mut projected: Vec<&ColumnRef> = Vec::new();

      for col in order {
         if col.column.alias.is_none() || projected.contains(&&col.column) {
            continue;
         }
         parts.push(format!(
            "{} AS {}",
            self.column(&col.column)?,
            quote_identifier(&col.column.key())
         ));
         projected.push(&col.column);
      }

      Ok(parts.join(", "))
   }

   fn from_clause(&self, joins: &[Join]) -> Result<String, Error> {
      let table = self.table.name();
      validate_column_name(table)?;
      let mut sql = format!("FROM {}", quote_identifier(table));

      for join in joins {
         let relation = self
            .table
            .relation(&join.relation)
            .ok_or_else(|| Error::UnknownRelation {
               table: table.to_string(),
               relation: join.relation.clone(),
            })?;

         for name in [
            join.alias.as_str(),
            relation.table.as_str(),
            relation.foreign_key.as_str(),
            relation.target_key.as_str(),
         ] {
            validate_column_name(name)?;
         }

         sql.push_str(&format!(
            " LEFT JOIN {} AS {} ON {}.{} = {}.{}",
            quote_identifier(&relation.table),
            quote_identifier(&join.alias),
            quote_identifier(&join.alias),
            quote_identifier(&relation.target_key),
            quote_identifier(table),
            quote_identifier(&relation.foreign_key),
         ));
      }

      Ok(sql)
   }

   fn predicate(&mut self, predicate: &Predicate) -> Result<String, Error> {
      match predicate {
         Predicate::And(parts) => self.group(parts, " AND "),
         Predicate::Or(parts) => self.group(parts, " OR "),
         Predicate::Compare { column, op, value } => {
            let column = self.column(column)?;
            let escape = format!("ESCAPE '{}'", LIKE_ESCAPE);

            Ok(match op {
               CompareOp::IsNull => format!("{} IS NULL", column),
               CompareOp::IsNotNull => format!("{} IS NOT NULL", column),
               CompareOp::Eq => format!("{} = {}", column, self.placeholder(value.clone())),
               CompareOp::Ne => format!("{} <> {}", column, self.placeholder(value.clone())),
               CompareOp::Gt => format!("{} > {}", column, self.placeholder(value.clone())),
               CompareOp::Gte => format!("{} >= {}", column, self.placeholder(value.clone())),
               CompareOp::Lt => format!("{} < {}", column, self.placeholder(value.clone())),
               CompareOp::Lte => format!("{} <= {}", column, self.placeholder(value.clone())),
               CompareOp::Like => {
                  let param = self.placeholder(value.clone());
                  format!("{} LIKE {} {}", column, param, escape)
               }
               CompareOp::ILike => {
                  let param = self.placeholder(value.clone());
                  format!("LOWER({}) LIKE LOWER({}) {}", column, param, escape)
               }
               CompareOp::Has => {
                  let element = self.has_element(value);
                  format!(
                     "CASE WHEN json_valid({col}) THEN EXISTS (SELECT 1 FROM json_each({col}) WHERE {element}) ELSE 0 END",
                     col = column,
                     element = element
                  )
               }
            })
         }
      }
   }

   /// Element test inside `json_each` for a `has` operand.
   ///
   /// Array elements keep their JSON type, so a numeric text operand is also
   /// bound as a number to match numeric elements.
   fn has_element(&mut self, value: &JsonValue) -> String {
      let text = self.placeholder(value.clone());
      let numeric = value
         .as_str()
         .and_then(|s| s.trim().parse::<f64>().ok())
         .and_then(serde_json::Number::from_f64);

      match numeric {
         Some(number) => {
            let number = self.placeholder(JsonValue::Number(number));
            format!("json_each.value = {} OR json_each.value = {}", text, number)
         }
         None => format!("json_each.value = {}", text),
      }
   }

   fn group(&mut self, parts: &[Predicate], separator: &str) -> Result<String, Error> {
      let compiled = parts
         .iter()
         .map(|p| self.predicate(p))
         .collect::<Result<Vec<_>, _>>()?;
      if compiled.is_empty() {
         // Empty conjunction holds, empty disjunction never does
         return Ok(if separator == " AND " { "1" } else { "0" }.to_string());
      }
      Ok(format!("({})", compiled.join(separator)))
   }

   fn where_clause(&mut self, filter: Option<&Predicate>) -> Result<String, Error> {
      match filter {
         Some(predicate) => Ok(format!(" WHERE {}", self.predicate(predicate)?)),
         None => Ok(String::new()),
      }
   }

   fn order_by(&self, order: &[OrderColumn]) -> Result<String, Error> {
      if order.is_empty() {
         return Ok(String::new());
      }

      let parts = order
         .iter()
         .map(|o| {
            let dir = match o.direction {
               SortDirection::Asc => "ASC",
               SortDirection::Desc => "DESC",
            };
            Ok(format!("{} {}", self.column(&o.column)?, dir))
         })
         .collect::<Result<Vec<_>, Error>>()?;

      Ok(format!(" ORDER BY {}", parts.join(", ")))
   }

   fn finish(self, sql: String) -> Statement {
      Statement {
         sql,
         values: self.values,
      }
   }
}

/// `SELECT` honoring the filter, ordering, limit and offset of `query`.
pub(crate) fn select(table: &TableSource, query: &Query) -> Result<Statement, Error> {
   let mut writer = SqlWriter::new(table);

   let mut sql = format!(
      "SELECT {} {}",
      writer.projection(&query.order)?,
      writer.from_clause(&query.joins)?
   );
   sql.push_str(&writer.where_clause(query.filter.as_ref())?);
   sql.push_str(&writer.order_by(&query.order)?);

   match (query.limit, query.offset) {
      (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
      (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
      (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
      (None, None) => {}
   }

   Ok(writer.finish(sql))
}

/// `SELECT` of one record by identifier, with the joins and ordering
/// projection of `query` but not its filter.
pub(crate) fn select_by_id(
   table: &TableSource,
   query: &Query,
   id: &JsonValue,
) -> Result<Statement, Error> {
   let mut writer = SqlWriter::new(table);

   let id_column = writer.column(&ColumnRef::root(table.identifier()))?;
   let mut sql = format!(
      "SELECT {} {}",
      writer.projection(&query.order)?,
      writer.from_clause(&query.joins)?
   );
   let param = writer.placeholder(id.clone());
   sql.push_str(&format!(" WHERE {} = {} LIMIT 1", id_column, param));

   Ok(writer.finish(sql))
}

/// `SELECT COUNT(*)` of the records matching the filter of `query`.
pub(crate) fn count(table: &TableSource, query: &Query) -> Result<Statement, Error> {
   let mut writer = SqlWriter::new(table);

   let mut sql = format!("SELECT COUNT(*) AS \"count\" {}", writer.from_clause(&query.joins)?);
   sql.push_str(&writer.where_clause(query.filter.as_ref())?);

   Ok(writer.finish(sql))
}

#[cfg(test)]
mod tests {
   use super::*;
   use listkit_core::{PredicateBuilder, parse_filter, parse_sort};
   use serde_json::json;

   fn posts() -> TableSource {
      TableSource::new("posts").belongs_to("author", "users", "author_id")
   }

   fn planned(sort: &str, filter: &str) -> Query {
      let mut builder = PredicateBuilder::new();
      let order = builder.build_ordering(&parse_sort(sort, None));
      let filter = builder.build_filter_predicate(&parse_filter(filter, None));
      Query {
         joins: builder.into_joins(),
         filter,
         order,
         limit: None,
         offset: None,
      }
   }

   // ─── validate_column_name ───

   #[test]
   fn accepts_simple_names() {
      assert!(validate_column_name("id").is_ok());
      assert!(validate_column_name("_private").is_ok());
      assert!(validate_column_name("created_at2").is_ok());
   }

   #[test]
   fn rejects_unsafe_names() {
      for name in ["", "1abc", "a-b", "a b", "a;drop", "a.b", "\"x\""] {
         assert!(validate_column_name(name).is_err(), "{name} should be rejected");
      }
   }

   #[test]
   fn quotes_embedded_double_quotes() {
      assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
   }

   // ─── select ───

   #[test]
   fn select_plain_table() {
      let stmt = select(&posts(), &Query::default()).unwrap();

      assert_eq!(stmt.sql, "SELECT \"posts\".* FROM \"posts\"");
      assert!(stmt.values.is_empty());
   }

   #[test]
   fn select_with_filter_order_and_window() {
      let query = planned("-score", "status:open|draft,title__startswith:Hello")
         .limit(5)
         .offset(10);

      let stmt = select(&posts(), &query).unwrap();

      assert_eq!(
         stmt.sql,
         "SELECT \"posts\".* FROM \"posts\" \
          WHERE ((\"posts\".\"status\" = $1 OR \"posts\".\"status\" = $2) \
          AND \"posts\".\"title\" LIKE $3 ESCAPE '\\') \
          ORDER BY \"posts\".\"score\" DESC LIMIT 5 OFFSET 10"
      );
      assert_eq!(stmt.values, vec![json!("open"), json!("draft"), json!("Hello%")]);
   }

   #[test]
   fn select_projects_relation_ordering_columns() {
      let query = planned("author.name,-author.name", "author.age__gt:30");

      let stmt = select(&posts(), &query).unwrap();

      assert_eq!(
         stmt.sql,
         "SELECT \"posts\".*, \"author\".\"name\" AS \"author.name\" FROM \"posts\" \
          LEFT JOIN \"users\" AS \"author\" ON \"author\".\"id\" = \"posts\".\"author_id\" \
          WHERE \"author\".\"age\" > $1 \
          ORDER BY \"author\".\"name\" ASC, \"author\".\"name\" DESC"
      );
      assert_eq!(stmt.values, vec![json!("30")]);
   }

   #[test]
   fn select_icontains_and_has() {
      let query = planned("", "title__icontains:x,tags__has:red");

      let stmt = select(&posts(), &query).unwrap();

      assert!(stmt.sql.contains("LOWER(\"posts\".\"title\") LIKE LOWER($1) ESCAPE '\\'"));
      assert!(stmt.sql.contains(
         "CASE WHEN json_valid(\"posts\".\"tags\") THEN EXISTS (SELECT 1 FROM json_each(\"posts\".\"tags\") WHERE json_each.value = $2) ELSE 0 END"
      ));
   }

   #[test]
   fn has_binds_numeric_operand_twice() {
      let query = planned("", "nums__has:2");

      let stmt = select(&posts(), &query).unwrap();

      assert!(stmt.sql.contains(
         "EXISTS (SELECT 1 FROM json_each(\"posts\".\"nums\") WHERE json_each.value = $1 OR json_each.value = $2)"
      ));
      assert_eq!(stmt.values, vec![json!("2"), json!(2.0)]);
   }

   #[test]
   fn null_checks_bind_nothing() {
      let query = Query::default().and_filter(Predicate::Or(vec![
         Predicate::is_null(ColumnRef::root("score")),
         Predicate::is_not_null(ColumnRef::joined("author", "name")),
      ]));

      let stmt = select(&posts(), &query).unwrap();

      assert!(stmt.sql.ends_with(
         "WHERE (\"posts\".\"score\" IS NULL OR \"author\".\"name\" IS NOT NULL)"
      ));
      assert!(stmt.values.is_empty());
   }

   #[test]
   fn empty_disjunction_matches_nothing() {
      let query = Query::default().and_filter(Predicate::Or(Vec::new()));

      let stmt = select(&posts(), &query).unwrap();

      assert_eq!(stmt.sql, "SELECT \"posts\".* FROM \"posts\" WHERE 0");
   }

   #[test]
   fn select_offset_without_limit() {
      let stmt = select(&posts(), &Query::default().offset(3)).unwrap();

      assert!(stmt.sql.ends_with(" LIMIT -1 OFFSET 3"));
   }

   #[test]
   fn select_rejects_unsafe_field() {
      let query = planned("", "bad;field:x");

      let err = select(&posts(), &query).unwrap_err();

      assert_eq!(err.error_code(), "INVALID_COLUMN_NAME");
   }

   #[test]
   fn select_rejects_undeclared_relation() {
      let query = planned("editor.name", "");

      let err = select(&posts(), &query).unwrap_err();

      assert_eq!(err.error_code(), "UNKNOWN_RELATION");
   }

   // ─── select_by_id / count ───

   #[test]
   fn select_by_id_ignores_filter() {
      let query = planned("author.name", "status:open");

      let stmt = select_by_id(&posts(), &query, &json!(7)).unwrap();

      assert_eq!(
         stmt.sql,
         "SELECT \"posts\".*, \"author\".\"name\" AS \"author.name\" FROM \"posts\" \
          LEFT JOIN \"users\" AS \"author\" ON \"author\".\"id\" = \"posts\".\"author_id\" \
          WHERE \"posts\".\"id\" = $1 LIMIT 1"
      );
      assert_eq!(stmt.values, vec![json!(7)]);
   }

   #[test]
   fn count_keeps_joins_and_filter() {
      let query = planned("-score", "author.name:ann");

      let stmt = count(&posts(), &query).unwrap();

      assert_eq!(
         stmt.sql,
         "SELECT COUNT(*) AS \"count\" FROM \"posts\" \
          LEFT JOIN \"users\" AS \"author\" ON \"author\".\"id\" = \"posts\".\"author_id\" \
          WHERE \"author\".\"name\" = $1"
      );
   }
}
