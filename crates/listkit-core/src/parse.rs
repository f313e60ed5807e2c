//! Parsers for the `sort` and `filter` query-string grammars.
//!
//! # Sort
//!
//! Comma-separated field names, a leading `-` marks descending order:
//! `sort=-score,name`.
//!
//! # Filter
//!
//! Comma-separated `field[__operator]:value` clauses. The value may contain
//! `:` but never `,`, and `|` separates alternatives that are ORed together:
//! `filter=name__startswith:find,status:open|pending`.
//!
//! Both parsers are lenient. Entries naming unknown fields (when an allow-list
//! is given) and malformed clauses are dropped without an error.

use tracing::debug;

use crate::field::FieldPath;
use crate::filter::{FilterCondition, FilterSpec, Operator};
use crate::sort::{SortDirection, SortKey, SortSpec};

const OPERATOR_SEPARATOR: &str = "__";

fn is_allowed(name: &str, allowed: Option<&[String]>) -> bool {
   allowed.is_none_or(|list| list.iter().any(|a| a == name))
}

/// Parse a raw sort parameter into a [`SortSpec`].
///
/// When `allowed` is given, an entry is kept only if its unsigned name is in
/// the list.
pub fn parse_sort(raw: &str, allowed: Option<&[String]>) -> SortSpec {
   let mut spec = SortSpec::default();

   for entry in raw.split(',') {
      let entry = entry.trim();
      let (direction, name) = match entry.strip_prefix('-') {
         Some(rest) => (SortDirection::Desc, rest),
         None => (SortDirection::Asc, entry),
      };

      if name.is_empty() {
         continue;
      }

      if !is_allowed(name, allowed) {
         debug!(field = name, "dropping sort entry not in allow-list");
         continue;
      }

      match FieldPath::parse(name) {
         Some(field) => spec.push(SortKey::new(field, direction)),
         None => debug!(field = name, "dropping sort entry with unsupported field path"),
      }
   }

   spec
}

/// Parse a raw filter parameter into a [`FilterSpec`].
///
/// A key of the form `field__operator` selects the operator. When the suffix
/// is not a known operator the whole key, suffix included, is taken as the
/// field name and the operator defaults to `eq`.
pub fn parse_filter(raw: &str, allowed: Option<&[String]>) -> FilterSpec {
   let mut spec = FilterSpec::new();

   for clause in raw.split(',') {
      let Some((key, value)) = clause.split_once(':') else {
         debug!(clause, "dropping filter clause without ':'");
         continue;
      };

      let key = key.trim();
      if key.is_empty() || value.is_empty() {
         debug!(clause, "dropping filter clause with empty key or value");
         continue;
      }

      let (name, operator) = split_operator(key);

      if !is_allowed(name, allowed) {
         debug!(field = name, "dropping filter clause not in allow-list");
         continue;
      }

      match FieldPath::parse(name) {
         Some(field) => spec.insert(field, FilterCondition::new(operator, value)),
         None => debug!(field = name, "dropping filter clause with unsupported field path"),
      }
   }

   spec
}

/// Split `field__operator`, falling back to `(key, Eq)`.
fn split_operator(key: &str) -> (&str, Operator) {
   if let Some((field, token)) = key.rsplit_once(OPERATOR_SEPARATOR)
      && let Some(operator) = Operator::from_token(token)
   {
      return (field, operator);
   }
   (key, Operator::Eq)
}
