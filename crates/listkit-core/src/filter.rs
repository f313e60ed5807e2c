//! Filter specifications and the operator vocabulary.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::field::FieldPath;

/// Closed set of filter operators accepted after `__` in a filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
   Eq,
   Neq,
   Contains,
   IContains,
   Gt,
   Lt,
   Gte,
   Lte,
   StartsWith,
   EndsWith,
   /// Element membership in a multi-valued column.
   Has,
}

impl Operator {
   pub const ALL: [Operator; 11] = [
      Operator::Eq,
      Operator::Neq,
      Operator::Contains,
      Operator::IContains,
      Operator::Gt,
      Operator::Lt,
      Operator::Gte,
      Operator::Lte,
      Operator::StartsWith,
      Operator::EndsWith,
      Operator::Has,
   ];

   /// Look up an operator by its query-string token.
   pub fn from_token(token: &str) -> Option<Self> {
      Self::ALL.into_iter().find(|op| op.as_str() == token)
   }

   pub fn as_str(self) -> &'static str {
      match self {
         Operator::Eq => "eq",
         Operator::Neq => "neq",
         Operator::Contains => "contains",
         Operator::IContains => "icontains",
         Operator::Gt => "gt",
         Operator::Lt => "lt",
         Operator::Gte => "gte",
         Operator::Lte => "lte",
         Operator::StartsWith => "startswith",
         Operator::EndsWith => "endswith",
         Operator::Has => "has",
      }
   }
}

impl fmt::Display for Operator {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

/// Operator plus the raw, untransformed value from the query string.
///
/// `raw_value` may hold several `|`-separated alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
   pub operator: Operator,
   pub raw_value: String,
}

impl FilterCondition {
   pub fn new(operator: Operator, raw_value: impl Into<String>) -> Self {
      Self {
         operator,
         raw_value: raw_value.into(),
      }
   }

   /// The non-empty `|`-separated alternatives of the raw value.
   pub fn alternatives(&self) -> impl Iterator<Item = &str> {
      self.raw_value.split('|').filter(|alt| !alt.is_empty())
   }
}

/// Mapping from field to condition, in the order fields were first named.
///
/// Fields are combined with AND. Setting a field twice replaces the earlier
/// condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec(IndexMap<FieldPath, FilterCondition>);

impl FilterSpec {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn insert(&mut self, field: FieldPath, condition: FilterCondition) {
      self.0.insert(field, condition);
   }

   pub fn get(&self, field: &FieldPath) -> Option<&FilterCondition> {
      self.0.get(field)
   }

   pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FilterCondition)> {
      self.0.iter()
   }

   pub fn len(&self) -> usize {
      self.0.len()
   }

   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }
}

impl FromIterator<(FieldPath, FilterCondition)> for FilterSpec {
   fn from_iter<I: IntoIterator<Item = (FieldPath, FilterCondition)>>(iter: I) -> Self {
      Self(iter.into_iter().collect())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn operator_tokens_round_trip() {
      for op in Operator::ALL {
         assert_eq!(Operator::from_token(op.as_str()), Some(op));
      }
   }

   #[test]
   fn unknown_operator_token() {
      assert_eq!(Operator::from_token("like"), None);
      assert_eq!(Operator::from_token("EQ"), None);
   }

   #[test]
   fn alternatives_skip_empty_segments() {
      let cond = FilterCondition::new(Operator::Eq, "a||b|");
      assert_eq!(cond.alternatives().collect::<Vec<_>>(), vec!["a", "b"]);
   }

   #[test]
   fn later_insert_replaces_condition() {
      let mut spec = FilterSpec::new();
      spec.insert(FieldPath::bare("name"), FilterCondition::new(Operator::Eq, "a"));
      spec.insert(
         FieldPath::bare("name"),
         FilterCondition::new(Operator::Contains, "b"),
      );

      assert_eq!(spec.len(), 1);
      assert_eq!(
         spec.get(&FieldPath::bare("name")),
         Some(&FilterCondition::new(Operator::Contains, "b"))
      );
   }
}
