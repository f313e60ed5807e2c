//! Backend-agnostic ordering and filter predicates.
//!
//! [`PredicateBuilder`] turns parsed [`SortSpec`]/[`FilterSpec`] values into
//! [`OrderColumn`]s and a [`Predicate`] tree over resolved [`ColumnRef`]s.
//! Relation paths (`author.name`) register a [`Join`] the first time the
//! relation is referenced; every later reference, from the ordering or from
//! the filter, reuses the same alias.
//!
//! Filter values are transformed per operator before they reach a backend:
//!
//! | operator      | comparison | value        |
//! |---------------|------------|--------------|
//! | `contains`    | `Like`     | `%value%`    |
//! | `icontains`   | `ILike`    | `%value%`    |
//! | `startswith`  | `Like`     | `value%`     |
//! | `endswith`    | `Like`     | `%value`     |
//! | `has`         | `Has`      | `value`      |
//! | anything else | literal    | `value`      |
//!
//! `%`, `_` and `\` inside the user's value are escaped with [`LIKE_ESCAPE`]
//! so only the wrapping wildcards act as wildcards.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::Error;
use crate::field::FieldPath;
use crate::filter::{FilterCondition, FilterSpec, Operator};
use crate::sort::{SortDirection, SortSpec};

/// Escape character used in `Like`/`ILike` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// A column after relation resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
   /// Join alias, `None` for columns of the listed entity.
   pub alias: Option<String>,
   pub column: String,
}

impl ColumnRef {
   pub fn root(column: impl Into<String>) -> Self {
      Self {
         alias: None,
         column: column.into(),
      }
   }

   pub fn joined(alias: impl Into<String>, column: impl Into<String>) -> Self {
      Self {
         alias: Some(alias.into()),
         column: column.into(),
      }
   }

   /// Key under which a data source exposes this column in a record:
   /// `column` or `alias.column`.
   pub fn key(&self) -> String {
      self.to_string()
   }
}

impl fmt::Display for ColumnRef {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match &self.alias {
         Some(alias) => write!(f, "{}.{}", alias, self.column),
         None => f.write_str(&self.column),
      }
   }
}

/// A relation joined into the query under `alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
   pub relation: String,
   pub alias: String,
}

/// One resolved ordering column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderColumn {
   pub column: ColumnRef,
   pub direction: SortDirection,
}

impl OrderColumn {
   pub fn new(column: ColumnRef, direction: SortDirection) -> Self {
      Self { column, direction }
   }
}

/// Return the ordering with every direction flipped.
pub fn reversed_order(order: &[OrderColumn]) -> Vec<OrderColumn> {
   order
      .iter()
      .map(|o| OrderColumn::new(o.column.clone(), o.direction.reversed()))
      .collect()
}

/// Comparison operators a backend must evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
   Eq,
   Ne,
   Gt,
   Gte,
   Lt,
   Lte,
   /// Case-sensitive pattern match with `%` wildcards.
   Like,
   /// Case-insensitive pattern match with `%` wildcards.
   ILike,
   /// The column holds several values and one of them equals the operand.
   Has,
   /// The column is `NULL`; the operand is ignored.
   IsNull,
   /// The column is not `NULL`; the operand is ignored.
   IsNotNull,
}

/// Filter predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
   And(Vec<Predicate>),
   Or(Vec<Predicate>),
   Compare {
      column: ColumnRef,
      op: CompareOp,
      value: JsonValue,
   },
}

impl Predicate {
   pub fn compare(column: ColumnRef, op: CompareOp, value: impl Into<JsonValue>) -> Self {
      Predicate::Compare {
         column,
         op,
         value: value.into(),
      }
   }

   /// `column IS NULL`.
   pub fn is_null(column: ColumnRef) -> Self {
      Predicate::compare(column, CompareOp::IsNull, JsonValue::Null)
   }

   /// `column IS NOT NULL`.
   pub fn is_not_null(column: ColumnRef) -> Self {
      Predicate::compare(column, CompareOp::IsNotNull, JsonValue::Null)
   }

   /// Conjunction of `parts`, collapsing the zero- and one-element cases.
   pub fn all(parts: Vec<Predicate>) -> Option<Predicate> {
      collapse(parts, Predicate::And)
   }

   /// Disjunction of `parts`, collapsing the zero- and one-element cases.
   pub fn any(parts: Vec<Predicate>) -> Option<Predicate> {
      collapse(parts, Predicate::Or)
   }

   /// Whether evaluating the tree needs OR support.
   pub fn is_composite(&self) -> bool {
      match self {
         Predicate::Or(_) => true,
         Predicate::And(parts) => parts.iter().any(Predicate::is_composite),
         Predicate::Compare { .. } => false,
      }
   }
}

fn collapse(mut parts: Vec<Predicate>, wrap: fn(Vec<Predicate>) -> Predicate) -> Option<Predicate> {
   match parts.len() {
      0 => None,
      1 => parts.pop(),
      _ => Some(wrap(parts)),
   }
}

/// A single comparison of a flat filter map.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
   pub op: CompareOp,
   pub value: JsonValue,
}

/// Column-to-comparison map for backends without composite expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatFilter(IndexMap<ColumnRef, Comparison>);

impl FlatFilter {
   pub fn iter(&self) -> impl Iterator<Item = (&ColumnRef, &Comparison)> {
      self.0.iter()
   }

   pub fn len(&self) -> usize {
      self.0.len()
   }

   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   /// The map as a purely conjunctive predicate.
   pub fn into_predicate(self) -> Option<Predicate> {
      Predicate::all(
         self
            .0
            .into_iter()
            .map(|(column, cmp)| Predicate::compare(column, cmp.op, cmp.value))
            .collect(),
      )
   }
}

/// Escape LIKE metacharacters in a user-supplied value.
pub fn escape_like(raw: &str) -> String {
   let mut out = String::with_capacity(raw.len());
   for ch in raw.chars() {
      if ch == '%' || ch == '_' || ch == LIKE_ESCAPE {
         out.push(LIKE_ESCAPE);
      }
      out.push(ch);
   }
   out
}

/// Transform one filter alternative into a comparison.
pub fn comparison(operator: Operator, value: &str) -> Comparison {
   let (op, value) = match operator {
      Operator::Eq => (CompareOp::Eq, value.to_string()),
      Operator::Neq => (CompareOp::Ne, value.to_string()),
      Operator::Gt => (CompareOp::Gt, value.to_string()),
      Operator::Gte => (CompareOp::Gte, value.to_string()),
      Operator::Lt => (CompareOp::Lt, value.to_string()),
      Operator::Lte => (CompareOp::Lte, value.to_string()),
      Operator::Contains => (CompareOp::Like, format!("%{}%", escape_like(value))),
      Operator::IContains => (CompareOp::ILike, format!("%{}%", escape_like(value))),
      Operator::StartsWith => (CompareOp::Like, format!("{}%", escape_like(value))),
      Operator::EndsWith => (CompareOp::Like, format!("%{}", escape_like(value))),
      Operator::Has => (CompareOp::Has, value.to_string()),
   };

   Comparison {
      op,
      value: JsonValue::String(value),
   }
}

/// Resolves field paths into columns and joins while building orderings and
/// filter predicates for one query.
#[derive(Debug, Default)]
pub struct PredicateBuilder {
   joins: Vec<Join>,
}

impl PredicateBuilder {
   pub fn new() -> Self {
      Self::default()
   }

   /// Resolve a field path, registering a join for its relation if needed.
   pub fn resolve(&mut self, field: &FieldPath) -> ColumnRef {
      let Some(relation) = field.relation() else {
         return ColumnRef::root(field.field());
      };

      let alias = match self.joins.iter().find(|j| j.relation == relation) {
         Some(join) => join.alias.clone(),
         None => {
            let alias = relation.to_string();
            self.joins.push(Join {
               relation: relation.to_string(),
               alias: alias.clone(),
            });
            alias
         }
      };

      ColumnRef::joined(alias, field.field())
   }

   /// Resolve every sort key into an ordering column.
   pub fn build_ordering(&mut self, spec: &SortSpec) -> Vec<OrderColumn> {
      spec
         .keys()
         .iter()
         .map(|key| OrderColumn::new(self.resolve(&key.field), key.direction))
         .collect()
   }

   /// Build `AND(field₁, field₂, …)` where each field is `OR(alternatives)`.
   ///
   /// Returns `None` when no field yields a comparison.
   pub fn build_filter_predicate(&mut self, spec: &FilterSpec) -> Option<Predicate> {
      let mut conjuncts = Vec::with_capacity(spec.len());

      for (field, condition) in spec.iter() {
         let column = self.resolve(field);
         let alternatives = condition
            .alternatives()
            .map(|alt| {
               let cmp = comparison(condition.operator, alt);
               Predicate::compare(column.clone(), cmp.op, cmp.value)
            })
            .collect();

         if let Some(group) = Predicate::any(alternatives) {
            conjuncts.push(group);
         }
      }

      Predicate::all(conjuncts)
   }

   /// Build a flat column map for backends that cannot express OR.
   ///
   /// # Errors
   ///
   /// Returns [`Error::UnsupportedOperation`] for any field with more than
   /// one alternative.
   pub fn build_flat_filter(&mut self, spec: &FilterSpec) -> Result<FlatFilter, Error> {
      let mut flat = FlatFilter::default();

      for (field, condition) in spec.iter() {
         let mut alternatives = condition.alternatives();
         let Some(first) = alternatives.next() else {
            continue;
         };
         if alternatives.next().is_some() {
            return Err(or_group_unsupported(field, condition));
         }

         let column = self.resolve(field);
         flat.0.insert(column, comparison(condition.operator, first));
      }

      Ok(flat)
   }

   pub fn joins(&self) -> &[Join] {
      &self.joins
   }

   pub fn into_joins(self) -> Vec<Join> {
      self.joins
   }
}

fn or_group_unsupported(field: &FieldPath, condition: &FilterCondition) -> Error {
   Error::UnsupportedOperation {
      field: field.to_string(),
      reason: format!(
         "{} alternatives require OR, which this data source cannot express",
         condition.alternatives().count()
      ),
   }
}
