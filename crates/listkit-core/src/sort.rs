//! Sort specifications.
//!
//! A [`SortSpec`] is an ordered list of [`SortKey`]s: the first key is the
//! primary ordering, every later key breaks ties left by the ones before it.
//!
//! ```
//! use listkit_core::{SortKey, SortSpec};
//!
//! let spec = SortSpec::new(vec![SortKey::asc("category"), SortKey::desc("score")]);
//! assert_eq!(spec.keys()[0], SortKey::asc("category"));
//! assert_eq!(spec.keys().len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::field::FieldPath;

/// Sort direction for an ordering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
   /// Ascending order (smallest first)
   Asc,
   /// Descending order (largest first)
   Desc,
}

impl SortDirection {
   /// Return the opposite sort direction.
   pub fn reversed(self) -> Self {
      match self {
         SortDirection::Asc => SortDirection::Desc,
         SortDirection::Desc => SortDirection::Asc,
      }
   }
}

/// One entry of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
   pub field: FieldPath,
   pub direction: SortDirection,
}

impl SortKey {
   /// Create a sort key with ascending direction on a bare field.
   pub fn asc(field: impl Into<String>) -> Self {
      Self {
         field: FieldPath::bare(field),
         direction: SortDirection::Asc,
      }
   }

   /// Create a sort key with descending direction on a bare field.
   pub fn desc(field: impl Into<String>) -> Self {
      Self {
         field: FieldPath::bare(field),
         direction: SortDirection::Desc,
      }
   }

   pub fn new(field: FieldPath, direction: SortDirection) -> Self {
      Self { field, direction }
   }
}

/// Ordered sequence of sort keys, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec(Vec<SortKey>);

impl SortSpec {
   pub fn new(keys: Vec<SortKey>) -> Self {
      Self(keys)
   }

   pub fn keys(&self) -> &[SortKey] {
      &self.0
   }

   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   pub fn push(&mut self, key: SortKey) {
      self.0.push(key);
   }
}

impl FromIterator<SortKey> for SortSpec {
   fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
      Self(iter.into_iter().collect())
   }
}
