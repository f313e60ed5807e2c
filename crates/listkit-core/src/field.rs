//! Field paths as they appear in sort and filter parameters.

use std::fmt;

/// A bare field name or a `relation.field` pair.
///
/// A relation path denotes exactly one level of join traversal. Deeper paths
/// such as `author.company.name` do not parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
   relation: Option<String>,
   field: String,
}

impl FieldPath {
   /// A field on the listed entity itself.
   pub fn bare(field: impl Into<String>) -> Self {
      Self {
         relation: None,
         field: field.into(),
      }
   }

   /// A field reached through one relation.
   pub fn related(relation: impl Into<String>, field: impl Into<String>) -> Self {
      Self {
         relation: Some(relation.into()),
         field: field.into(),
      }
   }

   /// Parse `field` or `relation.field`.
   ///
   /// Returns `None` for empty segments and for paths with more than one dot.
   pub fn parse(raw: &str) -> Option<Self> {
      let mut segments = raw.split('.');
      let first = segments.next()?;
      let second = segments.next();
      if segments.next().is_some() || first.trim().is_empty() {
         return None;
      }

      match second {
         None => Some(Self::bare(first)),
         Some(field) if !field.trim().is_empty() => Some(Self::related(first, field)),
         Some(_) => None,
      }
   }

   pub fn relation(&self) -> Option<&str> {
      self.relation.as_deref()
   }

   pub fn field(&self) -> &str {
      &self.field
   }

   pub fn is_bare(&self) -> bool {
      self.relation.is_none()
   }
}

impl fmt::Display for FieldPath {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match &self.relation {
         Some(relation) => write!(f, "{}.{}", relation, self.field),
         None => f.write_str(&self.field),
      }
   }
}
