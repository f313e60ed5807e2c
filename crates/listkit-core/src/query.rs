//! The data-source seam.
//!
//! Paginators never talk to a storage engine directly. They describe what
//! they need as a [`Query`] and hand it to a [`DataSource`], which the
//! integration layer implements for whatever it wraps.

use std::future::Future;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::Error;
use crate::filter::FilterSpec;
use crate::predicate::{ColumnRef, Join, OrderColumn, Predicate, PredicateBuilder};
use crate::sort::{SortDirection, SortSpec};

/// A decoded record: column name to JSON value, in column order.
pub type Row = IndexMap<String, JsonValue>;

/// Which predicate shapes a data source can evaluate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
   /// Arbitrary AND/OR trees.
   #[default]
   Composite,
   /// Conjunctions of single comparisons only.
   Flat,
}

/// A backend-agnostic read request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
   /// Relations to join, in registration order.
   pub joins: Vec<Join>,
   pub filter: Option<Predicate>,
   pub order: Vec<OrderColumn>,
   pub limit: Option<usize>,
   pub offset: Option<usize>,
}

impl Query {
   /// AND `extra` onto the current filter.
   pub fn and_filter(mut self, extra: Predicate) -> Self {
      self.filter = match self.filter.take() {
         None => Some(extra),
         Some(Predicate::And(mut parts)) => {
            parts.push(extra);
            Some(Predicate::And(parts))
         }
         Some(existing) => Some(Predicate::And(vec![existing, extra])),
      };
      self
   }

   pub fn ordered_by(mut self, order: Vec<OrderColumn>) -> Self {
      self.order = order;
      self
   }

   pub fn limit(mut self, limit: usize) -> Self {
      self.limit = Some(limit);
      self
   }

   pub fn offset(mut self, offset: usize) -> Self {
      self.offset = Some(offset);
      self
   }

   /// The same joins and filter with ordering, limit and offset cleared.
   pub fn unpaged(&self) -> Self {
      Self {
         joins: self.joins.clone(),
         filter: self.filter.clone(),
         order: Vec::new(),
         limit: None,
         offset: None,
      }
   }
}

/// Capabilities a storage backend provides to the paginators.
///
/// Futures returned by the fetch methods must be `Send` so hosts can drive
/// list requests from multi-threaded runtimes.
pub trait DataSource {
   type Record;
   type Error: From<Error>;

   /// Name of the column that uniquely identifies a record.
   fn identifier(&self) -> &str;

   fn filter_mode(&self) -> FilterMode {
      FilterMode::Composite
   }

   /// Fetch the records matching `query`, honoring order, limit and offset.
   fn fetch(
      &self,
      query: &Query,
   ) -> impl Future<Output = Result<Vec<Self::Record>, Self::Error>> + Send;

   /// Fetch one record by identifier.
   ///
   /// Only the joins and ordering of `query` are consulted, so relation
   /// columns used for ordering can be read from the result.
   fn fetch_by_id(
      &self,
      query: &Query,
      id: &JsonValue,
   ) -> impl Future<Output = Result<Option<Self::Record>, Self::Error>> + Send;

   /// Count the records matching the filter of `query`.
   fn count(&self, query: &Query) -> impl Future<Output = Result<u64, Self::Error>> + Send;

   /// Read a column's value from a record fetched with the given query shape.
   fn value_of(&self, record: &Self::Record, column: &ColumnRef) -> Option<JsonValue>;
}

/// Build the sorted and filtered query for a source.
///
/// Sources in [`FilterMode::Flat`] get a purely conjunctive filter.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] when a flat source receives a
/// filter with OR alternatives.
pub fn sort_and_filter<S: DataSource>(
   source: &S,
   sort: &SortSpec,
   filter: &FilterSpec,
) -> Result<Query, Error> {
   let mut builder = PredicateBuilder::new();
   let order = builder.build_ordering(sort);
   let filter = match source.filter_mode() {
      FilterMode::Composite => builder.build_filter_predicate(filter),
      FilterMode::Flat => builder.build_flat_filter(filter)?.into_predicate(),
   };

   Ok(Query {
      joins: builder.into_joins(),
      filter,
      order,
      limit: None,
      offset: None,
   })
}

/// Append the identifier column ascending unless the ordering already has it.
pub fn with_tiebreaker(order: &[OrderColumn], identifier: &str) -> Vec<OrderColumn> {
   let tiebreaker = ColumnRef::root(identifier);
   let mut order = order.to_vec();
   if !order.iter().any(|o| o.column == tiebreaker) {
      order.push(OrderColumn::new(tiebreaker, SortDirection::Asc));
   }
   order
}
