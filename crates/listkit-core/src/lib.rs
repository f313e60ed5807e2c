//! # listkit-core
//!
//! Query planning and pagination for list endpoints, independent of any
//! storage engine.
//!
//! ## Core Types
//!
//! - **[`SortSpec`]** / **[`FilterSpec`]**: parsed `sort` and `filter` query parameters
//! - **[`PredicateBuilder`]**: resolves field paths into columns, joins and a predicate tree
//! - **[`DataSource`]**: the seam a storage backend implements
//! - **[`paginate_offset`]**: page-number pagination with count metadata
//! - **[`paginate_keyset`]**: cursor pagination over arbitrary multi-column orderings
//! - **[`LinkBuilder`]**: `first`/`next`/`prev`/`last` URLs preserving the request's parameters
//! - **[`Error`]**: error type for planning and pagination
//!
//! ## Flow
//!
//! ```text
//! raw query ─► parse_sort / parse_filter ─► SortSpec, FilterSpec
//!           ─► sort_and_filter ─► Query ─► paginate_offset | paginate_keyset
//!           ─► results + LinkBuilder links
//! ```

mod cursor;
mod error;
mod field;
mod filter;
mod offset;
mod parse;
mod query;
mod sort;
mod value;

pub mod keyset;
pub mod links;
pub mod memory;
pub mod predicate;

pub use cursor::{Cursor, Direction};
pub use error::{Error, Result};
pub use field::FieldPath;
pub use filter::{FilterCondition, FilterSpec, Operator};
pub use keyset::{CursorTarget, KeysetPage, KeysetRequest, paginate_keyset, seek_predicate};
pub use links::{LinkBuilder, Links};
pub use memory::MemorySource;
pub use offset::{OffsetPage, PageMeta, page_count, paginate_offset};
pub use parse::{parse_filter, parse_sort};
pub use predicate::{
   ColumnRef, CompareOp, Comparison, FlatFilter, Join, LIKE_ESCAPE, OrderColumn, Predicate,
   PredicateBuilder,
};
pub use query::{DataSource, FilterMode, Query, Row, sort_and_filter, with_tiebreaker};
pub use sort::{SortDirection, SortKey, SortSpec};
