//! # listkit
//!
//! List endpoints driven by query parameters: `sort` and `filter` grammars,
//! page-number pagination and keyset (cursor) pagination, with navigation
//! links that preserve the caller's parameters.
//!
//! ## Core Types
//!
//! - **[`ListRequest`]**: the decoded query parameters of one request
//! - **[`ListConfig`]**: per-endpoint allow-lists, default sort and page sizes
//! - **[`Listing`]**: a data source bound to its configuration
//! - **[`ListResponse`]**: the `results`/`meta`/`links` envelope
//! - **[`Error`]**: error type for request parsing and configuration
//!
//! Storage is pluggable through [`DataSource`]. [`MemorySource`] serves
//! in-memory rows; with the `sqlite` feature, `listkit_sqlite::SqliteSource`
//! compiles the same queries to SQL.
//!
//! ## Example
//!
//! ```
//! use listkit::{ListConfig, ListRequest, Listing, MemorySource};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let source = MemorySource::from_values([
//!    json!({"id": 1, "name": "ann", "score": 3}),
//!    json!({"id": 2, "name": "bob", "score": 9}),
//!    json!({"id": 3, "name": "cyd", "score": 5}),
//! ]);
//! let listing = Listing::with_config(source, ListConfig {
//!    default_sort: Some("-score".into()),
//!    ..Default::default()
//! });
//!
//! let request = ListRequest::from_url("/people?pageSize=2").unwrap();
//! let response = listing.paginate(&request).await.unwrap();
//!
//! assert_eq!(response.results[0]["name"], "bob");
//! assert_eq!(response.links.next.as_deref(), Some("/people?page=2&pageSize=2"));
//! # }
//! ```

mod config;
mod error;
mod listing;
mod request;
mod response;

pub use config::ListConfig;
pub use error::{Error, Result};
pub use listing::Listing;
pub use request::{FILTER_KEY, ListRequest, SORT_KEY};
pub use response::ListResponse;

pub use listkit_core::{
   Cursor, CursorTarget, DataSource, Direction, FilterMode, KeysetPage, KeysetRequest,
   LinkBuilder, Links, MemorySource, OffsetPage, PageMeta, Query, Row, paginate_keyset,
   paginate_offset, parse_filter, parse_sort, sort_and_filter,
};

#[cfg(feature = "sqlite")]
pub use listkit_sqlite;
