//! # listkit-sqlite
//!
//! SQLite data source for listkit, built on SQLx.
//!
//! ## Core Types
//!
//! - **[`SqliteDatabase`]**: read-only pool for list queries plus a single-connection writer
//! - **[`SqliteDatabaseConfig`]**: configuration for the connection pools
//! - **[`TableSource`]**: the listed table, its identifier column and its relations
//! - **[`SqliteSource`]**: [`DataSource`](listkit_core::DataSource) over one table
//! - **[`Error`]**: error type for database operations
//!
//! ## Query Compilation
//!
//! - Filters and orderings compile to SQL with validated, double-quoted
//!   identifiers and `$N` placeholders.
//! - `contains`/`startswith`/`endswith` compile to `LIKE … ESCAPE '\'`, which
//!   is case-sensitive on the read pool; `icontains` lowers both sides.
//! - `has` tests membership in a column holding a JSON array.
//! - Each referenced relation becomes a `LEFT JOIN` on its declared keys.

mod config;
mod database;
mod decode;
mod error;
mod sql;
mod source;

pub use config::SqliteDatabaseConfig;
pub use database::SqliteDatabase;
pub use error::{Error, Result};
pub use source::{Relation, SqliteSource, TableSource};
