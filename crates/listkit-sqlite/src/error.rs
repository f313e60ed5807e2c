/// Result type alias for SQLite data source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the SQLite data source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Query planning or pagination error.
   #[error(transparent)]
   Query(#[from] listkit_core::Error),

   /// I/O error when accessing database files.
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   /// Database has been closed and cannot be used.
   #[error("database has been closed")]
   DatabaseClosed,

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Identifier contains characters that cannot be interpolated into SQL.
   ///
   /// Table, column and relation names must match `[a-zA-Z_][a-zA-Z0-9_]*`.
   #[error("invalid identifier '{name}': must match [a-zA-Z_][a-zA-Z0-9_]*")]
   InvalidColumnName { name: String },

   /// A query joins a relation the table does not declare.
   #[error("table '{table}' has no relation '{relation}'")]
   UnknownRelation { table: String, relation: String },

   /// A `COUNT(*)` query did not return a non-negative integer.
   #[error("count query returned {0}")]
   InvalidCount(String),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::Query(e) => e.error_code().to_string(),
         Error::Io(_) => "IO_ERROR".to_string(),
         Error::DatabaseClosed => "DATABASE_CLOSED".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::InvalidColumnName { .. } => "INVALID_COLUMN_NAME".to_string(),
         Error::UnknownRelation { .. } => "UNKNOWN_RELATION".to_string(),
         Error::InvalidCount(_) => "INVALID_COUNT".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_query_passes_through() {
      let err = Error::from(listkit_core::Error::InvalidCursor);
      assert_eq!(err.error_code(), "INVALID_CURSOR");
      assert_eq!(err.to_string(), "invalid cursor token");
   }

   #[test]
   fn test_error_code_unsupported_datatype() {
      let err = Error::UnsupportedDatatype("WEIRD".into());
      assert_eq!(err.error_code(), "UNSUPPORTED_DATATYPE");
   }

   #[test]
   fn test_error_code_io() {
      let err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
      assert_eq!(err.error_code(), "IO_ERROR");
   }

   #[test]
   fn test_error_code_sqlx_non_database() {
      // RowNotFound is not a database error, so no SQLite code
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
   }

   #[test]
   fn test_error_code_database_closed() {
      assert_eq!(Error::DatabaseClosed.error_code(), "DATABASE_CLOSED");
   }

   #[test]
   fn test_error_code_invalid_column_name() {
      let err = Error::InvalidColumnName {
         name: "bad;name".into(),
      };
      assert_eq!(err.error_code(), "INVALID_COLUMN_NAME");
      assert!(err.to_string().contains("bad;name"));
   }

   #[test]
   fn test_error_code_unknown_relation() {
      let err = Error::UnknownRelation {
         table: "posts".into(),
         relation: "editor".into(),
      };
      assert_eq!(err.error_code(), "UNKNOWN_RELATION");
      assert!(err.to_string().contains("editor"));
   }
}
