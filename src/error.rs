/// Result type alias for listkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for list endpoints.
///
/// [`Listing`](crate::Listing) returns its data source's own error type, so
/// this enum covers what happens around a listing: reading request
/// parameters and loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Invalid request parameter, pagination or planning error.
   #[error(transparent)]
   Query(#[from] listkit_core::Error),

   /// Error from the SQLite data source.
   #[cfg(feature = "sqlite")]
   #[error(transparent)]
   Sqlite(#[from] listkit_sqlite::Error),

   /// Configuration could not be deserialized.
   #[error("invalid list configuration: {0}")]
   Config(#[from] serde_json::Error),
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::Query(e) => e.error_code().to_string(),
         #[cfg(feature = "sqlite")]
         Error::Sqlite(e) => e.error_code(),
         Error::Config(_) => "INVALID_CONFIG".to_string(),
      }
   }

   /// Whether the error stems from the request rather than the server.
   pub fn is_validation(&self) -> bool {
      matches!(self, Error::Query(e) if e.is_validation())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_query() {
      let err = Error::from(listkit_core::Error::InvalidPage);
      assert_eq!(err.error_code(), "INVALID_PAGE");
      assert!(err.is_validation());
   }

   #[test]
   fn test_error_code_config() {
      let err = Error::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
      assert_eq!(err.error_code(), "INVALID_CONFIG");
      assert!(!err.is_validation());
   }

   #[cfg(feature = "sqlite")]
   #[test]
   fn test_error_code_sqlite() {
      let err = Error::from(listkit_sqlite::Error::DatabaseClosed);
      assert_eq!(err.error_code(), "DATABASE_CLOSED");
   }
}
