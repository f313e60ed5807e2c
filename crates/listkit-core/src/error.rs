/// Result type alias for listkit-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for query planning and pagination.
///
/// Malformed or unknown sort/filter entries never show up here: the parser
/// drops them silently. A cursor that no longer resolves to a record is not
/// an error either; the keyset paginator answers it with an empty page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
   /// Page size must be greater than zero.
   #[error("page size must be greater than zero")]
   InvalidPageSize,

   /// Page numbers are 1-based.
   #[error("page must be 1 or greater")]
   InvalidPage,

   /// A numeric query parameter could not be parsed.
   #[error("query parameter '{key}' must be a positive integer, got '{value}'")]
   InvalidNumber { key: String, value: String },

   /// Traversal direction token is not `forward` or `backward`.
   #[error("invalid pagination direction '{0}': expected 'forward' or 'backward'")]
   InvalidDirection(String),

   /// Cursor token is not valid base64url-encoded JSON.
   #[error("invalid cursor token")]
   InvalidCursor,

   /// The data source cannot express the requested predicate.
   #[error("unsupported operation on '{field}': {reason}")]
   UnsupportedOperation { field: String, reason: String },

   /// An ordering column was missing from a record the data source returned.
   #[error("ordering column '{column}' not found in record")]
   CursorColumnNotFound { column: String },

   /// The base URL for navigation links could not be parsed.
   #[error("invalid base url '{url}': {reason}")]
   InvalidBaseUrl { url: String, reason: String },
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> &'static str {
      match self {
         Error::InvalidPageSize => "INVALID_PAGE_SIZE",
         Error::InvalidPage => "INVALID_PAGE",
         Error::InvalidNumber { .. } => "INVALID_NUMBER",
         Error::InvalidDirection(_) => "INVALID_DIRECTION",
         Error::InvalidCursor => "INVALID_CURSOR",
         Error::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
         Error::CursorColumnNotFound { .. } => "CURSOR_COLUMN_NOT_FOUND",
         Error::InvalidBaseUrl { .. } => "INVALID_BASE_URL",
      }
   }

   /// Whether the error stems from caller input (as opposed to the backend
   /// or the host's configuration).
   pub fn is_validation(&self) -> bool {
      matches!(
         self,
         Error::InvalidPageSize
            | Error::InvalidPage
            | Error::InvalidNumber { .. }
            | Error::InvalidDirection(_)
            | Error::InvalidCursor
      )
   }
}
