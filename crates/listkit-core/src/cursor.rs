//! Cursor tokens and traversal direction.
//!
//! A cursor is the identifier of a record, nothing more. Its wire form is the
//! base64url (unpadded) encoding of the identifier's JSON text, so string and
//! numeric identifiers survive the trip through a query string unchanged.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Error;

/// Traversal direction relative to the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
   /// Records after the cursor, in sort order.
   #[default]
   Forward,
   /// Records before the cursor, still returned in sort order.
   Backward,
}

impl Direction {
   pub fn as_str(self) -> &'static str {
      match self {
         Direction::Forward => "forward",
         Direction::Backward => "backward",
      }
   }
}

impl FromStr for Direction {
   type Err = Error;

   fn from_str(s: &str) -> Result<Self, Self::Err> {
      match s.to_ascii_lowercase().as_str() {
         "forward" => Ok(Direction::Forward),
         "backward" => Ok(Direction::Backward),
         _ => Err(Error::InvalidDirection(s.to_string())),
      }
   }
}

impl fmt::Display for Direction {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

/// Opaque pointer to a record by identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor(JsonValue);

impl Cursor {
   pub fn new(id: impl Into<JsonValue>) -> Self {
      Self(id.into())
   }

   /// Identifier of the record this cursor points at.
   pub fn id(&self) -> &JsonValue {
      &self.0
   }

   /// Encode to a URL-safe token.
   pub fn encode(&self) -> String {
      URL_SAFE_NO_PAD.encode(self.0.to_string())
   }

   /// Decode a token produced by [`Cursor::encode`].
   ///
   /// # Errors
   ///
   /// Returns [`Error::InvalidCursor`] when the token is not base64url or
   /// does not hold JSON.
   pub fn decode(token: &str) -> Result<Self, Error> {
      let bytes = URL_SAFE_NO_PAD
         .decode(token.trim())
         .map_err(|_| Error::InvalidCursor)?;
      let id = serde_json::from_slice(&bytes).map_err(|_| Error::InvalidCursor)?;
      Ok(Self(id))
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   #[test]
   fn direction_parses_case_insensitively() {
      assert_eq!("forward".parse::<Direction>().unwrap(), Direction::Forward);
      assert_eq!("Backward".parse::<Direction>().unwrap(), Direction::Backward);
   }

   #[test]
   fn direction_rejects_unknown_token() {
      let err = "sideways".parse::<Direction>().unwrap_err();
      assert_eq!(err, Error::InvalidDirection("sideways".into()));
   }

   #[test]
   fn cursor_token_preserves_identifier_type() {
      let numeric = Cursor::decode(&Cursor::new(42).encode()).unwrap();
      assert_eq!(numeric.id(), &json!(42));

      let text = Cursor::decode(&Cursor::new("42").encode()).unwrap();
      assert_eq!(text.id(), &json!("42"));
   }

   #[test]
   fn cursor_token_is_url_safe() {
      let token = Cursor::new("a/b+c?d").encode();
      assert!(
         token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
      );
   }

   #[test]
   fn cursor_decode_rejects_garbage() {
      assert_eq!(Cursor::decode("***"), Err(Error::InvalidCursor));
      // valid base64url, but not JSON
      assert_eq!(
         Cursor::decode(&URL_SAFE_NO_PAD.encode("not json")),
         Err(Error::InvalidCursor)
      );
   }
}
