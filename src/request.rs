//! The query parameters of one list request.

use listkit_core::links::{CURSOR_KEY, DIRECTION_KEY, PAGE_KEY, PAGE_SIZE_KEY};
use listkit_core::{Cursor, Direction, Error, LinkBuilder};
use url::Url;

pub const SORT_KEY: &str = "sort";
pub const FILTER_KEY: &str = "filter";

/// Base for path-only request URLs; never rendered.
const RELATIVE_BASE: &str = "http://localhost";

/// Decoded query parameters of a list request, plus the URL navigation
/// links are rendered from.
///
/// ```
/// use listkit::ListRequest;
///
/// let request = ListRequest::from_url("/posts?sort=-score&pageSize=5").unwrap();
///
/// assert_eq!(request.sort(), Some("-score"));
/// assert_eq!(request.page_size().unwrap(), Some(5));
/// assert_eq!(request.page().unwrap(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
   url: String,
   params: Vec<(String, String)>,
}

impl ListRequest {
   /// Parse the query string of an absolute or path-only URL.
   ///
   /// # Errors
   ///
   /// Returns [`Error::InvalidBaseUrl`] when `url` cannot be parsed.
   pub fn from_url(url: &str) -> Result<Self, Error> {
      let parsed = match Url::parse(url) {
         Ok(parsed) => parsed,
         Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
            .and_then(|base| base.join(url))
            .map_err(|e| invalid_url(url, e))?,
         Err(e) => return Err(invalid_url(url, e)),
      };

      let params = parsed
         .query_pairs()
         .map(|(key, value)| (key.into_owned(), value.into_owned()))
         .collect();

      Ok(Self {
         url: url.to_string(),
         params,
      })
   }

   /// Build from already decoded parameters, as a web framework's query
   /// extractor hands them over.
   pub fn new<K, V>(url: impl Into<String>, params: impl IntoIterator<Item = (K, V)>) -> Self
   where
      K: Into<String>,
      V: Into<String>,
   {
      Self {
         url: url.into(),
         params: params
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect(),
      }
   }

   pub fn url(&self) -> &str {
      &self.url
   }

   /// First value of `key`.
   pub fn param(&self, key: &str) -> Option<&str> {
      self
         .params
         .iter()
         .find(|(k, _)| k == key)
         .map(|(_, v)| v.as_str())
   }

   pub fn sort(&self) -> Option<&str> {
      self.param(SORT_KEY)
   }

   pub fn filter(&self) -> Option<&str> {
      self.param(FILTER_KEY)
   }

   pub fn page(&self) -> Result<Option<u64>, Error> {
      self.number(PAGE_KEY)
   }

   pub fn page_size(&self) -> Result<Option<u64>, Error> {
      self.number(PAGE_SIZE_KEY)
   }

   pub fn cursor(&self) -> Result<Option<Cursor>, Error> {
      match self.param(CURSOR_KEY) {
         None | Some("") => Ok(None),
         Some(token) => Cursor::decode(token).map(Some),
      }
   }

   /// Traversal direction, `forward` when absent.
   pub fn direction(&self) -> Result<Direction, Error> {
      match self.param(DIRECTION_KEY) {
         None | Some("") => Ok(Direction::default()),
         Some(raw) => raw.parse(),
      }
   }

   /// Link builder for this request's URL.
   pub fn links(&self) -> Result<LinkBuilder, Error> {
      if self.url.contains('?') {
         return LinkBuilder::new(&self.url);
      }

      // Parameters handed over separately still have to be carried over
      let mut url = self.url.clone();
      let query: String = url::form_urlencoded::Serializer::new(String::new())
         .extend_pairs(&self.params)
         .finish();
      if !query.is_empty() {
         url.push('?');
         url.push_str(&query);
      }
      LinkBuilder::new(&url)
   }

   fn number(&self, key: &str) -> Result<Option<u64>, Error> {
      let Some(raw) = self.param(key) else {
         return Ok(None);
      };

      raw.trim().parse().map(Some).map_err(|_| Error::InvalidNumber {
         key: key.to_string(),
         value: raw.to_string(),
      })
   }
}

fn invalid_url(url: &str, e: url::ParseError) -> Error {
   Error::InvalidBaseUrl {
      url: url.to_string(),
      reason: e.to_string(),
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn reads_decoded_parameters() {
      let request =
         ListRequest::from_url("https://api.test/posts?filter=title__contains:a%20b&sort=-score")
            .unwrap();

      assert_eq!(request.filter(), Some("title__contains:a b"));
      assert_eq!(request.sort(), Some("-score"));
   }

   #[test]
   fn numbers_must_be_non_negative_integers() {
      let request = ListRequest::new("/posts", [("page", "two"), ("pageSize", "-1")]);

      assert_eq!(request.page().unwrap_err().error_code(), "INVALID_NUMBER");
      assert_eq!(request.page_size().unwrap_err().error_code(), "INVALID_NUMBER");
   }

   #[test]
   fn cursor_and_direction() {
      let token = Cursor::new(12).encode();
      let request = ListRequest::new(
         "/posts",
         [("cursor", token.as_str()), ("direction", "BACKWARD")],
      );

      assert_eq!(request.cursor().unwrap(), Some(Cursor::new(12)));
      assert_eq!(request.direction().unwrap(), Direction::Backward);
   }

   #[test]
   fn missing_direction_defaults_forward() {
      let request = ListRequest::new("/posts", Vec::<(String, String)>::new());

      assert_eq!(request.direction().unwrap(), Direction::Forward);
      assert_eq!(request.cursor().unwrap(), None);
   }

   #[test]
   fn bad_cursor_and_direction_are_validation_errors() {
      let request = ListRequest::new("/posts", [("cursor", "%%%"), ("direction", "up")]);

      assert_eq!(request.cursor().unwrap_err().error_code(), "INVALID_CURSOR");
      assert_eq!(request.direction().unwrap_err().error_code(), "INVALID_DIRECTION");
   }

   #[test]
   fn links_carry_separately_supplied_parameters() {
      let request = ListRequest::new("/posts", [("sort", "name"), ("page", "3")]);

      let links = request.links().unwrap();

      assert_eq!(links.page_link(1, 5), "/posts?sort=name&page=1&pageSize=5");
   }
}
