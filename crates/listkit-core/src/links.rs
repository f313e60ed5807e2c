//! Navigation links for list responses.
//!
//! Links are rendered from the request URL: the pagination keys are replaced
//! and every other query parameter is carried over in its original order.

use serde::{Deserialize, Serialize};
use url::{Position, Url};

use crate::Error;
use crate::cursor::{Cursor, Direction};
use crate::keyset::{CursorTarget, KeysetPage};
use crate::offset::PageMeta;

pub const PAGE_KEY: &str = "page";
pub const PAGE_SIZE_KEY: &str = "pageSize";
pub const CURSOR_KEY: &str = "cursor";
pub const DIRECTION_KEY: &str = "direction";

/// Query keys owned by the paginators.
pub const PAGINATION_KEYS: [&str; 4] = [PAGE_KEY, PAGE_SIZE_KEY, CURSOR_KEY, DIRECTION_KEY];

/// Base for path-only request URLs; never rendered.
const RELATIVE_BASE: &str = "http://localhost";

/// `first`/`next`/`prev`/`last` URLs, `None` where there is no such page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
   pub first: Option<String>,
   pub next: Option<String>,
   pub prev: Option<String>,
   pub last: Option<String>,
}

/// Renders pagination URLs for one request.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
   base: Url,
   relative: bool,
   preserved: Vec<(String, String)>,
}

impl LinkBuilder {
   /// Build from the request URL, absolute or path-only.
   ///
   /// # Errors
   ///
   /// Returns [`Error::InvalidBaseUrl`] when `url` cannot be parsed.
   pub fn new(url: &str) -> Result<Self, Error> {
      let invalid = |e: url::ParseError| Error::InvalidBaseUrl {
         url: url.to_string(),
         reason: e.to_string(),
      };

      match Url::parse(url) {
         Ok(parsed) => Ok(Self::from_url(parsed)),
         Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE).map_err(invalid)?;
            let parsed = base.join(url).map_err(invalid)?;
            Ok(Self {
               relative: true,
               ..Self::from_url(parsed)
            })
         }
         Err(e) => Err(invalid(e)),
      }
   }

   pub fn from_url(mut url: Url) -> Self {
      let preserved = url
         .query_pairs()
         .filter(|(key, _)| !PAGINATION_KEYS.contains(&key.as_ref()))
         .map(|(key, value)| (key.into_owned(), value.into_owned()))
         .collect();
      url.set_query(None);
      url.set_fragment(None);

      Self {
         base: url,
         relative: false,
         preserved,
      }
   }

   /// Non-pagination parameters of the request, in order.
   pub fn preserved(&self) -> &[(String, String)] {
      &self.preserved
   }

   fn render(&self, pagination: &[(&str, String)]) -> String {
      let mut url = self.base.clone();
      {
         let mut pairs = url.query_pairs_mut();
         for (key, value) in &self.preserved {
            pairs.append_pair(key, value);
         }
         for (key, value) in pagination {
            pairs.append_pair(key, value);
         }
      }

      if self.relative {
         url[Position::BeforePath..].to_string()
      } else {
         url.to_string()
      }
   }

   /// URL of page `page` of an offset listing.
   pub fn page_link(&self, page: u64, page_size: u64) -> String {
      self.render(&[
         (PAGE_KEY, page.to_string()),
         (PAGE_SIZE_KEY, page_size.to_string()),
      ])
   }

   /// URL of a keyset page. Without a cursor the target is the first
   /// (forward) or last (backward) page.
   pub fn cursor_link(
      &self,
      cursor: Option<&Cursor>,
      direction: Direction,
      page_size: usize,
   ) -> String {
      let mut pagination = Vec::with_capacity(3);
      if let Some(cursor) = cursor {
         pagination.push((CURSOR_KEY, cursor.encode()));
      }
      pagination.push((DIRECTION_KEY, direction.to_string()));
      pagination.push((PAGE_SIZE_KEY, page_size.to_string()));
      self.render(&pagination)
   }

   fn target_link(&self, target: &CursorTarget, page_size: usize) -> String {
      self.cursor_link(target.cursor.as_ref(), target.direction, page_size)
   }

   pub fn offset_links(&self, meta: &PageMeta) -> Links {
      Links {
         first: Some(self.page_link(1, meta.page_size)),
         next: (meta.page < meta.page_count).then(|| self.page_link(meta.page + 1, meta.page_size)),
         prev: (meta.page > 1).then(|| self.page_link(meta.page - 1, meta.page_size)),
         last: Some(self.page_link(meta.page_count.max(1), meta.page_size)),
      }
   }

   pub fn keyset_links<R>(&self, page: &KeysetPage<R>, page_size: usize) -> Links {
      Links {
         first: Some(self.cursor_link(None, Direction::Forward, page_size)),
         next: page.next.as_ref().map(|t| self.target_link(t, page_size)),
         prev: page.prev.as_ref().map(|t| self.target_link(t, page_size)),
         last: Some(self.cursor_link(None, Direction::Backward, page_size)),
      }
   }
}
