//! The JSON envelope a list endpoint responds with.

use listkit_core::{KeysetPage, Links, OffsetPage, PageMeta};
use serde::Serialize;

/// Response envelope of a list endpoint.
///
/// ```json
/// { "results": [...], "meta": { "pageCount": 5, "pageSize": 2, "page": 2, "count": 9 },
///   "links": { "first": "...", "next": "...", "prev": "...", "last": "..." } }
/// ```
///
/// `meta` is only present for offset pagination.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<R> {
   pub results: Vec<R>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub meta: Option<PageMeta>,
   pub links: Links,
}

impl<R> ListResponse<R> {
   pub fn from_offset(page: OffsetPage<R>, links: Links) -> Self {
      Self {
         results: page.results,
         meta: Some(page.meta),
         links,
      }
   }

   pub fn from_keyset(page: KeysetPage<R>, links: Links) -> Self {
      Self {
         results: page.results,
         meta: None,
         links,
      }
   }
}
