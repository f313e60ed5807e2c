//! Per-endpoint listing configuration

use serde::{Deserialize, Serialize};

use crate::Error;

/// Configuration for one list endpoint
///
/// # Examples
///
/// ```
/// use listkit::ListConfig;
///
/// let config = ListConfig {
///     allowed_sort: Some(vec!["score".into(), "title".into()]),
///     default_sort: Some("-score".into()),
///     max_page_size: Some(50),
///     ..Default::default()
/// };
///
/// assert_eq!(config.page_size(None), 10);
/// assert_eq!(config.page_size(Some(500)), 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListConfig {
   /// Fields the `sort` parameter may name; `None` allows any field
   pub allowed_sort: Option<Vec<String>>,

   /// Fields the `filter` parameter may name; `None` allows any field
   pub allowed_filter: Option<Vec<String>>,

   /// Raw sort applied when the request has no `sort` parameter
   pub default_sort: Option<String>,

   /// Page size when the request has no `pageSize` parameter
   ///
   /// Default: 10
   pub default_page_size: u64,

   /// Upper bound requested page sizes are clamped to
   pub max_page_size: Option<u64>,
}

impl Default for ListConfig {
   fn default() -> Self {
      Self {
         allowed_sort: None,
         allowed_filter: None,
         default_sort: None,
         default_page_size: 10,
         max_page_size: None,
      }
   }
}

impl ListConfig {
   /// Load from JSON; missing fields take their defaults.
   pub fn from_json(json: &str) -> Result<Self, Error> {
      Ok(serde_json::from_str(json)?)
   }

   /// Effective page size for a request.
   ///
   /// Zero is passed through so the paginator can reject it.
   pub fn page_size(&self, requested: Option<u64>) -> u64 {
      let size = requested.unwrap_or(self.default_page_size);
      match self.max_page_size {
         Some(max) => size.min(max),
         None => size,
      }
   }
}
