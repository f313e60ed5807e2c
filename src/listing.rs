//! A data source bound to its endpoint configuration.

use listkit_core::{
   DataSource, KeysetRequest, Query, paginate_keyset, paginate_offset, parse_filter, parse_sort,
};
use tracing::debug;

use crate::config::ListConfig;
use crate::request::ListRequest;
use crate::response::ListResponse;

/// Serves list requests against one data source.
///
/// Every method returns the data source's own error type; request and
/// pagination errors reach it through `From<listkit_core::Error>`.
#[derive(Debug, Clone)]
pub struct Listing<S> {
   source: S,
   config: ListConfig,
}

impl<S: DataSource> Listing<S> {
   pub fn new(source: S) -> Self {
      Self::with_config(source, ListConfig::default())
   }

   pub fn with_config(source: S, config: ListConfig) -> Self {
      Self { source, config }
   }

   pub fn source(&self) -> &S {
      &self.source
   }

   pub fn config(&self) -> &ListConfig {
      &self.config
   }

   /// Plan the sorted and filtered query for a request, applying the
   /// allow-lists and the default sort.
   pub fn sort_and_filter(&self, request: &ListRequest) -> Result<Query, S::Error> {
      let raw_sort = request
         .sort()
         .or(self.config.default_sort.as_deref())
         .unwrap_or_default();
      let raw_filter = request.filter().unwrap_or_default();

      let sort = parse_sort(raw_sort, self.config.allowed_sort.as_deref());
      let filter = parse_filter(raw_filter, self.config.allowed_filter.as_deref());
      debug!(
         sort_keys = sort.keys().len(),
         filter_fields = filter.len(),
         "planned list query"
      );

      Ok(listkit_core::sort_and_filter(&self.source, &sort, &filter)?)
   }

   /// Page-number pagination from the request's `page`/`pageSize`.
   pub async fn paginate(
      &self,
      request: &ListRequest,
   ) -> Result<ListResponse<S::Record>, S::Error> {
      let page = request.page()?.unwrap_or(1);
      let page_size = self.config.page_size(request.page_size()?);
      let links = request.links()?;

      let query = self.sort_and_filter(request)?;
      let page = paginate_offset(&self.source, &query, page, page_size).await?;
      let links = links.offset_links(&page.meta);

      Ok(ListResponse::from_offset(page, links))
   }

   /// Cursor pagination from the request's `cursor`/`direction`/`pageSize`.
   pub async fn paginate_cursor(
      &self,
      request: &ListRequest,
   ) -> Result<ListResponse<S::Record>, S::Error> {
      let page_size = self.config.page_size(request.page_size()?);
      let page_size =
         usize::try_from(page_size).map_err(|_| listkit_core::Error::InvalidPageSize)?;
      let keyset = KeysetRequest {
         cursor: request.cursor()?,
         direction: request.direction()?,
         page_size,
      };
      let links = request.links()?;

      let query = self.sort_and_filter(request)?;
      let page = paginate_keyset(&self.source, &query, &keyset).await?;
      let links = links.keyset_links(&page, page_size);

      Ok(ListResponse::from_keyset(page, links))
   }
}
