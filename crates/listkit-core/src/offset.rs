//! Page-number pagination.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;
use crate::query::{DataSource, Query};

/// Count-derived metadata of an offset page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
   pub page_count: u64,
   pub page_size: u64,
   pub page: u64,
   pub count: u64,
}

/// One page of records with its metadata.
#[derive(Debug, Clone)]
pub struct OffsetPage<R> {
   pub results: Vec<R>,
   pub meta: PageMeta,
}

impl<R> OffsetPage<R> {
   pub fn has_prev(&self) -> bool {
      self.meta.page > 1
   }

   pub fn has_next(&self) -> bool {
      self.meta.page < self.meta.page_count
   }
}

/// Number of pages needed for `count` records, `0` for none.
pub fn page_count(count: u64, page_size: u64) -> u64 {
   if count == 0 || page_size == 0 {
      0
   } else {
      (count - 1) / page_size + 1
   }
}

/// Fetch page `page` (1-based) of `query` from `source`.
///
/// The count and the page are fetched with two sequential calls.
///
/// # Errors
///
/// Returns [`Error::InvalidPage`] when `page` is zero and
/// [`Error::InvalidPageSize`] when `page_size` is zero or the offset would
/// overflow. Data-source failures are returned unmodified.
pub async fn paginate_offset<S: DataSource>(
   source: &S,
   query: &Query,
   page: u64,
   page_size: u64,
) -> Result<OffsetPage<S::Record>, S::Error> {
   if page == 0 {
      return Err(Error::InvalidPage.into());
   }
   if page_size == 0 {
      return Err(Error::InvalidPageSize.into());
   }

   let skip = (page - 1)
      .checked_mul(page_size)
      .and_then(|skip| usize::try_from(skip).ok())
      .ok_or(Error::InvalidPageSize)?;
   let take = usize::try_from(page_size).map_err(|_| Error::InvalidPageSize)?;

   let count = source.count(&query.unpaged()).await?;
   let window = query.clone().offset(skip).limit(take);
   let results = source.fetch(&window).await?;

   let meta = PageMeta {
      page_count: page_count(count, page_size),
      page_size,
      page,
      count,
   };
   debug!(?meta, rows = results.len(), "fetched offset page");

   Ok(OffsetPage { results, meta })
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::memory::MemorySource;
   use serde_json::json;

   fn source(n: i64) -> MemorySource {
      MemorySource::from_values((1..=n).map(|id| json!({ "id": id })))
   }

   #[test]
   fn page_count_rounds_up() {
      assert_eq!(page_count(0, 10), 0);
      assert_eq!(page_count(1, 10), 1);
      assert_eq!(page_count(10, 10), 1);
      assert_eq!(page_count(11, 10), 2);
      assert_eq!(page_count(9, 2), 5);
   }

   #[test]
   fn meta_serializes_camel_case() {
      let meta = PageMeta {
         page_count: 5,
         page_size: 2,
         page: 2,
         count: 9,
      };

      assert_eq!(
         serde_json::to_value(meta).unwrap(),
         json!({"pageCount": 5, "pageSize": 2, "page": 2, "count": 9})
      );
   }

   #[tokio::test]
   async fn page_past_the_end_is_empty() {
      let page = paginate_offset(&source(3), &Query::default(), 4, 2).await.unwrap();

      assert!(page.results.is_empty());
      assert_eq!(page.meta.page_count, 2);
      assert!(!page.has_next());
      assert!(page.has_prev());
   }

   #[tokio::test]
   async fn empty_source_has_zero_pages() {
      let page = paginate_offset(&source(0), &Query::default(), 1, 10).await.unwrap();

      assert_eq!(page.meta.page_count, 0);
      assert_eq!(page.meta.count, 0);
   }

   #[tokio::test]
   async fn zero_page_and_page_size_are_rejected() {
      let err = paginate_offset(&source(1), &Query::default(), 0, 10).await.unwrap_err();
      assert_eq!(err, Error::InvalidPage);

      let err = paginate_offset(&source(1), &Query::default(), 1, 0).await.unwrap_err();
      assert_eq!(err, Error::InvalidPageSize);
   }
}
