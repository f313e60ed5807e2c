//! Keyset (cursor) pagination.
//!
//! Instead of skipping rows with an offset, each page is positioned relative
//! to an *anchor* record by comparing the values of every ordering column
//! against the anchor's values. With an index on the ordering columns the cost
//! of a page is proportional to its size, no total count is computed, and
//! rows inserted or removed ahead of the window do not shift it.
//!
//! # How It Works
//!
//! 1. The ordering is completed with the identifier column so it is total.
//! 2. The anchor is resolved: the cursor's record looked up by identifier, or
//!    without a cursor the first (forward) or last (backward) record found by
//!    a limit-1 lookup. A cursor that no longer resolves yields an empty page.
//! 3. A seek predicate selects the rows past the anchor:
//!
//!    ```text
//!    (c1 > v1) OR (c1 = v1 AND c2 < v2) OR (c1 = v1 AND c2 = v2 AND c3 > v3)
//!    ```
//!
//!    with `>`/`<` chosen per column direction. The last comparison becomes
//!    `>=`/`<=` when the anchor itself belongs in the page. `NULL` sorts
//!    first ascending and last descending, and the comparisons follow suit:
//!    a `NULL` anchor value seeks with `IS NULL`/`IS NOT NULL`, a non-`NULL`
//!    one also admits `NULL`s wherever they sort after it.
//! 4. Backward pages run against the fully reversed ordering and are
//!    reversed in memory afterwards, so results are always in sort order.
//!
//! Forward pages over-fetch one row to detect a following page. Backward
//! pages over-fetch two: the seek compares inclusively, so the anchor comes
//! back first and is trimmed when it was an explicit cursor, and one more row
//! reveals whether anything precedes the page.
//!
//! The no-duplicate, no-omission guarantee across successive pages holds only
//! while the ordering values of already returned rows stay unchanged.

use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::Error;
use crate::cursor::{Cursor, Direction};
use crate::predicate::{ColumnRef, CompareOp, OrderColumn, Predicate, reversed_order};
use crate::query::{DataSource, FilterMode, Query, with_tiebreaker};
use crate::sort::SortDirection;

/// Position and size of the requested window.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetRequest {
   pub cursor: Option<Cursor>,
   pub direction: Direction,
   pub page_size: usize,
}

impl KeysetRequest {
   /// The first page, without a cursor.
   pub fn first(page_size: usize) -> Self {
      Self {
         cursor: None,
         direction: Direction::Forward,
         page_size,
      }
   }

   /// The last page, without a cursor.
   pub fn last(page_size: usize) -> Self {
      Self {
         cursor: None,
         direction: Direction::Backward,
         page_size,
      }
   }

   /// The page after `cursor`.
   pub fn after(cursor: Cursor, page_size: usize) -> Self {
      Self {
         cursor: Some(cursor),
         direction: Direction::Forward,
         page_size,
      }
   }

   /// The page before `cursor`.
   pub fn before(cursor: Cursor, page_size: usize) -> Self {
      Self {
         cursor: Some(cursor),
         direction: Direction::Backward,
         page_size,
      }
   }

   /// Build the request a navigation target points at.
   pub fn from_target(target: CursorTarget, page_size: usize) -> Self {
      Self {
         cursor: target.cursor,
         direction: target.direction,
         page_size,
      }
   }
}

/// Where a `next`/`prev` link leads.
///
/// A target without a cursor re-derives the synthetic first (forward) or
/// last (backward) anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorTarget {
   pub cursor: Option<Cursor>,
   pub direction: Direction,
}

/// One window of records in sort order.
#[derive(Debug, Clone)]
pub struct KeysetPage<R> {
   pub results: Vec<R>,
   pub has_next: bool,
   pub has_prev: bool,
   /// Target of the following page, present when `has_next`.
   pub next: Option<CursorTarget>,
   /// Target of the preceding page, present when `has_prev`.
   pub prev: Option<CursorTarget>,
}

impl<R> KeysetPage<R> {
   fn empty() -> Self {
      Self {
         results: Vec::new(),
         has_next: false,
         has_prev: false,
         next: None,
         prev: None,
      }
   }
}

/// Build the seek predicate for `order` against `anchor` values.
///
/// `order` is the effective ordering, already reversed for backward traversal.
/// When `inclusive` is set the final comparison also admits the anchor row.
///
/// `NULL` sorts first in ascending and last in descending order, so a `NULL`
/// anchor value compares with `IS NULL`/`IS NOT NULL` and a non-`NULL` one
/// admits `NULL`s wherever they sort after it. Returns `None` when every row
/// qualifies, or when `order` and `anchor` differ in length.
pub fn seek_predicate(
   order: &[OrderColumn],
   anchor: &[JsonValue],
   inclusive: bool,
) -> Option<Predicate> {
   build_seek(order, anchor, inclusive, None)
}

/// Rows strictly past (or, when `inclusive`, at or past) `value` in the
/// direction of `col`.
enum Bound {
   Never,
   Always,
   When(Predicate),
}

fn bound(col: &OrderColumn, value: &JsonValue, inclusive: bool, nullable: bool) -> Bound {
   let column = col.column.clone();
   match (col.direction, value.is_null(), inclusive) {
      (SortDirection::Asc, true, false) => Bound::When(Predicate::is_not_null(column)),
      (SortDirection::Asc, true, true) => Bound::Always,
      (SortDirection::Asc, false, _) => {
         let op = if inclusive { CompareOp::Gte } else { CompareOp::Gt };
         Bound::When(Predicate::compare(column, op, value.clone()))
      }
      (SortDirection::Desc, true, false) => Bound::Never,
      (SortDirection::Desc, true, true) => Bound::When(Predicate::is_null(column)),
      (SortDirection::Desc, false, _) => {
         let op = if inclusive { CompareOp::Lte } else { CompareOp::Lt };
         let past = Predicate::compare(column.clone(), op, value.clone());
         if nullable {
            Bound::When(Predicate::Or(vec![past, Predicate::is_null(column)]))
         } else {
            Bound::When(past)
         }
      }
   }
}

fn equal(col: &OrderColumn, value: &JsonValue) -> Predicate {
   if value.is_null() {
      Predicate::is_null(col.column.clone())
   } else {
      Predicate::compare(col.column.clone(), CompareOp::Eq, value.clone())
   }
}

/// `never_null` names a column known to hold no `NULL`s, whose descending
/// comparison then stays a single comparison.
fn build_seek(
   order: &[OrderColumn],
   anchor: &[JsonValue],
   inclusive: bool,
   never_null: Option<&ColumnRef>,
) -> Option<Predicate> {
   if order.len() != anchor.len() {
      return None;
   }
   let last = order.len().checked_sub(1)?;
   let mut branches = Vec::with_capacity(order.len());

   for (level, (col, value)) in order.iter().zip(anchor).enumerate() {
      let nullable = never_null != Some(&col.column);
      let mut parts: Vec<Predicate> = order[..level]
         .iter()
         .zip(anchor)
         .map(|(col, value)| equal(col, value))
         .collect();

      match bound(col, value, inclusive && level == last, nullable) {
         Bound::Never => continue,
         Bound::Always if parts.is_empty() => return None,
         Bound::Always => {}
         Bound::When(past) => parts.push(past),
      }

      branches.extend(Predicate::all(parts));
   }

   // No branch survived: nothing lies past the anchor
   Some(Predicate::any(branches).unwrap_or(Predicate::Or(Vec::new())))
}

/// Fetch one keyset page of `query` from `source`.
///
/// The ordering of `query` is completed with the source's identifier column.
///
/// # Errors
///
/// Returns [`Error::InvalidPageSize`] for a zero page size and
/// [`Error::UnsupportedOperation`] when a flat source would need a
/// multi-column seek. Data-source failures are returned unmodified.
pub async fn paginate_keyset<S: DataSource>(
   source: &S,
   query: &Query,
   request: &KeysetRequest,
) -> Result<KeysetPage<S::Record>, S::Error> {
   let page_size = request.page_size;
   if page_size == 0 {
      return Err(Error::InvalidPageSize.into());
   }

   let backward = request.direction == Direction::Backward;
   let extra = if backward { 2 } else { 1 };
   let limit = page_size.checked_add(extra).ok_or(Error::InvalidPageSize)?;

   let order = with_tiebreaker(&query.order, source.identifier());
   if source.filter_mode() == FilterMode::Flat && order.len() > 1 {
      return Err(Error::UnsupportedOperation {
         field: order[0].column.to_string(),
         reason: format!(
            "seeking across {} ordering columns requires OR, which this data source cannot express",
            order.len()
         ),
      }
      .into());
   }

   let effective = if backward {
      reversed_order(&order)
   } else {
      order
   };
   let base = Query {
      joins: query.joins.clone(),
      filter: query.filter.clone(),
      order: effective.clone(),
      limit: None,
      offset: None,
   };

   let id_column = ColumnRef::root(source.identifier());
   let explicit = request.cursor.is_some();

   let anchor = match &request.cursor {
      Some(cursor) => source.fetch_by_id(&base, cursor.id()).await?,
      None => source
         .fetch(&base.clone().limit(1))
         .await?
         .into_iter()
         .next(),
   };

   let Some(anchor) = anchor else {
      if explicit {
         debug!("cursor no longer resolves to a record, returning an empty page");
      }
      return Ok(KeysetPage::empty());
   };

   let anchor_values = effective
      .iter()
      .map(|col| read_column(source, &anchor, &col.column))
      .collect::<Result<Vec<_>, _>>()?;
   let anchor_id = read_column(source, &anchor, &id_column)?;
   trace!(?anchor_values, explicit, backward, "resolved keyset anchor");

   let inclusive = backward || !explicit;
   let mut window = base.limit(limit);
   if let Some(seek) = build_seek(&effective, &anchor_values, inclusive, Some(&id_column)) {
      window = window.and_filter(seek);
   }

   let mut rows = source.fetch(&window).await?;

   if backward
      && explicit
      && rows
         .first()
         .is_some_and(|row| source.value_of(row, &id_column).as_ref() == Some(&anchor_id))
   {
      rows.remove(0);
   }

   let has_more = rows.len() > page_size;
   rows.truncate(page_size);
   if backward {
      rows.reverse();
   }

   let (has_next, has_prev) = if backward {
      (explicit, has_more)
   } else {
      (has_more, explicit)
   };

   let next = if has_next {
      Some(CursorTarget {
         cursor: boundary_cursor(source, rows.last(), &id_column)?,
         direction: Direction::Forward,
      })
   } else {
      None
   };
   let prev = if has_prev {
      Some(CursorTarget {
         cursor: boundary_cursor(source, rows.first(), &id_column)?,
         direction: Direction::Backward,
      })
   } else {
      None
   };

   debug!(
      rows = rows.len(),
      has_next, has_prev, "fetched keyset page"
   );

   Ok(KeysetPage {
      results: rows,
      has_next,
      has_prev,
      next,
      prev,
   })
}

fn read_column<S: DataSource>(
   source: &S,
   record: &S::Record,
   column: &ColumnRef,
) -> Result<JsonValue, Error> {
   source
      .value_of(record, column)
      .ok_or_else(|| Error::CursorColumnNotFound {
         column: column.to_string(),
      })
}

/// Cursor of a page's boundary row; `None` for an empty page, whose
/// neighbour is then reached through the synthetic anchor instead.
fn boundary_cursor<S: DataSource>(
   source: &S,
   row: Option<&S::Record>,
   id_column: &ColumnRef,
) -> Result<Option<Cursor>, Error> {
   row.map(|row| read_column(source, row, id_column).map(Cursor::new))
      .transpose()
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   fn asc(name: &str) -> OrderColumn {
      OrderColumn::new(ColumnRef::root(name), SortDirection::Asc)
   }

   fn desc(name: &str) -> OrderColumn {
      OrderColumn::new(ColumnRef::root(name), SortDirection::Desc)
   }

   fn cmp(name: &str, op: CompareOp, value: JsonValue) -> Predicate {
      Predicate::compare(ColumnRef::root(name), op, value)
   }

   fn is_null(name: &str) -> Predicate {
      Predicate::is_null(ColumnRef::root(name))
   }

   fn or_null(name: &str, op: CompareOp, value: JsonValue) -> Predicate {
      Predicate::Or(vec![cmp(name, op, value), is_null(name)])
   }

   #[test]
   fn seek_single_column_ascending_is_one_comparison() {
      let seek = seek_predicate(&[asc("id")], &[json!(42)], false).unwrap();
      assert_eq!(seek, cmp("id", CompareOp::Gt, json!(42)));
   }

   #[test]
   fn seek_descending_admits_trailing_nulls() {
      let seek = seek_predicate(&[desc("score")], &[json!(42)], false).unwrap();
      assert_eq!(seek, or_null("score", CompareOp::Lt, json!(42)));
   }

   #[test]
   fn seek_single_column_inclusive() {
      let seek = seek_predicate(&[asc("id")], &[json!(1)], true).unwrap();
      assert_eq!(seek, cmp("id", CompareOp::Gte, json!(1)));
   }

   #[test]
   fn seek_mixed_directions_expands_or_levels() {
      let order = [asc("category"), desc("score"), asc("id")];
      let anchor = [json!("tech"), json!(95), json!(42)];

      let seek = seek_predicate(&order, &anchor, false).unwrap();

      assert_eq!(
         seek,
         Predicate::Or(vec![
            cmp("category", CompareOp::Gt, json!("tech")),
            Predicate::And(vec![
               cmp("category", CompareOp::Eq, json!("tech")),
               or_null("score", CompareOp::Lt, json!(95)),
            ]),
            Predicate::And(vec![
               cmp("category", CompareOp::Eq, json!("tech")),
               cmp("score", CompareOp::Eq, json!(95)),
               cmp("id", CompareOp::Gt, json!(42)),
            ]),
         ])
      );
   }

   #[test]
   fn seek_inclusive_only_relaxes_final_comparison() {
      let order = [desc("score"), asc("id")];
      let anchor = [json!(10), json!(3)];

      let seek = seek_predicate(&order, &anchor, true).unwrap();

      assert_eq!(
         seek,
         Predicate::Or(vec![
            or_null("score", CompareOp::Lt, json!(10)),
            Predicate::And(vec![
               cmp("score", CompareOp::Eq, json!(10)),
               cmp("id", CompareOp::Gte, json!(3)),
            ]),
         ])
      );
   }

   #[test]
   fn seek_on_reversed_order_flips_operators() {
      let order = reversed_order(&[asc("a"), desc("b")]);
      let seek = seek_predicate(&order, &[json!(1), json!(2)], false).unwrap();

      assert_eq!(
         seek,
         Predicate::Or(vec![
            or_null("a", CompareOp::Lt, json!(1)),
            Predicate::And(vec![
               cmp("a", CompareOp::Eq, json!(1)),
               cmp("b", CompareOp::Gt, json!(2)),
            ]),
         ])
      );
   }

   #[test]
   fn seek_from_null_anchor_ascending() {
      let seek = seek_predicate(&[asc("score"), asc("id")], &[JsonValue::Null, json!(4)], false)
         .unwrap();

      assert_eq!(
         seek,
         Predicate::Or(vec![
            Predicate::is_not_null(ColumnRef::root("score")),
            Predicate::And(vec![is_null("score"), cmp("id", CompareOp::Gt, json!(4))]),
         ])
      );
   }

   #[test]
   fn seek_from_null_anchor_descending_stays_among_nulls() {
      let seek = seek_predicate(&[desc("score"), asc("id")], &[JsonValue::Null, json!(4)], false)
         .unwrap();

      assert_eq!(
         seek,
         Predicate::And(vec![is_null("score"), cmp("id", CompareOp::Gt, json!(4))])
      );
   }

   #[test]
   fn seek_past_last_null_matches_nothing() {
      let seek = seek_predicate(&[desc("score")], &[JsonValue::Null], false).unwrap();
      assert_eq!(seek, Predicate::Or(Vec::new()));
   }

   #[test]
   fn seek_inclusive_from_leading_null_is_unrestricted() {
      assert!(seek_predicate(&[asc("score")], &[JsonValue::Null], true).is_none());
   }

   #[test]
   fn seek_identifier_column_never_admits_null() {
      let id = ColumnRef::root("id");
      let seek = build_seek(&[desc("id")], &[json!(42)], false, Some(&id)).unwrap();
      assert_eq!(seek, cmp("id", CompareOp::Lt, json!(42)));
   }

   #[test]
   fn seek_empty_ordering() {
      assert!(seek_predicate(&[], &[], false).is_none());
   }

   #[test]
   fn seek_rejects_anchor_of_wrong_length() {
      assert!(seek_predicate(&[asc("a"), asc("id")], &[json!(1)], false).is_none());
   }

   #[test]
   fn request_constructors() {
      assert_eq!(KeysetRequest::first(5).direction, Direction::Forward);
      assert_eq!(KeysetRequest::last(5).direction, Direction::Backward);
      assert!(KeysetRequest::after(Cursor::new(1), 5).cursor.is_some());
      assert_eq!(
         KeysetRequest::before(Cursor::new(1), 5).direction,
         Direction::Backward
      );
   }
}
