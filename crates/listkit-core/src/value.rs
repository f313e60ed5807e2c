//! Comparison of JSON values with SQLite's semantics.
//!
//! Used by [`MemorySource`](crate::memory::MemorySource) so in-memory results
//! agree with what the SQLite backend returns for the same query:
//!
//! - `NULL` sorts before everything else, numbers before text.
//! - A text operand that parses as a number compares numerically against a
//!   numeric value (filter values always arrive as text).
//! - Any comparison involving `NULL` is false.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use crate::predicate::LIKE_ESCAPE;

fn as_number(value: &JsonValue) -> Option<f64> {
   match value {
      JsonValue::Number(n) => n.as_f64(),
      JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
      _ => None,
   }
}

fn as_text(value: &JsonValue) -> String {
   match value {
      JsonValue::String(s) => s.clone(),
      other => other.to_string(),
   }
}

fn type_rank(value: &JsonValue) -> u8 {
   match value {
      JsonValue::Null => 0,
      JsonValue::Bool(_) | JsonValue::Number(_) => 1,
      _ => 2,
   }
}

/// Compare a record value against a filter operand.
///
/// Returns `None` when either side is `NULL`.
pub fn compare_values(left: &JsonValue, right: &JsonValue) -> Option<Ordering> {
   if left.is_null() || right.is_null() {
      return None;
   }

   match (as_number(left), as_number(right)) {
      (Some(l), Some(r)) => return l.partial_cmp(&r),
      (Some(l), None) => {
         if let JsonValue::String(s) = right
            && let Ok(r) = s.trim().parse::<f64>()
         {
            return l.partial_cmp(&r);
         }
      }
      (None, Some(r)) => {
         if let JsonValue::String(s) = left
            && let Ok(l) = s.trim().parse::<f64>()
         {
            return l.partial_cmp(&r);
         }
      }
      (None, None) => return Some(as_text(left).cmp(&as_text(right))),
   }

   Some(type_rank(left).cmp(&type_rank(right)))
}

/// Total order used for sorting records.
pub fn sort_cmp(left: &JsonValue, right: &JsonValue) -> Ordering {
   match (left.is_null(), right.is_null()) {
      (true, true) => Ordering::Equal,
      (true, false) => Ordering::Less,
      (false, true) => Ordering::Greater,
      (false, false) => match (as_number(left), as_number(right)) {
         (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
         (None, None) => as_text(left).cmp(&as_text(right)),
         _ => type_rank(left).cmp(&type_rank(right)),
      },
   }
}

/// Match `value` against a LIKE pattern using `%` and `_` wildcards and
/// [`LIKE_ESCAPE`].
pub fn like_match(value: &JsonValue, pattern: &JsonValue, case_insensitive: bool) -> bool {
   if value.is_null() || pattern.is_null() {
      return false;
   }

   let fold = |s: String| if case_insensitive { s.to_lowercase() } else { s };
   let text: Vec<char> = fold(as_text(value)).chars().collect();
   let pattern = tokenize(&fold(as_text(pattern)));

   matches_from(&text, &pattern)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
   Literal(char),
   AnyOne,
   AnyMany,
}

fn tokenize(pattern: &str) -> Vec<Token> {
   let mut tokens = Vec::with_capacity(pattern.len());
   let mut chars = pattern.chars();

   while let Some(ch) = chars.next() {
      let token = match ch {
         LIKE_ESCAPE => match chars.next() {
            Some(escaped) => Token::Literal(escaped),
            None => Token::Literal(LIKE_ESCAPE),
         },
         '%' => Token::AnyMany,
         '_' => Token::AnyOne,
         other => Token::Literal(other),
      };
      tokens.push(token);
   }

   tokens
}

/// Iterative wildcard match with backtracking to the last `%`.
fn matches_from(text: &[char], pattern: &[Token]) -> bool {
   let (mut t, mut p) = (0, 0);
   let mut star: Option<(usize, usize)> = None;

   while t < text.len() {
      match pattern.get(p) {
         Some(Token::AnyMany) => {
            star = Some((p, t));
            p += 1;
         }
         Some(Token::AnyOne) => {
            t += 1;
            p += 1;
         }
         Some(Token::Literal(c)) if *c == text[t] => {
            t += 1;
            p += 1;
         }
         _ => match star {
            Some((sp, st)) => {
               p = sp + 1;
               t = st + 1;
               star = Some((sp, st + 1));
            }
            None => return false,
         },
      }
   }

   pattern[p..].iter().all(|tok| *tok == Token::AnyMany)
}

/// Whether the multi-valued `value` holds an element equal to `operand`.
///
/// A JSON array is searched element-wise; a string holding a JSON array is
/// parsed first, the way SQLite stores such columns as text.
pub fn has_element(value: &JsonValue, operand: &JsonValue) -> bool {
   let parsed;
   let elements = match value {
      JsonValue::Array(items) => items,
      JsonValue::String(s) => match serde_json::from_str::<JsonValue>(s) {
         Ok(JsonValue::Array(items)) => {
            parsed = items;
            &parsed
         }
         _ => return false,
      },
      _ => return false,
   };

   elements
      .iter()
      .any(|element| compare_values(element, operand) == Some(Ordering::Equal))
}
