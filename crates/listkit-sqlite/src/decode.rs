//! Decoding of SQLite rows into JSON records.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use listkit_core::Row;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Column, Row as _, TypeInfo, Value, ValueRef};

use crate::Error;

/// Convert one SQLite value to JSON.
///
/// BLOBs become standard base64 strings.
pub(crate) fn to_json(v: SqliteValueRef<'_>) -> Result<JsonValue, Error> {
   if v.is_null() {
      return Ok(JsonValue::Null);
   }

   let type_name = v.type_info().name().to_string();
   let value = v.to_owned();

   let json = match type_name.as_str() {
      "TEXT" | "DATE" | "TIME" | "DATETIME" => {
         JsonValue::String(value.try_decode_unchecked::<String>()?)
      }
      "REAL" => JsonValue::from(value.try_decode_unchecked::<f64>()?),
      "INTEGER" | "NUMERIC" | "INT8" | "BIGINT" => {
         JsonValue::from(value.try_decode_unchecked::<i64>()?)
      }
      "BOOLEAN" => JsonValue::Bool(value.try_decode_unchecked::<bool>()?),
      "BLOB" => {
         let bytes = value.try_decode_unchecked::<Vec<u8>>()?;
         JsonValue::String(STANDARD.encode(bytes))
      }
      "NULL" => JsonValue::Null,
      _ => return Err(Error::UnsupportedDatatype(type_name)),
   };

   Ok(json)
}

/// Decode a row into column name to value, in column order.
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Row, Error> {
   let mut record = Row::with_capacity(row.columns().len());
   for (i, column) in row.columns().iter().enumerate() {
      let value = to_json(row.try_get_raw(i)?)?;
      record.insert(column.name().to_string(), value);
   }
   Ok(record)
}

pub(crate) fn decode_rows(rows: Vec<SqliteRow>) -> Result<Vec<Row>, Error> {
   rows.iter().map(decode_row).collect()
}
