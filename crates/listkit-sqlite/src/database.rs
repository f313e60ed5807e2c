//! SQLite database with a read pool for list queries and a single writer

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use listkit_core::Row;
use serde_json::Value as JsonValue;
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, trace};

use crate::config::SqliteDatabaseConfig;
use crate::decode::decode_rows;
use crate::error::{Error, Result};

/// SQLite database with connection pooling for concurrent reads and exclusive writes.
///
/// ## Architecture
///
/// - **`read_pool`**: read-only connections serving list queries. Every
///   connection runs with `case_sensitive_like = ON`, so `LIKE` compares
///   case-sensitively and case-insensitive matching is spelled out with
///   `LOWER()` on both sides.
/// - **`write_conn`**: single-connection pool, serializing writes.
///
/// WAL journal mode is enabled lazily on the first write.
#[derive(Debug)]
pub struct SqliteDatabase {
   read_pool: Pool<Sqlite>,
   write_conn: Pool<Sqlite>,
   wal_initialized: AtomicBool,
   closed: AtomicBool,
   path: PathBuf,
}

impl SqliteDatabase {
   /// Open (creating if missing) the database file at `path`.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let path = path.as_ref().to_path_buf();
      let config = custom_config.unwrap_or_default();

      if let Some(parent) = path.parent()
         && !parent.as_os_str().is_empty()
      {
         tokio::fs::create_dir_all(parent).await?;
      }

      // The writer connects first so the file exists before read-only opens
      let write_options = SqliteConnectOptions::new()
         .filename(&path)
         .create_if_missing(true)
         .busy_timeout(config.busy_timeout);
      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .idle_timeout(config.idle_timeout)
         .connect_with(write_options)
         .await?;

      let read_options = SqliteConnectOptions::new()
         .filename(&path)
         .read_only(true)
         .busy_timeout(config.busy_timeout)
         .pragma("case_sensitive_like", "ON");
      let read_pool = SqlitePoolOptions::new()
         .max_connections(config.max_read_connections)
         .idle_timeout(config.idle_timeout)
         .connect_with(read_options)
         .await?;

      debug!(
         path = %path.display(),
         max_read_connections = config.max_read_connections,
         "connected to sqlite database"
      );

      Ok(Arc::new(Self {
         read_pool,
         write_conn,
         wal_initialized: AtomicBool::new(false),
         closed: AtomicBool::new(false),
         path,
      }))
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   fn ensure_open(&self) -> Result<()> {
      if self.closed.load(Ordering::Acquire) {
         return Err(Error::DatabaseClosed);
      }
      Ok(())
   }

   /// The read-only pool.
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      self.ensure_open()?;
      Ok(&self.read_pool)
   }

   /// Acquire the single write connection, enabling WAL on first use.
   pub async fn acquire_writer(&self) -> Result<PoolConnection<Sqlite>> {
      self.ensure_open()?;
      let mut conn = self.write_conn.acquire().await?;

      if !self.wal_initialized.load(Ordering::Acquire) {
         sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&mut *conn)
            .await?;
         self.wal_initialized.store(true, Ordering::Release);
         debug!(path = %self.path.display(), "enabled WAL journal mode");
      }

      Ok(conn)
   }

   /// Run a write statement and return the number of affected rows.
   pub async fn execute(&self, query: &str, values: Vec<JsonValue>) -> Result<u64> {
      let mut writer = self.acquire_writer().await?;

      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      let result = q.execute(&mut *writer).await?;
      Ok(result.rows_affected())
   }

   /// Run a SELECT on the read pool and decode every row.
   pub async fn fetch_all(&self, query: &str, values: Vec<JsonValue>) -> Result<Vec<Row>> {
      let pool = self.read_pool()?;
      trace!(sql = query, binds = values.len(), "fetching rows");

      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      let rows = q.fetch_all(pool).await?;
      decode_rows(rows)
   }

   /// Close both pools. Later calls fail with [`Error::DatabaseClosed`].
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      self.read_pool.close().await;
      self.write_conn.close().await;
      debug!(path = %self.path.display(), "closed sqlite database");
      Ok(())
   }

   /// Close the database and delete its file along with WAL side files.
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      let mut wal = self.path.clone().into_os_string();
      wal.push("-wal");
      let mut shm = self.path.clone().into_os_string();
      shm.push("-shm");

      for file in [self.path.clone(), PathBuf::from(wal), PathBuf::from(shm)] {
         match tokio::fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
         }
      }

      Ok(())
   }
}

/// Bind a JSON value to a SQLx query.
///
/// Arrays and objects are bound as their JSON text, the form `json_each()`
/// reads.
pub(crate) fn bind_value<'a>(
   query: Query<'a, Sqlite, SqliteArguments<'a>>,
   value: JsonValue,
) -> Query<'a, Sqlite, SqliteArguments<'a>> {
   match value {
      JsonValue::Null => query.bind(None::<String>),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Number(number) => {
         // Preserve integer precision by binding as i64 when possible
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else if let Some(uint_val) = number.as_u64() {
            // Too large for SQLite's INTEGER, fall back to REAL
            query.bind(uint_val as f64)
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      other @ (JsonValue::Array(_) | JsonValue::Object(_)) => query.bind(other.to_string()),
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;
   use tempfile::TempDir;

   async fn create_test_db() -> (Arc<SqliteDatabase>, TempDir) {
      let temp_dir = TempDir::new().expect("Failed to create temp directory");
      let db_path = temp_dir.path().join("test.db");
      let db = SqliteDatabase::connect(&db_path, None)
         .await
         .expect("Failed to connect to test database");

      (db, temp_dir)
   }

   #[tokio::test]
   async fn test_execute_and_fetch() {
      let (db, _temp) = create_test_db().await;

      db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", vec![])
         .await
         .unwrap();
      let affected = db
         .execute(
            "INSERT INTO t (id, name) VALUES ($1, $2), ($3, $4)",
            vec![json!(1), json!("a"), json!(2), json!("b")],
         )
         .await
         .unwrap();
      assert_eq!(affected, 2);

      let rows = db
         .fetch_all("SELECT id, name FROM t WHERE id > $1 ORDER BY id", vec![json!(0)])
         .await
         .unwrap();

      assert_eq!(rows.len(), 2);
      assert_eq!(rows[0]["id"], json!(1));
      assert_eq!(rows[1]["name"], json!("b"));

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_type_decoding() {
      let (db, _temp) = create_test_db().await;

      db.execute(
         "CREATE TABLE t (i INTEGER, r REAL, s TEXT, b BLOB, n TEXT)",
         vec![],
      )
      .await
      .unwrap();
      db.execute(
         "INSERT INTO t VALUES (42, 1.5, 'x', x'0102', NULL)",
         vec![],
      )
      .await
      .unwrap();

      let rows = db.fetch_all("SELECT * FROM t", vec![]).await.unwrap();

      assert_eq!(
         serde_json::to_value(&rows[0]).unwrap(),
         json!({"i": 42, "r": 1.5, "s": "x", "b": "AQI=", "n": null})
      );

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_column_order_preserved() {
      let (db, _temp) = create_test_db().await;

      let rows = db
         .fetch_all("SELECT 1 AS zeta, 2 AS alpha, 3 AS mid", vec![])
         .await
         .unwrap();
      let keys: Vec<_> = rows[0].keys().map(String::as_str).collect();

      assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_like_is_case_sensitive_on_read_pool() {
      let (db, _temp) = create_test_db().await;

      let rows = db
         .fetch_all(
            "SELECT 'Apple' LIKE 'apple' AS plain, LOWER('Apple') LIKE LOWER('APPLE') AS folded",
            vec![],
         )
         .await
         .unwrap();

      assert_eq!(rows[0]["plain"], json!(0));
      assert_eq!(rows[0]["folded"], json!(1));

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_closed_database_rejects_queries() {
      let (db, _temp) = create_test_db().await;
      db.close().await.unwrap();

      let err = db.fetch_all("SELECT 1", vec![]).await.unwrap_err();
      assert!(matches!(err, Error::DatabaseClosed));

      // closing twice is fine
      db.close().await.unwrap();
   }

   #[tokio::test]
   async fn test_remove_deletes_files() {
      let (db, temp) = create_test_db().await;
      db.execute("CREATE TABLE t (id INTEGER)", vec![])
         .await
         .unwrap();

      db.remove().await.unwrap();

      assert!(!temp.path().join("test.db").exists());
      assert!(!temp.path().join("test.db-wal").exists());
   }
}
