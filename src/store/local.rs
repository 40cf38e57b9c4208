//! SQLite-backed stand-in for the hosted backend. Rows are kept as JSON
//! documents keyed by table and id; uploaded images land in a directory next
//! to the database. Used when no backend URL is configured, and by tests.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use log::debug;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use super::{BlobStore, OrderBy, Row, TableStore};
use crate::error::StoreError;
use crate::models::RecordId;

pub struct LocalStore {
    conn: Mutex<Connection>,
    blob_dir: PathBuf,
}

impl LocalStore {
    /// Open (or create) the database file and blob directory.
    pub fn open(database: &Path, blob_dir: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = database.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(database)?;
        Self::with_connection(conn, blob_dir)
    }

    /// A throwaway database that lives only as long as the store.
    pub fn in_memory(blob_dir: &Path) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, blob_dir)
    }

    fn with_connection(conn: Connection, blob_dir: &Path) -> Result<Self, StoreError> {
        ensure_schema(&conn)?;
        fs::create_dir_all(blob_dir)?;
        Ok(Self {
            conn: Mutex::new(conn),
            blob_dir: fs::canonicalize(blob_dir)?,
        })
    }

    fn with_conn<T>(
        &self,
        action: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|err| StoreError::Poisoned(err.to_string()))?;
        action(&conn)
    }

    fn blob_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.blob_dir.join(bucket).join(key)
    }
}

/// Create the document table if this is a fresh database.
fn ensure_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            table_name TEXT NOT NULL,
            id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (table_name, id)
        )",
        [],
    )?;
    Ok(())
}

/// Every row of `table` with its insertion sequence, oldest first.
fn load_table(conn: &Connection, table: &str) -> Result<Vec<(i64, Row)>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT rowid, body FROM records WHERE table_name = ?1 ORDER BY rowid")?;
    let raw = stmt
        .query_map([table], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(seq, body)| Ok((seq, serde_json::from_str(&body)?)))
        .collect()
}

/// Text form of a scalar column value, used for equality filters.
fn column_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Order two column values the way the hosted store would for text, numeric
/// and date columns. Missing values sort first.
fn compare_columns(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(a), Some(b)) => column_text(a).cmp(&column_text(b)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn generate_id() -> String {
    format!("{:016x}", rand::rng().random::<u64>())
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl TableStore for LocalStore {
    async fn select_all(&self, table: &str, order: OrderBy) -> Result<Vec<Row>, StoreError> {
        let mut rows = self.with_conn(|conn| load_table(conn, table))?;
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            let ordering = compare_columns(a.get(order.column), b.get(order.column))
                .then(seq_a.cmp(seq_b));
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn select_one(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Row, StoreError> {
        let rows = self.with_conn(|conn| load_table(conn, table))?;
        let mut matches: Vec<Row> = rows
            .into_iter()
            .map(|(_, row)| row)
            .filter(|row| row.get(column).and_then(column_text).as_deref() == Some(value))
            .collect();

        match matches.len() {
            0 => Err(StoreError::NotFound {
                table: table.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(StoreError::MultipleRows {
                table: table.to_string(),
            }),
        }
    }

    async fn upsert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let mut object: Map<String, Value> = match row {
            Value::Object(object) => object,
            _ => {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: "Rows must be JSON objects.".to_string(),
                })
            }
        };

        let id = object
            .get("id")
            .and_then(column_text)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(generate_id);
        object.insert("id".to_string(), Value::String(id.clone()));

        self.with_conn(|conn| {
            if let Some(slug) = object.get("slug").and_then(Value::as_str) {
                if !slug.is_empty() {
                    let taken = load_table(conn, table)?.into_iter().any(|(_, other)| {
                        other.get("slug").and_then(Value::as_str) == Some(slug)
                            && other.get("id").and_then(column_text).as_deref() != Some(id.as_str())
                    });
                    if taken {
                        return Err(StoreError::Rejected {
                            status: 409,
                            message: format!("Slug {slug:?} is already used in {table}."),
                        });
                    }
                }
            }

            let created_at: String = conn
                .query_row(
                    "SELECT created_at FROM records WHERE table_name = ?1 AND id = ?2",
                    params![table, id],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or_else(timestamp);
            object.insert("created_at".to_string(), Value::String(created_at.clone()));

            let stored = Value::Object(object);
            conn.execute(
                "INSERT INTO records (table_name, id, created_at, body) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(table_name, id) DO UPDATE SET body = excluded.body",
                params![table, id, created_at, serde_json::to_string(&stored)?],
            )?;
            debug!("Stored {table}/{id}");
            Ok(stored)
        })
    }

    async fn delete(&self, table: &str, id: &RecordId) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM records WHERE table_name = ?1 AND id = ?2",
                params![table, id.as_str()],
            )?;
            debug!("Deleted {removed} row(s) from {table} for id {id}");
            Ok(())
        })
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.blob_path(bucket, key);
        if path.exists() {
            return Err(StoreError::Rejected {
                status: 409,
                message: format!("{bucket}/{key} already exists."),
            });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("file://{}", self.blob_path(bucket, key).display())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (LocalStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::in_memory(dir.path()).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn upsert_with_same_id_replaces_instead_of_duplicating() {
        let (store, _dir) = store();
        let first = store
            .upsert("birds", json!({ "english_name": "Kea", "slug": "kea" }))
            .await
            .unwrap();

        let again = store.upsert("birds", first.clone()).await.unwrap();
        let rows = store
            .select_all("birds", OrderBy::descending("created_at"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(again["id"], first["id"]);
        assert_eq!(again["created_at"], first["created_at"]);
    }

    #[tokio::test]
    async fn deleted_rows_disappear_from_listing() {
        let (store, _dir) = store();
        let kept = store
            .upsert("birds", json!({ "english_name": "Kea" }))
            .await
            .unwrap();
        let gone = store
            .upsert("birds", json!({ "english_name": "Dodo" }))
            .await
            .unwrap();

        let gone_id = RecordId::new(gone["id"].as_str().unwrap());
        store.delete("birds", &gone_id).await.unwrap();

        let rows = store
            .select_all("birds", OrderBy::ascending("created_at"))
            .await
            .unwrap();
        assert_eq!(rows, vec![kept]);
    }

    #[tokio::test]
    async fn listing_follows_requested_order() {
        let (store, _dir) = store();
        for date in ["2024-03-01", "2024-12-24", "2023-07-15"] {
            store
                .upsert("events", json!({ "title": date, "event_date": date }))
                .await
                .unwrap();
        }

        let rows = store
            .select_all("events", OrderBy::descending("event_date"))
            .await
            .unwrap();
        let dates: Vec<&str> = rows
            .iter()
            .map(|row| row["event_date"].as_str().unwrap())
            .collect();
        assert_eq!(dates, ["2024-12-24", "2024-03-01", "2023-07-15"]);
    }

    #[tokio::test]
    async fn select_one_distinguishes_missing_rows() {
        let (store, _dir) = store();
        store
            .upsert("birds", json!({ "english_name": "Kea", "slug": "kea" }))
            .await
            .unwrap();

        let found = store.select_one("birds", "slug", "kea").await.unwrap();
        assert_eq!(found["english_name"], "Kea");

        let missing = store.select_one("birds", "slug", "moa").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let (store, _dir) = store();
        store
            .upsert("birds", json!({ "english_name": "Kea", "slug": "kea" }))
            .await
            .unwrap();

        let err = store
            .upsert("birds", json!({ "english_name": "Kea II", "slug": "kea" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 409, .. }));
    }

    #[tokio::test]
    async fn uploads_are_written_once() {
        let (store, dir) = store();
        store
            .upload("birds", "k-1.png", vec![9, 9], "image/png")
            .await
            .unwrap();

        let on_disk = fs::read(dir.path().join("birds").join("k-1.png")).unwrap();
        assert_eq!(on_disk, vec![9, 9]);
        assert!(store.public_url("birds", "k-1.png").starts_with("file://"));

        let again = store.upload("birds", "k-1.png", vec![1], "image/png").await;
        assert!(again.is_err());
    }
}
