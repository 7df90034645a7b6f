use crate::constants::storage::TIMESTAMP_FORMAT;
use crate::errors::GatewayError;
use crate::services::logger::Logger;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored data is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("cannot create database directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("database connection lock poisoned")]
    Poisoned,
    #[error("database task failed: {0}")]
    Task(String),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        GatewayError::internal("Database error").with_details(serde_json::json!({
            "details": err.to_string(),
        }))
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::from(err).into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredForm {
    pub id: i64,
    pub data: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS forms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_forms_created ON forms(created_at DESC, id DESC);
"#;

const COLUMNS: &str = "id, data, created_at, updated_at";

/// CRUD over the `forms` table. The single connection is shared behind a
/// mutex and only ever touched from blocking tasks.
#[derive(Clone)]
pub struct FormStore {
    logger: Logger,
    conn: Arc<Mutex<Connection>>,
}

fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

fn row_to_form(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode(raw: (i64, String, String, String)) -> Result<StoredForm, StoreError> {
    let (id, data, created_at, updated_at) = raw;
    let data = match serde_json::from_str::<Value>(&data)? {
        Value::Object(map) => map,
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("value".to_string(), other);
            wrapped
        }
    };
    Ok(StoredForm {
        id,
        data,
        created_at,
        updated_at,
    })
}

impl FormStore {
    pub fn open(logger: Logger, path: &str) -> Result<Self, StoreError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                        path: parent.display().to_string(),
                        source,
                    })?;
                }
            }
            Connection::open(path)?
        };
        conn.execute_batch(SCHEMA)?;
        let logger = logger.child("forms");
        logger.debug(
            "Form store ready",
            Some(&serde_json::json!({ "path": path })),
        );
        Ok(Self {
            logger,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            op(&guard)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }

    pub async fn insert(&self, data: Map<String, Value>) -> Result<StoredForm, StoreError> {
        let encoded = serde_json::to_string(&Value::Object(data))?;
        let form = self
            .with_conn(move |conn| {
                let now = now_timestamp();
                let raw = conn.query_row(
                    &format!(
                        "INSERT INTO forms (data, created_at, updated_at) VALUES (?1, ?2, ?2) RETURNING {}",
                        COLUMNS
                    ),
                    params![encoded, now],
                    row_to_form,
                )?;
                decode(raw)
            })
            .await?;
        self.logger
            .info("Stored form", Some(&serde_json::json!({ "id": form.id })));
        Ok(form)
    }

    pub async fn get(&self, id: i64) -> Result<Option<StoredForm>, StoreError> {
        self.with_conn(move |conn| {
            let raw = conn
                .query_row(
                    &format!("SELECT {} FROM forms WHERE id = ?1", COLUMNS),
                    params![id],
                    row_to_form,
                )
                .optional()?;
            raw.map(decode).transpose()
        })
        .await
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<StoredForm>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM forms ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
                COLUMNS
            ))?;
            let rows = stmt.query_map(params![limit, offset], row_to_form)?;
            let mut out = Vec::new();
            for raw in rows {
                out.push(decode(raw?)?);
            }
            Ok(out)
        })
        .await
    }

    /// Replaces the stored object; `None` when no row has this id.
    pub async fn update(
        &self,
        id: i64,
        data: Map<String, Value>,
    ) -> Result<Option<StoredForm>, StoreError> {
        let encoded = serde_json::to_string(&Value::Object(data))?;
        let updated = self
            .with_conn(move |conn| {
                let raw = conn
                    .query_row(
                        &format!(
                            "UPDATE forms SET data = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
                            COLUMNS
                        ),
                        params![encoded, now_timestamp(), id],
                        row_to_form,
                    )
                    .optional()?;
                raw.map(decode).transpose()
            })
            .await?;
        if updated.is_some() {
            self.logger
                .info("Updated form", Some(&serde_json::json!({ "id": id })));
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .with_conn(move |conn| {
                let affected = conn.execute("DELETE FROM forms WHERE id = ?1", params![id])?;
                Ok(affected > 0)
            })
            .await?;
        if removed {
            self.logger
                .info("Deleted form", Some(&serde_json::json!({ "id": id })));
        }
        Ok(removed)
    }
}
