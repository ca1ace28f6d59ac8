use crate::domain::error::MtError;
use crate::domain::traits::KeyValueStore;
use async_trait::async_trait;
use std::io::Cursor;
use std::path::Path;
use tokio_rusqlite::{params, Connection};
use zstd::stream::{decode_all, encode_all};

pub async fn init_database(db_path: &Path) -> Result<Connection, MtError> {
    let db = Connection::open(db_path.to_path_buf()).await?;
    create_schema(&db).await?;
    Ok(db)
}

#[cfg(test)]
async fn open_in_memory() -> Result<Connection, MtError> {
    let db = Connection::open_in_memory().await?;
    create_schema(&db).await?;
    Ok(db)
}

async fn create_schema(db: &Connection) -> Result<(), MtError> {
    db.call(|conn| -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                data BLOB NOT NULL,
                compressed_size INTEGER NOT NULL,
                original_size INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// SQLite-backed key/value store; values are zstd-compressed.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Number of stored keys.
    pub async fn count(&self) -> Result<usize, MtError> {
        let count: i64 = self
            .conn
            .call(|conn| -> rusqlite::Result<i64> {
                conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            })
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MtError> {
        use rusqlite::OptionalExtension;

        let key = key.to_string();
        let compressed = self
            .conn
            .call(move |conn| -> rusqlite::Result<Option<Vec<u8>>> {
                conn.query_row("SELECT data FROM kv WHERE key = ?", params![key], |row| {
                    row.get(0)
                })
                .optional()
            })
            .await?;

        match compressed {
            Some(data) => Ok(Some(decode_all(Cursor::new(&data))?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), MtError> {
        let compressed = encode_all(Cursor::new(&value), 0)?;
        let original_len = value.len();
        let compressed_len = compressed.len();
        let now = chrono::Utc::now().timestamp();
        let key = key.to_string();

        self.conn
            .call(move |conn| -> rusqlite::Result<usize> {
                conn.execute(
                    "INSERT OR REPLACE INTO kv (key, data, compressed_size, original_size, updated_at)
                     VALUES (?, ?, ?, ?, ?)",
                    params![key, compressed, compressed_len, original_len, now],
                )
            })
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MtError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> rusqlite::Result<usize> {
                conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            })
            .await?;
        Ok(())
    }
}
