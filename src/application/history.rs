use crate::domain::error::MtError;
use crate::domain::model::{ErrorLogEntry, HistoryEntry};
use crate::domain::traits::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

pub const HISTORY_KEY: &str = "translationHistory";
pub const ERROR_LOG_KEY: &str = "errorLogs";
pub const DEFAULT_CAPACITY: usize = 100;

/// Newest-first list with a fixed capacity, persisted as one JSON blob.
pub struct BoundedLog<T> {
    key: &'static str,
    capacity: usize,
    store: Arc<dyn KeyValueStore>,
    // serialises read-modify-write so concurrent adds never lose entries
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

pub type HistoryStore = BoundedLog<HistoryEntry>;
pub type ErrorLog = BoundedLog<ErrorLogEntry>;

impl<T> BoundedLog<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(key: &'static str, capacity: usize, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            key,
            capacity,
            store,
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepends, truncates to capacity (dropping the oldest), then persists.
    pub async fn add(&self, entry: T) -> Result<(), MtError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        let data = serde_json::to_vec(&entries)?;
        self.store.put(self.key, data).await
    }

    /// All entries, newest first.
    pub async fn get_all(&self) -> Result<Vec<T>, MtError> {
        self.load().await
    }

    pub async fn clear(&self) -> Result<(), MtError> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(self.key).await
    }

    async fn load(&self) -> Result<Vec<T>, MtError> {
        let Some(data) = self.store.get(self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice::<Vec<T>>(&data) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(key = self.key, error = %e, "stored list is unreadable, starting empty");
                Ok(Vec::new())
            }
        }
    }
}

impl HistoryStore {
    pub fn history(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self::new(HISTORY_KEY, capacity, store)
    }
}

impl ErrorLog {
    pub fn errors(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self::new(ERROR_LOG_KEY, capacity, store)
    }

    /// Records a failure. Never fails: a broken store is only traced.
    pub async fn record(&self, context: &str, error: &str) {
        warn!(context, error, "recording error");
        if let Err(e) = self.add(ErrorLogEntry::new(context, error)).await {
            warn!(error = %e, "failed to save error log");
        }
    }
}
