// In-memory key/value store using DashMap
use crate::domain::error::MtError;
use crate::domain::traits::KeyValueStore;
use async_trait::async_trait;
use dashmap::DashMap;

/// Thread-safe in-memory store for ephemeral runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    map: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MtError> {
        Ok(self.map.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), MtError> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MtError> {
        self.map.remove(key);
        Ok(())
    }
}
