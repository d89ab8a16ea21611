use std::{collections::HashMap, sync::Mutex};

use crate::storage::{
    blob::{Blob, BlobStore},
    error::StoreError,
    kv::KeyValueStore,
};

/// In-memory key-value store. Selectable from config for throwaway runs,
/// and the default store in tests.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = lock(&self.entries)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// In-memory blob store.
#[derive(Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<String, Blob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Blob>, StoreError> {
        let entries = lock(&self.entries)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries)?;
        entries.insert(
            key.to_string(),
            Blob {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {e}")))
}
