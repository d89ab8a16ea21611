use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{config, storage::error::StoreError};

/// A stored object together with its content type.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// An object store: key -> bytes + content type. Keys are slash-separated
/// paths like `tracks/{id}/audio.mp3`.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Blob>, StoreError>;
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError>;
}

/// Opens the blob store described by the config.
pub fn open(config: &config::BlobStoreConfig) -> Result<Arc<dyn BlobStore>, StoreError> {
    if config.in_memory {
        Ok(Arc::new(crate::storage::memory::MemoryBlobStore::new()))
    } else {
        let root = config.root.as_ref().ok_or_else(|| {
            StoreError::Unavailable("blob_store.root is required unless in_memory".into())
        })?;
        Ok(Arc::new(FsBlobStore::new(root)))
    }
}

/// Filesystem-backed blob store. Keys map to paths under the root directory.
/// The content type is not stored; it is recovered from the key's extension
/// on read, so keys must carry a meaningful extension.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> Result<Option<Blob>, StoreError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(Blob {
                bytes,
                content_type: content_type_for(key),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Fs(e)),
        }
    }

    fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        Ok(())
    }
}

fn content_type_for(key: &str) -> String {
    mime_guess::from_path(key)
        .first_or_octet_stream()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn get_missing_key_returns_none() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FsBlobStore::new(dir.path());

        assert_eq!(store.get("tracks/none/audio.mp3")?, None);

        Ok(())
    }

    #[test]
    fn put_then_get_roundtrips_with_nested_key() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FsBlobStore::new(dir.path());

        store.put("tracks/abc/audio.mp3", b"mp3bytes", "audio/mpeg")?;

        let blob = store.get("tracks/abc/audio.mp3")?.unwrap();
        assert_eq!(blob.bytes, b"mp3bytes");
        assert_eq!(blob.content_type, "audio/mpeg");

        Ok(())
    }

    #[test]
    fn content_type_recovered_from_extension() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FsBlobStore::new(dir.path());

        store.put("tracks/tracks.json", b"[]", "application/json")?;

        let blob = store.get("tracks/tracks.json")?.unwrap();
        assert_eq!(blob.content_type, "application/json");

        Ok(())
    }

    #[test]
    fn second_put_overwrites() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FsBlobStore::new(dir.path());

        store.put("tracks/tracks.json", b"[]", "application/json")?;
        store.put("tracks/tracks.json", b"[1]", "application/json")?;

        assert_eq!(store.get("tracks/tracks.json")?.unwrap().bytes, b"[1]");

        Ok(())
    }
}
