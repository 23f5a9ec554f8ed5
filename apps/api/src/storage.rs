use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A JSON document held in memory and mirrored to a single file.
///
/// Every mutation runs on a copy of the value, which is written to a temp file
/// beside the target and renamed over it; memory is only updated once the
/// rename succeeded. The mutex serialises writers, so callers get atomic
/// read-modify-write for free.
pub struct JsonFile<T> {
    path: PathBuf,
    value: Mutex<T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send + 'static,
{
    /// Opens `path`, starting from `T::default()` when the file is missing or unreadable.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let value = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring unreadable store {}: {e}", path.display());
                T::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            value: Mutex::new(value),
        })
    }

    pub async fn read(&self) -> MutexGuard<'_, T> {
        self.value.lock().await
    }

    /// Applies `f` to a copy of the value, persists it, then commits it to memory.
    /// Returns whatever `f` returned; an `Err` from `f` aborts without writing.
    pub async fn update<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut guard = self.value.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;

        let bytes = serde_json::to_vec_pretty(&next).map_err(StoreError::from)?;
        persist(self.path.clone(), bytes).await?;

        *guard = next;
        Ok(out)
    }
}

async fn persist(path: PathBuf, bytes: Vec<u8>) -> Result<(), StoreError> {
    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_update_persists_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("map.json");

        let store: JsonFile<BTreeMap<String, u32>> = JsonFile::open(&path).await.unwrap();
        store
            .update(|m| {
                m.insert("a".into(), 1);
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap();

        let reopened: JsonFile<BTreeMap<String, u32>> = JsonFile::open(&path).await.unwrap();
        assert_eq!(reopened.read().await.get("a"), Some(&1));
    }

    #[derive(Debug)]
    enum TestError {
        Rejected,
        Store,
    }

    impl From<StoreError> for TestError {
        fn from(_: StoreError) -> Self {
            TestError::Store
        }
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_value_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.json");
        let store: JsonFile<Vec<u32>> = JsonFile::open(&path).await.unwrap();

        let result = store
            .update(|v| {
                v.push(7);
                Err::<(), _>(TestError::Rejected)
            })
            .await;
        assert!(matches!(result, Err(TestError::Rejected)));
        assert!(store.read().await.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store: JsonFile<Vec<u32>> = JsonFile::open(&path).await.unwrap();
        assert!(store.read().await.is_empty());
    }
}
