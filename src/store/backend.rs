use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use async_trait::async_trait;
use crate::errors::AttestError;

/// Keyed text storage holding whole serialized snapshots.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, AttestError>;

    /// Overwrite the value under `key` wholesale.
    async fn write(&self, key: &str, value: &str) -> Result<(), AttestError>;

    fn describe(&self) -> String;
}

/// One `<key>.json` file per key under a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, AttestError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AttestError::Persistence(format!("read {}: {}", key, e))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AttestError> {
        tokio::fs::create_dir_all(&self.dir).await
            .map_err(|e| AttestError::Persistence(format!("create {}: {}", self.dir.display(), e)))?;
        tokio::fs::write(self.path_for(key), value).await
            .map_err(|e| AttestError::Persistence(format!("write {}: {}", key, e)))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.dir.display())
    }
}

/// Process-local storage; contents vanish with the process.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, AttestError> {
        let values = self.values.lock()
            .map_err(|_| AttestError::Persistence("memory backend poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AttestError> {
        let mut values = self.values.lock()
            .map_err(|_| AttestError::Persistence("memory backend poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
