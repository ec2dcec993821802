//! Byte storage for uploaded images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{ImageShareError, Result};

#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()>;

    async fn read(&self, filename: &str) -> Result<Vec<u8>>;

    /// Missing files are not an error.
    async fn delete(&self, filename: &str) -> Result<()>;
}

/// Stores files flat under one directory.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(filename)),
            _ => Err(ImageShareError::Storage(format!(
                "refusing to touch '{filename}' outside the upload directory"
            ))),
        }
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(filename)?;
        fs::write(&path, bytes).await.map_err(|e| {
            ImageShareError::Storage(format!("failed to write {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "stored upload");
        Ok(())
    }

    async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.path_for(filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                ImageShareError::NotFound(format!("Image file {filename} is missing")),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        let path = self.path_for(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "upload already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
