use std::path::{Path, PathBuf};

use async_trait::async_trait;
use formstore_core::ResourceRef;
use uuid::Uuid;

use crate::{Error, Result};

/// Keeps the binary attachments referenced by stored submissions.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Persist `bytes` and return a reference suitable for a property value.
    async fn store(&self, filename: &str, media_type: &str, bytes: &[u8]) -> Result<ResourceRef>;

    /// Remove a stored resource. Removing one that is already gone succeeds.
    async fn delete(&self, resource: &ResourceRef) -> Result<()>;

    async fn exists(&self, resource: &ResourceRef) -> Result<bool>;
}

/// Stores every resource as `<root>/<id>`.
#[derive(Debug, Clone)]
pub struct FsResourceStore {
    root: PathBuf,
}

impl FsResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &Uuid) -> PathBuf {
        self.root.join(id.to_string())
    }
}

#[async_trait]
impl ResourceStore for FsResourceStore {
    async fn store(&self, filename: &str, media_type: &str, bytes: &[u8]) -> Result<ResourceRef> {
        if filename.is_empty() {
            return Err(Error::Resource("uploaded file has no name".to_string()));
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let resource = ResourceRef {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            media_type: media_type.to_string(),
            size: bytes.len() as u64,
        };
        tokio::fs::write(self.path_for(&resource.id), bytes).await?;

        tracing::info!(
            "Stored resource {} ({}, {} bytes)",
            resource.id,
            resource.filename,
            resource.size
        );

        Ok(resource)
    }

    async fn delete(&self, resource: &ResourceRef) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(&resource.id)).await {
            Ok(()) => {
                tracing::info!("Deleted resource {} ({})", resource.id, resource.filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Resource {} already removed", resource.id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, resource: &ResourceRef) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(&resource.id)).await?)
    }
}
