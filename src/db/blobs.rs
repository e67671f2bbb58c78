use std::path::PathBuf;

use crate::error::AppError;

/// Blob storage for uploaded images: files under a local directory, addressed
/// by a public base URL the static file service resolves.
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Write `bytes` under `name` and return the public URL for the blob.
    /// Nothing is written to the message table until this has succeeded.
    pub async fn put(&self, name: &str, bytes: &[u8]) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(AppError::Blob)?;
        tokio::fs::write(self.root.join(name), bytes)
            .await
            .map_err(AppError::Blob)?;
        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            name
        ))
    }
}
