use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::UploadError;
use super::filename::{allowed_extension, generate_stored_name, validate_flat_filename};
use super::traits::{BoxReader, UploadStore};

/// Filesystem-backed profile image store.
///
/// Files live flat under `{base_path}/{stored_name}`. Writes go through
/// `{base_path}/.tmp` and are renamed into place once complete.
pub struct FilesystemUploadStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemUploadStore {
    /// The directory is created lazily on the first `store`.
    pub fn new(base_path: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            base_path: base_path.into(),
            max_size,
        }
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn write_temp(&self, temp_path: &Path, reader: BoxReader) -> Result<(), UploadError> {
        let mut temp_file = fs::File::create(temp_path).await?;

        // Read one byte past the limit so an oversized stream is detectable.
        let mut limited = reader.take(self.max_size + 1);
        let copied = tokio::io::copy(&mut limited, &mut temp_file).await?;
        if copied > self.max_size {
            return Err(UploadError::FileTooLarge {
                size: copied,
                limit: self.max_size,
            });
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl UploadStore for FilesystemUploadStore {
    async fn store(
        &self,
        file_name: &str,
        size: u64,
        reader: BoxReader,
    ) -> Result<String, UploadError> {
        if size > self.max_size {
            return Err(UploadError::FileTooLarge {
                size,
                limit: self.max_size,
            });
        }
        let ext = allowed_extension(file_name).map_err(UploadError::UnsupportedType)?;

        fs::create_dir_all(self.base_path.join(".tmp")).await?;

        let temp_path = self.temp_path();
        if let Err(e) = self.write_temp(&temp_path, reader).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        let stored_name = generate_stored_name(&ext);
        let dest = self.base_path.join(&stored_name);
        if let Err(e) = fs::rename(&temp_path, &dest).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::info!(file = %stored_name, original = file_name, size, "Stored profile image");
        Ok(stored_name)
    }

    async fn remove(&self, stored_name: &str) -> Result<bool, UploadError> {
        let Some(name) = validate_flat_filename(stored_name) else {
            return Ok(false);
        };
        match fs::remove_file(self.base_path.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
