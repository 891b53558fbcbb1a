use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::UploadError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Storage for uploaded profile images.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Validate and persist an upload, returning the generated stored name.
    ///
    /// `size` is the declared length of `reader`. Nothing is visible under the
    /// stored name unless this returns `Ok`.
    async fn store(
        &self,
        file_name: &str,
        size: u64,
        reader: BoxReader,
    ) -> Result<String, UploadError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if a file was deleted, `false` if there was nothing to
    /// delete (missing file, or a name that cannot refer to a stored upload).
    async fn remove(&self, stored_name: &str) -> Result<bool, UploadError>;
}
