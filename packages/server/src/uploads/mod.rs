//! Profile image storage on the local filesystem.

mod error;
mod filename;
mod traits;

pub mod filesystem;

pub use error::UploadError;
pub use filename::ALLOWED_EXTENSIONS;
pub use filesystem::FilesystemUploadStore;
pub use traits::{BoxReader, UploadStore};

/// Best-effort removal of a stored profile image.
///
/// Used on cleanup paths after the primary action has already succeeded (or
/// already failed): errors are logged and swallowed, never surfaced to the
/// caller. Empty references are skipped without touching the filesystem.
pub async fn discard(store: &dyn UploadStore, stored_name: &str) {
    if stored_name.trim().is_empty() {
        return;
    }
    match store.remove(stored_name).await {
        Ok(true) => tracing::debug!(file = stored_name, "Removed profile image"),
        Ok(false) => {}
        Err(e) => tracing::warn!(file = stored_name, "Failed to remove profile image: {e}"),
    }
}
