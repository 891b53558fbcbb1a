use thiserror::Error;

/// Errors that can occur while storing or removing profile images.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file exceeds the configured size limit.
    #[error("file too large ({size} bytes, max {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },
    /// The file extension is not an accepted image type.
    #[error("unsupported file type '{0}' (allowed: .jpg, .jpeg, .png, .webp)")]
    UnsupportedType(String),
    #[error("upload IO error: {0}")]
    Io(#[from] std::io::Error),
}
