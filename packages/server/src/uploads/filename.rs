use std::path::Path;

use chrono::Local;

/// Accepted image extensions, lowercase and including the dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Returns the lowercase extension of `file_name` (with the leading dot) if it
/// is an accepted image type.
pub fn allowed_extension(file_name: &str) -> Result<String, String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ext)
    }
}

/// Generate a stored file name: `YYYYmmdd_HHMMSS_<nanos><random><ext>`.
pub fn generate_stored_name(ext: &str) -> String {
    let now = Local::now();
    format!(
        "{}_{:09}{:04x}{}",
        now.format("%Y%m%d_%H%M%S"),
        now.timestamp_subsec_nanos(),
        rand::random::<u16>(),
        ext
    )
}

/// Validates a flat filename (no directory components allowed).
///
/// Anything that fails here cannot name a file inside the upload directory.
pub fn validate_flat_filename(filename: &str) -> Option<&str> {
    let trimmed = filename.trim();

    if trimmed.is_empty() || trimmed.contains('\0') {
        return None;
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return None;
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return None;
    }

    // Also rejects "." and "..".
    if trimmed.starts_with('.') {
        return None;
    }

    Some(trimmed)
}
