// Text Input Loading
// Reads uploaded documents into the text buffer. Only plain text and
// markdown are actually read; the other accepted upload types are named
// but left to richer front-ends.

use std::fs;
use std::path::Path;

use crate::services::error::ClientError;

/// Upload ceiling, matching the front-end limit.
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

const READABLE_EXTENSIONS: [&str; 2] = ["txt", "md"];
const KNOWN_UNSUPPORTED: [&str; 3] = ["docx", "doc", "pdf"];

/// Load a document into the text buffer.
pub fn load_text_file(path: &Path) -> Result<String, ClientError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if KNOWN_UNSUPPORTED.contains(&extension.as_str()) {
        return Err(ClientError::Validation(format!(
            "text extraction from .{} files is not supported; provide .txt or .md",
            extension
        )));
    }
    if !READABLE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ClientError::Validation(format!(
            "unsupported file type {:?}; provide .txt or .md",
            path.file_name().unwrap_or_default()
        )));
    }

    let metadata = fs::metadata(path)
        .map_err(|e| ClientError::Validation(format!("cannot read {}: {}", path.display(), e)))?;
    if metadata.len() > MAX_FILE_BYTES {
        return Err(ClientError::Validation(format!(
            "file too large ({} bytes); maximum is {} bytes",
            metadata.len(),
            MAX_FILE_BYTES
        )));
    }

    fs::read_to_string(path)
        .map_err(|e| ClientError::Validation(format!("failed to read {}: {}", path.display(), e)))
}
