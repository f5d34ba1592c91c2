//! Tools for working with the file system.

use crate::error::Result;
use std::path::Path;

/// Characters that are illegal in file names on at least one supported platform.
const FORBIDDEN: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Placeholder used when a title sanitizes to nothing.
pub const PLACEHOLDER_NAME: &str = "video";

/// Most file systems reject names longer than 255 bytes.
const MAX_NAME_BYTES: usize = 255;

/// The longest suffix appended to a base name, `_video.webm`.
const LONGEST_SUFFIX: usize = "_video.webm".len();

/// Derives a file system safe base name from a display title.
///
/// Forbidden characters are dropped, line breaks become spaces, the result is trimmed and
/// truncated to `max_len` characters, then shortened further at character boundaries until
/// every derived file name fits in 255 bytes. An empty result becomes [`PLACEHOLDER_NAME`].
///
/// # Arguments
///
/// * `title` - The display title of the video.
/// * `max_len` - The maximum number of characters to keep.
pub fn sanitize_filename(title: &str, max_len: usize) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    let mut truncated: String = cleaned.trim().chars().take(max_len).collect();
    while truncated.len() > MAX_NAME_BYTES - LONGEST_SUFFIX {
        truncated.pop();
    }
    let truncated = truncated.trim_end();

    if truncated.is_empty() {
        return PLACEHOLDER_NAME.to_string();
    }

    truncated.to_string()
}

/// Creates a new directory at the given destination.
/// If the directory already exists, nothing is done.
///
/// # Arguments
///
/// * `destination` - The path to create the directory at.
pub fn create_dir(destination: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(destination)?;
    Ok(())
}

/// Creates the parent directory of the given destination.
/// If the parent directory already exists, nothing is done.
///
/// # Arguments
///
/// * `destination` - The path to create the parent directory for.
pub fn create_parent_dir(destination: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = destination.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(())
}

/// Removes a temporary file and logs any errors.
/// Does not propagate errors to avoid interrupting the execution flow.
/// A file that is already gone counts as removed.
///
/// # Arguments
///
/// * `file_path` - The path of the file to delete
///
/// # Returns
///
/// `true` if the file no longer exists, `false` otherwise
pub async fn remove_temp_file(file_path: impl AsRef<Path>) -> bool {
    let path = file_path.as_ref();

    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            log::debug!("Removed temporary file {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            log::warn!("Failed to remove temporary file {}: {}", path.display(), e);
            false
        }
    }
}
