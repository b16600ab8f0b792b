use crate::error::PlaysyncError;
use std::path::Path;

/// Reduces a title to characters that are safe in a file name on every
/// platform we write to: alphanumerics and plain spaces.
pub fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Extracts the media id from a stem of the form `Some Title [id]`.
pub fn id_from_bracketed_stem(stem: &str) -> Option<(&str, &str)> {
    let without_close = stem.strip_suffix(']')?;
    let open = without_close.rfind('[')?;
    let id = &without_close[open + 1..];
    if id.is_empty() {
        return None;
    }
    Some((without_close[..open].trim_end(), id))
}

/// Moves a file, falling back to copy-and-delete when the source and
/// destination live on different filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<(), PlaysyncError> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    std::fs::copy(from, to).map_err(|e| PlaysyncError::OutputPlacement {
        path: to.to_path_buf(),
        reason: format!("copy from {} failed: {}", from.display(), e),
    })?;
    std::fs::remove_file(from)?;
    Ok(())
}
