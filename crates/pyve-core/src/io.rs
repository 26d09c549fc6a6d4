use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting config files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Remove a file, symlink or directory tree. Returns true if something was removed.
pub fn remove_path(path: &Path) -> Result<bool> {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Ok(false);
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    Ok(true)
}

/// Remove `path` if it is an empty directory. Returns true if removed.
pub fn remove_dir_if_empty(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    if std::fs::read_dir(path)?.next().is_some() {
        return Ok(false);
    }
    std::fs::remove_dir(path)?;
    Ok(true)
}

/// Restrict a file to owner read/write. No-op on non-unix targets.
pub fn set_owner_only(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Replace content between `start_marker` and `end_marker` (inclusive) in a file.
///
/// Replaces everything from the first character of `start_marker` through the last
/// character of `end_marker` with `replacement`. Returns `true` if both markers were
/// found and the file was updated, `false` if the markers were not found (file unchanged).
pub fn replace_between_markers(
    path: &Path,
    start_marker: &str,
    end_marker: &str,
    replacement: &str,
) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let content = std::fs::read_to_string(path)?;
    let Some(updated) = splice_between_markers(&content, start_marker, end_marker, replacement)
    else {
        return Ok(false);
    };
    atomic_write(path, updated.as_bytes())?;
    Ok(true)
}

/// String form of [`replace_between_markers`]. A single newline directly after
/// `end_marker` is consumed along with the block.
pub fn splice_between_markers(
    content: &str,
    start_marker: &str,
    end_marker: &str,
    replacement: &str,
) -> Option<String> {
    let start_pos = content.find(start_marker)?;
    let search_from = start_pos + start_marker.len();
    let end_offset = content[search_from..].find(end_marker)?;
    let mut end_pos = search_from + end_offset + end_marker.len();
    if content[end_pos..].starts_with('\n') {
        end_pos += 1;
    }

    let mut updated = String::with_capacity(content.len());
    updated.push_str(&content[..start_pos]);
    updated.push_str(replacement);
    updated.push_str(&content[end_pos..]);
    Some(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        atomic_write(&path, b"backend: venv").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "backend: venv");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".pyve/a/config");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_if_missing_skips_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, b"original").unwrap();
        let written = write_if_missing(&path, b"new").unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn remove_path_handles_files_dirs_and_absence() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        let tree = dir.path().join("d/e");
        std::fs::write(&file, "x").unwrap();
        std::fs::create_dir_all(&tree).unwrap();

        assert!(remove_path(&file).unwrap());
        assert!(remove_path(&dir.path().join("d")).unwrap());
        assert!(!remove_path(&dir.path().join("d")).unwrap());
        assert!(!file.exists());
    }

    #[test]
    fn remove_dir_if_empty_keeps_populated_dirs() {
        let dir = TempDir::new().unwrap();
        let full = dir.path().join("full");
        std::fs::create_dir(&full).unwrap();
        std::fs::write(full.join("keep"), "x").unwrap();
        assert!(!remove_dir_if_empty(&full).unwrap());

        let empty = dir.path().join("empty");
        std::fs::create_dir(&empty).unwrap();
        assert!(remove_dir_if_empty(&empty).unwrap());
        assert!(!empty.exists());
    }

    #[test]
    fn splice_removes_block_and_trailing_newline() {
        let content = "a\n# start\nmiddle\n# end\nb\n";
        let out = splice_between_markers(content, "# start", "# end", "").unwrap();
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn splice_without_markers_is_none() {
        assert!(splice_between_markers("plain", "# start", "# end", "x").is_none());
    }
}
