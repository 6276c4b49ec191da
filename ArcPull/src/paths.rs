//! Path helpers for writing archive entries to disk

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Normalize path separators to forward slashes
pub fn normalize_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Turn an entry name into a relative path that stays under the output directory.
///
/// Both separators are accepted and `.` segments are dropped. Names that are
/// absolute, carry a drive prefix, contain `..` or a NUL byte, or are empty
/// after cleanup are rejected.
///
/// # Errors
/// Returns [`Error::PathTraversal`] for names that would escape the output directory.
pub fn sanitize_entry_path(name: &str) -> Result<PathBuf> {
    if name.contains('\0') {
        return Err(Error::PathTraversal(name.to_string()));
    }

    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') || has_drive_prefix(&normalized) {
        return Err(Error::PathTraversal(name.to_string()));
    }

    let mut relative = PathBuf::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(Error::PathTraversal(name.to_string())),
            part => relative.push(part),
        }
    }

    // Anything the platform still reads as non-normal (e.g. a verbatim prefix)
    if relative.as_os_str().is_empty()
        || !relative.components().all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(Error::PathTraversal(name.to_string()));
    }

    Ok(relative)
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Get the path of a volume of a split zip archive
///
/// For part 0, returns the base path unchanged.
/// For part N > 0, returns `{stem}.z{NN}` (e.g., `Backup.z01`)
pub fn zip_volume_path(base_path: &Path, part: u16) -> Option<PathBuf> {
    if part == 0 {
        return Some(base_path.to_path_buf());
    }

    let stem = base_path.file_stem()?.to_str()?;
    let parent = base_path.parent()?;

    Some(parent.join(format!("{stem}.z{part:02}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_nested_names() {
        assert_eq!(
            sanitize_entry_path("docs/readme.txt").unwrap(),
            PathBuf::from("docs").join("readme.txt")
        );
        assert_eq!(
            sanitize_entry_path("docs\\sub\\.\\a.txt").unwrap(),
            PathBuf::from("docs").join("sub").join("a.txt")
        );
        assert_eq!(sanitize_entry_path("docs/").unwrap(), PathBuf::from("docs"));
    }

    #[test]
    fn test_sanitize_rejects_escapes() {
        for name in ["../evil.txt", "a/../../b", "/etc/passwd", "C:/windows/x", "a\0b", "", "./"] {
            assert!(
                matches!(sanitize_entry_path(name), Err(Error::PathTraversal(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_zip_volume_path() {
        let base = Path::new("/tmp/Backup.zip");
        assert_eq!(zip_volume_path(base, 0), Some(base.to_path_buf()));
        assert_eq!(zip_volume_path(base, 1), Some(PathBuf::from("/tmp/Backup.z01")));
        assert_eq!(zip_volume_path(base, 12), Some(PathBuf::from("/tmp/Backup.z12")));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a\\b\\c.txt"), "a/b/c.txt");
    }
}
