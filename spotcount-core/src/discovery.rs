use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::domain::SourceFile;
use crate::error::Result;

/// Recursively list files under `root` whose file name contains `filter`
/// as a literal substring.
///
/// Entries are visited sorted by file name at every directory level, so
/// the result (and therefore the row order of the report) is stable
/// across platforms. An empty result is not an error.
pub fn discover(root: &Path, filter: &str) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(filter) {
            files.push(SourceFile::new(entry.into_path()));
        }
    }
    debug!(root = %root.display(), filter, found = files.len(), "discovery done");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn matches_file_name_substring_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("b.tif"), b"").unwrap();
        fs::write(root.join("a.tif"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::write(root.join("sub/deeper/c.tif"), b"").unwrap();
        // directory names are not matched, only file names
        fs::create_dir_all(root.join("tif_dir")).unwrap();

        let found = discover(root, "tif").unwrap();
        let names: Vec<_> = found.iter().map(|f| f.basename.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn filter_is_literal_not_glob() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.tif"), b"").unwrap();
        assert!(discover(dir.path(), "*.tif").unwrap().is_empty());
    }

    #[test]
    fn empty_directory_gives_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path(), "tif").unwrap().is_empty());
    }
}
