use std::path::{Path, PathBuf};

/// One candidate image found by discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name without its extension; used as the row label.
    pub basename: String,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, basename }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
