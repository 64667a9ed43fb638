//! Locating optional test assets and creating scratch output locations.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// `testdata/` at the workspace root.
pub fn testdata_dir() -> PathBuf {
    workspace_root().join("testdata")
}

/// Search `TEST_DATA_DIR`, then `testdata/`, for `name`.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(dir).join(name));
    }
    candidates.push(testdata_dir().join(name));
    candidates.into_iter().find(|p| p.is_file())
}

/// A scratch directory that is removed when dropped.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("reservoir-flood-test-")
            .tempdir()
            .expect("failed to create scratch directory");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a file inside the scratch directory (not created).
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn test_missing_file_not_found() {
        assert!(find_test_file("definitely-not-a-real-file.tif").is_none());
    }

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let path = {
            let scratch = ScratchDir::new();
            std::fs::write(scratch.file("a.txt"), b"x").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
