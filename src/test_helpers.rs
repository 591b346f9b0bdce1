//! Shared test utilities for the docmaker test suite.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_project(&[
//!     ("docmaker.yaml", "layout: layout.html\npages: [\"*.md\"]\n"),
//!     ("layout.html", "{{ content }}"),
//!     ("intro.md", "# Intro\n"),
//! ]);
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, content)` pairs under `root`, creating parents.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }
}

/// A fresh temp directory populated with `files`.
pub fn setup_project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_files(tmp.path(), files);
    tmp
}

// =========================================================================
// Extractors
// =========================================================================

/// File names of `paths`, in order.
pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            p.file_name()
                .unwrap_or_else(|| panic!("no file name: {}", p.display()))
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}
