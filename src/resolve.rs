//! Project file resolution.
//!
//! Every path in `docmaker.yaml` is relative to the project root. This module
//! turns those strings into absolute paths that are known to exist, and leaves
//! the decision of what a missing file *means* to the caller:
//!
//! | Field    | Resolver               | Missing entry            |
//! |----------|------------------------|--------------------------|
//! | `layout` | [`resolve_single_file`] | fatal (caller decides)  |
//! | `pages`  | [`resolve_globs`]       | warning, no contribution |
//! | `data`   | [`resolve_file_list`]   | warning, entry dropped   |
//! | `assets` | [`resolve_file_list`]   | warning, entry dropped   |
//!
//! ## Page Ordering
//!
//! Glob walkers make no ordering promise, so matches are sorted
//! lexicographically *within* each pattern and the per-pattern results are
//! concatenated in declaration order. Authors control chapter order through
//! the order of their patterns:
//!
//! ```yaml
//! pages:
//!   - intro.md          # always first
//!   - chapters/*.md     # sorted among themselves
//!   - appendix/*.md     # may match nothing; that only warns
//! ```
//!
//! [`PageOrder::Global`] is available for projects that want one sorted list
//! regardless of pattern order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use wax::Glob;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid page pattern \"{pattern}\": {message}")]
    Pattern { pattern: String, message: String },
    #[error("failed to walk files for pattern \"{pattern}\": {message}")]
    Walk { pattern: String, message: String },
}

/// Outcome of resolving one relative path against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Found(PathBuf),
    /// Carries the absolute path that was checked, for the caller's message.
    NotFound(PathBuf),
}

/// How resolved page paths are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageOrder {
    /// Sort within each pattern, keep pattern declaration order.
    #[default]
    PerPattern,
    /// Sort the combined list of every pattern's matches.
    Global,
}

/// Join `relative_path` onto `base_dir` and check that a regular file exists
/// there. A directory at that path counts as missing.
pub fn resolve_single_file(base_dir: &Path, relative_path: &str) -> Resolved {
    let path = base_dir.join(relative_path);
    if path.is_file() {
        Resolved::Found(path)
    } else {
        Resolved::NotFound(path)
    }
}

/// Resolve each path independently, dropping (with a warning) the ones that
/// don't exist. Order of the surviving entries is preserved.
pub fn resolve_file_list(base_dir: &Path, relative_paths: &[String]) -> Vec<PathBuf> {
    relative_paths
        .iter()
        .filter_map(|relative| match resolve_single_file(base_dir, relative) {
            Resolved::Found(path) => Some(path),
            Resolved::NotFound(path) => {
                warn!("Could not find project file with path {}", path.display());
                None
            }
        })
        .collect()
}

/// Expand page patterns against `base_dir`.
///
/// Patterns are walked in parallel; the collected result keeps declaration
/// order, so parallelism never changes the output.
pub fn resolve_globs(
    base_dir: &Path,
    patterns: &[String],
    order: PageOrder,
) -> Result<Vec<PathBuf>, ResolveError> {
    let per_pattern = patterns
        .par_iter()
        .map(|pattern| expand_pattern(base_dir, pattern))
        .collect::<Result<Vec<_>, _>>()?;

    let mut paths = Vec::new();
    for (pattern, matches) in patterns.iter().zip(per_pattern) {
        if matches.is_empty() {
            warn!("Page glob \"{pattern}\" did not match any files.");
        }
        paths.extend(matches);
    }

    if order == PageOrder::Global {
        sort_lexicographic(&mut paths);
    }
    Ok(paths)
}

/// All regular files under `base_dir` matching `pattern`, sorted.
///
/// A leading `./` is dropped first; walked paths never carry it.
fn expand_pattern(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ResolveError> {
    let glob = Glob::new(strip_current_dir(pattern)).map_err(|err| ResolveError::Pattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })?;

    let mut matches = Vec::new();
    for entry in glob.walk(base_dir) {
        let entry = entry.map_err(|err| ResolveError::Walk {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        let path = entry.path();
        if path.is_file() {
            matches.push(path.to_path_buf());
        }
    }

    sort_lexicographic(&mut matches);
    Ok(matches)
}

fn strip_current_dir(pattern: &str) -> &str {
    let mut rest = pattern;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }
    rest
}

fn sort_lexicographic(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{file_names, write_files};
    use tempfile::TempDir;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_file_found_is_absolute() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("layout.html", "<html></html>")]);

        let resolved = resolve_single_file(tmp.path(), "layout.html");
        assert_eq!(resolved, Resolved::Found(tmp.path().join("layout.html")));
    }

    #[test]
    fn single_file_missing_reports_checked_path() {
        let tmp = TempDir::new().unwrap();
        let resolved = resolve_single_file(tmp.path(), "nope.html");
        assert_eq!(resolved, Resolved::NotFound(tmp.path().join("nope.html")));
    }

    #[test]
    fn single_file_that_is_a_directory_is_not_found() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("theme/layout.html", ""), ("style.css", "")]);

        let resolved = resolve_single_file(tmp.path(), "theme");
        assert_eq!(resolved, Resolved::NotFound(tmp.path().join("theme")));

        let listed = resolve_file_list(tmp.path(), &patterns(&["theme", "style.css"]));
        assert_eq!(file_names(&listed), vec!["style.css"]);
    }

    #[test]
    fn file_list_drops_missing_and_keeps_order() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("b.yaml", ""), ("a.yaml", "")]);

        let resolved = resolve_file_list(tmp.path(), &patterns(&["b.yaml", "gone.yaml", "a.yaml"]));
        assert_eq!(file_names(&resolved), vec!["b.yaml", "a.yaml"]);
    }

    #[test]
    fn globs_sort_within_pattern_not_across() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[
                ("b-2.md", ""),
                ("b-1.md", ""),
                ("a-2.md", ""),
                ("a-1.md", ""),
            ],
        );

        let resolved = resolve_globs(
            tmp.path(),
            &patterns(&["b-*.md", "a-*.md"]),
            PageOrder::PerPattern,
        )
        .unwrap();
        assert_eq!(file_names(&resolved), vec!["b-1.md", "b-2.md", "a-1.md", "a-2.md"]);
    }

    #[test]
    fn globs_global_order_sorts_everything() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("b-1.md", ""), ("a-1.md", "")]);

        let resolved =
            resolve_globs(tmp.path(), &patterns(&["b-*.md", "a-*.md"]), PageOrder::Global).unwrap();
        assert_eq!(file_names(&resolved), vec!["a-1.md", "b-1.md"]);
    }

    #[test]
    fn glob_matching_nothing_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("intro.md", "")]);

        let resolved = resolve_globs(
            tmp.path(),
            &patterns(&["intro.md", "appendix/*.md"]),
            PageOrder::PerPattern,
        )
        .unwrap();
        assert_eq!(file_names(&resolved), vec!["intro.md"]);
    }

    #[test]
    fn globs_descend_into_directories_and_skip_dirs() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[("chapters/02-usage.md", ""), ("chapters/01-setup.md", "")],
        );
        std::fs::create_dir_all(tmp.path().join("chapters/03-empty.md")).unwrap();

        let resolved =
            resolve_globs(tmp.path(), &patterns(&["chapters/*.md"]), PageOrder::PerPattern)
                .unwrap();
        assert_eq!(file_names(&resolved), vec!["01-setup.md", "02-usage.md"]);
        assert!(resolved.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn current_dir_prefix_is_ignored() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("intro.md", ""), ("chapters/01.md", "")]);

        let resolved = resolve_globs(
            tmp.path(),
            &patterns(&["./intro.md", ".//chapters/*.md"]),
            PageOrder::PerPattern,
        )
        .unwrap();
        assert_eq!(file_names(&resolved), vec!["intro.md", "01.md"]);
    }

    #[test]
    fn invalid_pattern_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = resolve_globs(tmp.path(), &patterns(&["**x/[z"]), PageOrder::PerPattern);
        assert!(matches!(result, Err(ResolveError::Pattern { .. })));
    }
}
