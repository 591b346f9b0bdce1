//! Project configuration module.
//!
//! Handles locating the project root, loading `docmaker.yaml`, validating it,
//! and resolving every path it mentions against the filesystem.
//!
//! ## Config File Location
//!
//! The project root is the nearest directory, walking upward from the start
//! directory, that contains `docmaker.yaml`:
//!
//! ```text
//! handbook/
//! ├── docmaker.yaml        # ← project root
//! ├── layout.html
//! ├── data/
//! │   └── site.yaml
//! └── chapters/
//!     └── 01-intro.md      # running `docmaker` here still finds the root
//! ```
//!
//! The start directory is `--dir` when given, else `INIT_CWD` (set by npm-style
//! script runners to the directory the user invoked them from), else the
//! process working directory.
//!
//! ## Configuration Options
//!
//! ```yaml
//! layout: layout.html      # required: outer HTML template
//! buildDir: build          # output directory, relative to the root
//! pageOrder: per-pattern   # or `global`
//! pages:                   # glob patterns, concatenated in this order
//!   - intro.md
//!   - chapters/*.md
//! data:                    # merged in order, later files win
//!   - data/site.yaml
//! assets:                  # copied, or rendered when ending in .liquid/.jinja/.j2
//!   - style.css
//! ```
//!
//! Omitted optional fields (or fields set to `null`) take their defaults.
//! Validation is exhaustive: every problem in the file is reported at once.
//! Unknown keys are rejected to catch typos early.

use crate::resolve::{self, PageOrder, ResolveError, Resolved};
use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "docmaker.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not find docmaker.yaml in {} or any parent directory", .0.display())]
    NotFound(PathBuf),
    #[error("YAML parse error in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
    #[error("config validation failed:\n{}", format_violations(.0))]
    Invalid(Vec<Violation>),
    #[error("Could not find layout file with path {}", .0.display())]
    LayoutMissing(PathBuf),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ConfigError {
    /// Errors caused by the project's own files, shown without diagnostics.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ConfigError::Io(_))
    }
}

/// One violated constraint in `docmaker.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Field path, e.g. `layout` or `pages[2]`.
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `docmaker.yaml` after defaults are applied, before any path is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RawConfig {
    pub layout: String,
    pub build_dir: String,
    pub page_order: PageOrder,
    pub pages: Vec<String>,
    pub data: Vec<String>,
    pub assets: Vec<String>,
}

fn default_build_dir() -> String {
    "build".to_string()
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            layout: String::new(),
            build_dir: default_build_dir(),
            page_order: PageOrder::default(),
            pages: Vec::new(),
            data: Vec::new(),
            assets: Vec::new(),
        }
    }
}

impl RawConfig {
    /// Check field values, returning every violation found.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.layout.trim().is_empty() {
            violations.push(Violation::new("layout", "is required and must be a non-empty string"));
        }
        if self.build_dir.trim().is_empty() {
            violations.push(Violation::new("buildDir", "must be a non-empty string"));
        } else if !is_inside_project(&self.build_dir) {
            violations.push(Violation::new(
                "buildDir",
                "must be a relative path inside the project, without `..`",
            ));
        }
        for (field, entries) in [("pages", &self.pages), ("data", &self.data), ("assets", &self.assets)] {
            for (i, entry) in entries.iter().enumerate() {
                if entry.trim().is_empty() {
                    violations.push(Violation::new(format!("{field}[{i}]"), "must be a non-empty string"));
                }
            }
        }
        violations
    }
}

/// Relative, and never climbing out through `..`.
fn is_inside_project(dir: &str) -> bool {
    Path::new(dir).components().all(|c| {
        !matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    })
}

/// The validated, fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub root: PathBuf,
    pub layout: PathBuf,
    pub build_dir: String,
    pub pages: Vec<PathBuf>,
    pub data: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
}

impl ProjectConfig {
    /// Absolute path of the output directory.
    pub fn build_path(&self) -> PathBuf {
        self.root.join(&self.build_dir)
    }
}

// =============================================================================
// Project root discovery
// =============================================================================

/// Directory to start the upward search from.
pub fn start_dir(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    start_dir_from(explicit, std::env::var_os("INIT_CWD"))
}

fn start_dir_from(explicit: Option<&Path>, init_cwd: Option<OsString>) -> Result<PathBuf, ConfigError> {
    let dir = match (explicit, init_cwd) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(init)) if !init.is_empty() => PathBuf::from(init),
        _ => std::env::current_dir()?,
    };
    Ok(std::path::absolute(dir)?)
}

/// Walk up from `start_dir` to the first directory containing `docmaker.yaml`.
pub fn locate_project_root(start_dir: &Path) -> Result<PathBuf, ConfigError> {
    start_dir
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::NotFound(start_dir.to_path_buf()))
}

// =============================================================================
// Loading, merging, and validation
// =============================================================================

/// Stock defaults as a YAML mapping, the base layer user values merge onto.
pub fn stock_defaults_value() -> Value {
    serde_yaml_ng::to_value(RawConfig::default()).unwrap_or(Value::Mapping(Mapping::new()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Mappings are merged key-by-key (overlay keys override base keys).
/// - `null` in the overlay means "not set" and keeps the base value.
/// - Any other overlay value replaces the base value entirely.
pub fn merge_yaml(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_yaml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

const STRING_FIELDS: &[&str] = &["layout", "buildDir"];
const LIST_FIELDS: &[&str] = &["pages", "data", "assets"];

/// Check the merged document's shape: known keys, correct value types.
///
/// Offending values are reset to their defaults so the document still
/// deserializes and [`RawConfig::validate`] can report value-level problems
/// in the same pass.
fn check_shape(merged: &mut Mapping, defaults: &Mapping) -> Vec<Violation> {
    let mut violations = Vec::new();

    let keys: Vec<Value> = merged.keys().cloned().collect();
    for key in keys {
        let name = match key.as_str() {
            Some(name) => name.to_string(),
            None => {
                violations.push(Violation::new(format!("{key:?}"), "keys must be strings"));
                merged.remove(&key);
                continue;
            }
        };
        let Some(value) = merged.get_mut(&key) else {
            continue;
        };

        if STRING_FIELDS.contains(&name.as_str()) {
            if !value.is_string() {
                violations.push(Violation::new(&name, "must be a string"));
                reset(value, defaults, &key);
            }
        } else if LIST_FIELDS.contains(&name.as_str()) {
            match value {
                Value::Sequence(items) => {
                    // Blanked rather than removed so later indices stay stable.
                    for (i, item) in items.iter_mut().enumerate() {
                        if !item.is_string() {
                            violations.push(Violation::new(format!("{name}[{i}]"), "must be a string"));
                            *item = Value::String(String::new());
                        }
                    }
                }
                _ => {
                    violations.push(Violation::new(&name, "must be an array of strings"));
                    reset(value, defaults, &key);
                }
            }
        } else if name == "pageOrder" {
            let valid = matches!(value.as_str(), Some("per-pattern" | "global"));
            if !valid {
                violations.push(Violation::new(&name, "must be one of: per-pattern, global"));
                reset(value, defaults, &key);
            }
        } else {
            violations.push(Violation::new(&name, "unknown field"));
            merged.remove(&key);
        }
    }

    violations
}

fn reset(value: &mut Value, defaults: &Mapping, key: &Value) {
    *value = defaults.get(key).cloned().unwrap_or(Value::Null);
}

/// Parse config text, merge onto defaults, and validate exhaustively.
pub fn parse_config(content: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    let overlay: Value = serde_yaml_ng::from_str(content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    if !matches!(overlay, Value::Mapping(_) | Value::Null) {
        return Err(ConfigError::Invalid(vec![Violation::new(
            "(document)",
            "must be a mapping of config fields",
        )]));
    }

    let defaults = match stock_defaults_value() {
        Value::Mapping(map) => map,
        _ => Mapping::new(),
    };
    let mut merged = match merge_yaml(Value::Mapping(defaults.clone()), overlay) {
        Value::Mapping(map) => map,
        _ => defaults.clone(),
    };

    let mut violations = check_shape(&mut merged, &defaults);
    let config: RawConfig =
        serde_yaml_ng::from_value(Value::Mapping(merged)).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    // A field already reported for its type isn't reported again for its value.
    for violation in config.validate() {
        if !violations.iter().any(|v| v.field == violation.field) {
            violations.push(violation);
        }
    }

    if violations.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Invalid(violations))
    }
}

/// Load `docmaker.yaml` from `project_root` and resolve every path in it.
///
/// The four path fields are resolved concurrently. Only a missing layout is
/// fatal; missing data/asset files and empty page globs are warnings.
pub fn load_config(project_root: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    let content = fs::read_to_string(&config_path)?;
    let raw = parse_config(&content, &config_path)?;
    debug!(path = %config_path.display(), "config validated");
    resolve_config(project_root, raw)
}

/// Turn a validated [`RawConfig`] into a [`ProjectConfig`] of existing paths.
pub fn resolve_config(project_root: &Path, raw: RawConfig) -> Result<ProjectConfig, ConfigError> {
    let ((layout, pages), (data, assets)) = rayon::join(
        || {
            rayon::join(
                || resolve::resolve_single_file(project_root, &raw.layout),
                || resolve::resolve_globs(project_root, &raw.pages, raw.page_order),
            )
        },
        || {
            rayon::join(
                || resolve::resolve_file_list(project_root, &raw.data),
                || resolve::resolve_file_list(project_root, &raw.assets),
            )
        },
    );

    let layout = match layout {
        Resolved::Found(path) => path,
        Resolved::NotFound(path) => return Err(ConfigError::LayoutMissing(path)),
    };

    Ok(ProjectConfig {
        root: project_root.to_path_buf(),
        layout,
        build_dir: raw.build_dir,
        pages: pages?,
        data,
        assets,
    })
}

/// Returns a fully-commented stock `docmaker.yaml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_yaml() -> &'static str {
    r#"# Docmaker Configuration
# ======================
# Place this file at the root of your documentation project as docmaker.yaml.
# Paths are relative to this file's directory.

# Outer HTML template. The rendered pages are available to it as {{ content }}.
# Required.
layout: layout.html

# Output directory. Created if absent; index.html and assets are written here.
buildDir: build

# How page matches are ordered:
#   per-pattern  sort within each pattern, keep pattern order (default)
#   global       sort all matched pages together
pageOrder: per-pattern

# Glob patterns for content pages. Each page is rendered as a template, the
# results are joined in order, and the whole document is converted from
# markdown to HTML once. A pattern that matches nothing only warns.
pages:
  - "*.md"

# Data files merged into the template namespace, in order; later files
# override earlier keys. Supported: .yaml .yml .json .toml
data: []

# Files placed next to index.html. Files ending in .liquid, .jinja or .j2 are
# rendered with the data namespace and written without that suffix; all
# others are copied unchanged. Existing files are never overwritten.
assets: []
"#
}
