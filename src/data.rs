//! Data aggregation.
//!
//! Data files fill the template namespace. They are loaded in the order the
//! config lists them and shallow-merged, so a later file replaces any
//! top-level key an earlier file defined:
//!
//! ```text
//! data/defaults.yaml   version: 1, title: Handbook
//! data/release.json    version: 2
//! ────────────────────────────────────────────────
//! namespace            pagebreak: …, version: 2, title: Handbook
//! ```
//!
//! ## Source Types
//!
//! | Suffix          | Loader                                  |
//! |-----------------|-----------------------------------------|
//! | `.yaml`, `.yml` | `serde_yaml_ng`                         |
//! | `.json`         | `serde_json`                            |
//! | `.toml`         | `toml`                                  |
//! | registered      | a [`DataProvider`] (computed data)      |
//! | anything else   | skipped with a warning                  |
//!
//! Data is declarative by default. Computed data is an explicit opt-in:
//! register a [`DataProvider`] for a suffix on the [`DataLoader`]. Providers
//! receive the project root as a parameter instead of relying on the process
//! working directory.
//!
//! ## Built-ins
//!
//! The namespace is seeded with [`PAGEBREAK_KEY`] before any user data, so a
//! data file may redefine it.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// A flat mapping of top-level keys to values.
pub type DataMap = serde_json::Map<String, Value>;

pub const PAGEBREAK_KEY: &str = "pagebreak";
pub const PAGEBREAK_HTML: &str = r#"<div style="page-break-after: always"></div>"#;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read data file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse data file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid data source {}: {reason}", .path.display())]
    InvalidDataSource { path: PathBuf, reason: String },
}

impl DataError {
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, DataError::Io { .. })
    }
}

/// The template namespace: every data source folded into one mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataNamespace(DataMap);

impl DataNamespace {
    /// A namespace holding only the built-in helper values.
    pub fn with_builtins() -> Self {
        let mut map = DataMap::new();
        map.insert(PAGEBREAK_KEY.to_string(), Value::String(PAGEBREAK_HTML.to_string()));
        Self(map)
    }

    /// Shallow merge: every key in `map` replaces the existing one.
    pub fn merge(&mut self, map: DataMap) {
        for (key, value) in map {
            self.0.insert(key, value);
        }
    }

    /// A copy of this namespace with call-scoped values layered on top.
    ///
    /// The receiver is left untouched.
    pub fn with_overrides(&self, overrides: DataMap) -> Self {
        let mut scoped = self.clone();
        scoped.merge(overrides);
        scoped
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<DataMap> for DataNamespace {
    fn from(map: DataMap) -> Self {
        Self(map)
    }
}

/// What a computed data source evaluates to.
pub enum DataValue {
    /// Used as-is.
    Mapping(DataMap),
    /// Invoked once; its result must itself be a mapping.
    Producer(Box<dyn FnOnce() -> Result<Value, DataError> + Send>),
    /// Anything else. Always rejected as an invalid data source.
    Other(Value),
}

/// Capability for computed data sources, registered per file suffix.
pub trait DataProvider: Send + Sync {
    /// Evaluate the source at `path`. `base_dir` is the project root; resolve
    /// any relative paths the source needs against it.
    fn evaluate(&self, path: &Path, base_dir: &Path) -> Result<DataValue, DataError>;
}

/// Loads and merges data sources.
#[derive(Default)]
pub struct DataLoader {
    providers: Vec<(String, Box<dyn DataProvider>)>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for files ending in `.{extension}`.
    ///
    /// Providers are consulted before the built-in structured formats.
    pub fn with_provider(mut self, extension: &str, provider: impl DataProvider + 'static) -> Self {
        self.providers
            .push((extension.trim_start_matches('.').to_ascii_lowercase(), Box::new(provider)));
        self
    }

    /// Load one data source. `Ok(None)` means the suffix isn't supported and
    /// the file was skipped.
    pub fn load_data_source(&self, path: &Path, base_dir: &Path) -> Result<Option<DataMap>, DataError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if let Some((_, provider)) = self.providers.iter().find(|(ext, _)| *ext == extension) {
            let value = provider.evaluate(path, base_dir)?;
            return evaluate_computed(path, value).map(Some);
        }

        let format = match extension.as_str() {
            "yaml" | "yml" => Format::Yaml,
            "json" => Format::Json,
            "toml" => Format::Toml,
            _ => {
                warn!("Unknown data file extension \"{extension}\": skipping {}", path.display());
                return Ok(None);
            }
        };

        let content = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_structured(path, &content, format).map(Some)
    }

    /// Fold every source, in order, onto the built-in namespace.
    ///
    /// Sources are loaded one at a time: precedence depends on order, and a
    /// provider may rely on nothing else running alongside it.
    pub fn aggregate(&self, base_dir: &Path, paths: &[PathBuf]) -> Result<DataNamespace, DataError> {
        let mut namespace = DataNamespace::with_builtins();
        for path in paths {
            if let Some(map) = self.load_data_source(path, base_dir)? {
                debug!(path = %path.display(), keys = map.len(), "data source loaded");
                namespace.merge(map);
            }
        }
        Ok(namespace)
    }
}

/// Aggregate with the declarative loaders only.
pub fn aggregate(base_dir: &Path, paths: &[PathBuf]) -> Result<DataNamespace, DataError> {
    DataLoader::new().aggregate(base_dir, paths)
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Yaml,
    Json,
    Toml,
}

fn parse_structured(path: &Path, content: &str, format: Format) -> Result<DataMap, DataError> {
    if content.trim().is_empty() {
        return Ok(DataMap::new());
    }

    let parsed: Result<Value, String> = match format {
        Format::Yaml => serde_yaml_ng::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    let value = parsed.map_err(|message| DataError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    into_mapping(path, value)
}

fn evaluate_computed(path: &Path, value: DataValue) -> Result<DataMap, DataError> {
    match value {
        DataValue::Mapping(map) => Ok(map),
        DataValue::Producer(produce) => into_mapping(path, produce()?),
        DataValue::Other(other) => Err(DataError::InvalidDataSource {
            path: path.to_path_buf(),
            reason: format!("expected a mapping or a producer, got {}", type_name(&other)),
        }),
    }
}

fn into_mapping(path: &Path, value: Value) -> Result<DataMap, DataError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(DataMap::new()),
        other => Err(DataError::InvalidDataSource {
            path: path.to_path_buf(),
            reason: format!("top level must be a mapping, got {}", type_name(&other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}
