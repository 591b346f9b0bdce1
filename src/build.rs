//! Build orchestration.
//!
//! A build is one linear pass; any failure aborts it:
//!
//! ```text
//! Start → RootLocated → ConfigLoaded → DataAggregated → PagesRendered
//!       → LayoutRendered → DocumentWritten → AssetsProcessed → Done
//! ```
//!
//! Nothing touches the build directory until the whole document has rendered,
//! so a build that fails early leaves no build directory behind. Files written
//! before a later failure are left in place.

use crate::assets::{self, AssetError, AssetOutcome};
use crate::config::{self, ConfigError, ProjectConfig};
use crate::data::{DataError, DataLoader, DataNamespace};
use crate::render::markup::MarkupOptions;
use crate::render::{DocRenderer, RenderError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DOCUMENT_NAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("refusing to clean {}: not a directory inside the project root", .0.display())]
    UnsafeClean(PathBuf),
}

impl BuildError {
    /// User-facing errors are reported as a plain message; the rest get full
    /// diagnostics.
    pub fn is_user_facing(&self) -> bool {
        match self {
            BuildError::Config(e) => e.is_user_facing(),
            BuildError::Data(e) => e.is_user_facing(),
            BuildError::Render(e) => e.is_user_facing(),
            BuildError::Asset(e) => e.is_user_facing(),
            BuildError::Write { .. } => false,
            BuildError::UnsafeClean(_) => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    RootLocated,
    ConfigLoaded,
    DataAggregated,
    PagesRendered,
    LayoutRendered,
    DocumentWritten,
    AssetsProcessed,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::RootLocated => "root-located",
            Stage::ConfigLoaded => "config-loaded",
            Stage::DataAggregated => "data-aggregated",
            Stage::PagesRendered => "pages-rendered",
            Stage::LayoutRendered => "layout-rendered",
            Stage::DocumentWritten => "document-written",
            Stage::AssetsProcessed => "assets-processed",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "build stage");
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Where to start looking for `docmaker.yaml`. `None` uses `INIT_CWD`,
    /// then the working directory.
    pub start_dir: Option<PathBuf>,
    /// Remove the build directory before writing.
    pub clean: bool,
    pub markup: MarkupOptions,
}

/// What a completed build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub root: PathBuf,
    pub build_dir: PathBuf,
    pub pages: Vec<PathBuf>,
    pub data_sources: usize,
    pub document: PathBuf,
    pub document_bytes: usize,
    pub assets: Vec<AssetOutcome>,
}

/// The resolved project, as `check` sees it.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub config: ProjectConfig,
    pub namespace: DataNamespace,
}

/// Run a full build with the declarative data loaders.
pub fn build(options: &BuildOptions) -> Result<BuildReport, BuildError> {
    build_with(options, &DataLoader::new())
}

/// Run a full build, loading data through `loader`.
pub fn build_with(options: &BuildOptions, loader: &DataLoader) -> Result<BuildReport, BuildError> {
    let (config, namespace) = prepare(options, loader)?;
    let data_sources = config.data.len();
    let renderer = DocRenderer::new(namespace, options.markup.clone());

    let content = renderer.render_pages(&config.pages)?;
    enter(Stage::PagesRendered);

    let document = renderer.render_layout(&config.layout, &content)?;
    enter(Stage::LayoutRendered);

    let build_dir = config.build_path();
    if options.clean {
        clean_build_dir(&config.root, &build_dir)?;
    }
    let document_path = write_document(&build_dir, &document)?;
    enter(Stage::DocumentWritten);

    let assets = assets::process_assets(&renderer, &build_dir, &config.assets)?;
    enter(Stage::AssetsProcessed);

    enter(Stage::Done);
    Ok(BuildReport {
        root: config.root,
        build_dir,
        pages: config.pages,
        data_sources,
        document: document_path,
        document_bytes: document.len(),
        assets,
    })
}

/// Resolve the project and its data without rendering or writing anything.
pub fn check(options: &BuildOptions) -> Result<CheckReport, BuildError> {
    check_with(options, &DataLoader::new())
}

pub fn check_with(options: &BuildOptions, loader: &DataLoader) -> Result<CheckReport, BuildError> {
    let (config, namespace) = prepare(options, loader)?;
    Ok(CheckReport { config, namespace })
}

/// Start through DataAggregated.
fn prepare(options: &BuildOptions, loader: &DataLoader) -> Result<(ProjectConfig, DataNamespace), BuildError> {
    enter(Stage::Start);
    let start = config::start_dir(options.start_dir.as_deref())?;
    let root = config::locate_project_root(&start)?;
    enter(Stage::RootLocated);

    let config = config::load_config(&root)?;
    enter(Stage::ConfigLoaded);

    let namespace = loader.aggregate(&config.root, &config.data)?;
    enter(Stage::DataAggregated);

    Ok((config, namespace))
}

/// Remove `build_dir`, refusing anything that is not strictly inside `root`.
///
/// Both paths are compared after resolving symlinks and `..`, so a build
/// directory that leads elsewhere on disk is never removed.
fn clean_build_dir(root: &Path, build_dir: &Path) -> Result<(), BuildError> {
    let real_root = canonical(root)?;
    let real_build = if build_dir.exists() {
        canonical(build_dir)?
    } else {
        build_dir.to_path_buf()
    };
    if real_build == real_root || !real_build.starts_with(&real_root) {
        return Err(BuildError::UnsafeClean(build_dir.to_path_buf()));
    }
    if build_dir.exists() {
        fs::remove_dir_all(build_dir).map_err(|source| BuildError::Write {
            path: build_dir.to_path_buf(),
            source,
        })?;
        info!(path = %build_dir.display(), "build directory removed");
    }
    Ok(())
}

fn canonical(path: &Path) -> Result<PathBuf, BuildError> {
    path.canonicalize().map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document(build_dir: &Path, document: &str) -> Result<PathBuf, BuildError> {
    assets::ensure_dir(build_dir)?;
    let path = build_dir.join(DOCUMENT_NAME);
    fs::write(&path, document).map_err(|source| BuildError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = document.len(), "document written");
    Ok(path)
}
