//! Asset processing.
//!
//! Each configured asset lands in the build directory under its base name.
//! Template-bearing suffixes are rendered and stripped; everything else is
//! copied byte for byte:
//!
//! ```text
//! assets/about.liquid  ──render──▶  build/about
//! assets/style.css     ──copy────▶  build/style.css
//! ```
//!
//! Copies never overwrite: an existing destination fails the build with
//! [`AssetError::DestinationExists`]. Rendered assets are written over
//! whatever is there.

use crate::render::{DocRenderer, RenderError};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Suffixes marking an asset as a template.
pub const TEMPLATE_SUFFIXES: &[&str] = &["liquid", "jinja", "j2"];

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("failed to write asset {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to render asset: {0}")]
    Render(#[from] RenderError),
    #[error("asset path has no file name: {}", .0.display())]
    NoFileName(PathBuf),
}

impl AssetError {
    pub fn is_user_facing(&self) -> bool {
        match self {
            AssetError::Render(e) => e.is_user_facing(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Rendered,
    Copied,
}

/// What happened to one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: AssetKind,
}

pub fn is_template_asset(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEMPLATE_SUFFIXES.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Where `asset` goes inside `build_dir`, and how it gets there.
pub fn asset_destination(build_dir: &Path, asset: &Path) -> Result<(PathBuf, AssetKind), AssetError> {
    if is_template_asset(asset) {
        let stem = asset
            .file_stem()
            .ok_or_else(|| AssetError::NoFileName(asset.to_path_buf()))?;
        Ok((build_dir.join(stem), AssetKind::Rendered))
    } else {
        let name = asset
            .file_name()
            .ok_or_else(|| AssetError::NoFileName(asset.to_path_buf()))?;
        Ok((build_dir.join(name), AssetKind::Copied))
    }
}

/// Create `dir` and its parents if absent.
pub fn ensure_dir(dir: &Path) -> Result<(), AssetError> {
    fs::create_dir_all(dir).map_err(|source| AssetError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Copy `from` to `to`, failing if `to` already exists.
pub fn copy_new(from: &Path, to: &Path) -> Result<u64, AssetError> {
    let mut reader = fs::File::open(from).map_err(|source| AssetError::Io {
        path: from.to_path_buf(),
        source,
    })?;
    let mut writer = match OpenOptions::new().write(true).create_new(true).open(to) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(AssetError::DestinationExists(to.to_path_buf()));
        }
        Err(source) => {
            return Err(AssetError::Io {
                path: to.to_path_buf(),
                source,
            });
        }
    };
    io::copy(&mut reader, &mut writer).map_err(|source| AssetError::Io {
        path: to.to_path_buf(),
        source,
    })
}

/// Render or copy every asset, in order, into `build_dir`.
pub fn process_assets(
    renderer: &DocRenderer,
    build_dir: &Path,
    assets: &[PathBuf],
) -> Result<Vec<AssetOutcome>, AssetError> {
    let mut outcomes = Vec::with_capacity(assets.len());

    for asset in assets {
        let (destination, kind) = asset_destination(build_dir, asset)?;
        match kind {
            AssetKind::Rendered => {
                let text = renderer.render_asset(asset)?;
                fs::write(&destination, text).map_err(|source| AssetError::Io {
                    path: destination.clone(),
                    source,
                })?;
            }
            AssetKind::Copied => {
                copy_new(asset, &destination)?;
            }
        }
        info!(source = %asset.display(), destination = %destination.display(), ?kind, "asset written");
        outcomes.push(AssetOutcome {
            source: asset.clone(),
            destination,
            kind,
        });
    }

    Ok(outcomes)
}
