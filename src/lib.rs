//! # Docmaker
//!
//! Builds one HTML document from a directory of templated markdown pages,
//! structured data files, and static assets. A project is any directory with
//! a `docmaker.yaml`; the build writes `index.html` plus processed assets into
//! its build directory.
//!
//! # Architecture: One Linear Build
//!
//! ```text
//! locate root → load config → aggregate data → render pages → render layout
//!             → write index.html → process assets
//! ```
//!
//! Configuration is resolved into absolute, verified paths before anything
//! renders. Data is folded into a single namespace that every template sees.
//! Pages are template-rendered individually, joined in order, and converted
//! from markdown to HTML in one pass so anchors and the table of contents
//! cover the whole document. The layout wraps the result as `{{ content }}`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resolve`] | Path specs and glob patterns → verified absolute paths |
//! | [`config`] | Project root discovery, `docmaker.yaml` loading, validation, and resolution |
//! | [`data`] | Data sources (YAML, JSON, TOML, computed) merged into the template namespace |
//! | [`render`] | Template stage (minijinja), markup stage (pulldown-cmark + syntect), and their composition |
//! | [`assets`] | Template-rendering or copying assets into the build directory |
//! | [`build`] | Stage-by-stage orchestration and the error classification the CLI relies on |
//! | [`output`] | CLI output formatting for build and check reports |
//!
//! # Design Decisions
//!
//! ## Markup Runs Once
//!
//! Pages are not converted to HTML individually. Their templated text is
//! concatenated first, so a `[[toc]]` marker on the first page lists headings
//! from the last, and duplicate heading anchors are numbered across pages.
//!
//! ## Declarative Data by Default
//!
//! Data files are parsed, never executed. Computed data is opt-in through
//! [`data::DataProvider`], which receives the project root explicitly instead
//! of relying on the process working directory.
//!
//! ## Missing Inputs Warn
//!
//! Only the layout is required. A page glob that matches nothing, or a data or
//! asset path that doesn't exist, is logged and skipped so a half-written
//! project still builds.

pub mod assets;
pub mod build;
pub mod config;
pub mod data;
pub mod output;
pub mod render;
pub mod resolve;

#[cfg(test)]
pub(crate) mod test_helpers;
