//! CLI output formatting.
//!
//! Output lists what the build consumed and produced, each entry led by its
//! positional index, with paths shown relative to the project root.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Pages
//!     001 intro.md
//!         Source: pages/intro.md
//!     002 usage.md
//!         Source: pages/usage.md
//!
//! Assets
//!     001 about.liquid → about (rendered)
//!     002 style.css → style.css (copied)
//!
//! index.html → build/index.html (2048 bytes)
//! Built 2 pages, 1 data source, 2 assets
//! ```
//!
//! ## Check
//!
//! ```text
//! Layout
//!     layout.html
//!
//! Pages
//!     001 intro.md
//!         Source: pages/intro.md
//!
//! Data
//!     001 data/site.yaml
//!
//! Namespace
//!     pagebreak, title, version
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::assets::{AssetKind, AssetOutcome};
use crate::build::{BuildReport, CheckReport};
use std::path::{Path, PathBuf};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root`, or unchanged when it lies outside it.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn page_lines(pages: &[PathBuf], root: &Path) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in pages.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), file_name(page)));
        lines.push(format!("{}Source: {}", indent(2), relative(page, root)));
    }
    lines
}

fn asset_line(index: usize, outcome: &AssetOutcome, root: &Path) -> String {
    let kind = match outcome.kind {
        AssetKind::Rendered => "rendered",
        AssetKind::Copied => "copied",
    };
    format!(
        "{}{} {} \u{2192} {} ({})",
        indent(1),
        format_index(index),
        file_name(&outcome.source),
        relative(&outcome.destination, root),
        kind
    )
}

// ============================================================================
// Build
// ============================================================================

/// Format the summary of a completed build.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let root = report.root.as_path();
    let mut lines = Vec::new();

    if !report.pages.is_empty() {
        lines.extend(page_lines(&report.pages, root));
        lines.push(String::new());
    }

    if !report.assets.is_empty() {
        lines.push("Assets".to_string());
        for (i, outcome) in report.assets.iter().enumerate() {
            lines.push(asset_line(i + 1, outcome, root));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "index.html \u{2192} {} ({} bytes)",
        relative(&report.document, root),
        report.document_bytes
    ));
    lines.push(format!(
        "Built {}, {}, {}",
        plural(report.pages.len(), "page", "pages"),
        plural(report.data_sources, "data source", "data sources"),
        plural(report.assets.len(), "asset", "assets"),
    ));

    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the resolved project without building it.
pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let config = &report.config;
    let root = config.root.as_path();
    let mut lines = vec![
        "Layout".to_string(),
        format!("{}{}", indent(1), relative(&config.layout, root)),
        String::new(),
    ];

    lines.extend(page_lines(&config.pages, root));
    lines.push(String::new());

    lines.push("Data".to_string());
    for (i, path) in config.data.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), relative(path, root)));
    }
    lines.push(String::new());

    lines.push("Assets".to_string());
    for (i, path) in config.assets.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), relative(path, root)));
    }
    lines.push(String::new());

    let mut keys: Vec<&str> = report.namespace.keys().collect();
    keys.sort_unstable();
    lines.push("Namespace".to_string());
    lines.push(format!("{}{}", indent(1), keys.join(", ")));

    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}
