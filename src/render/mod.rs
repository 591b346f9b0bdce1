//! Rendering pipeline.
//!
//! Pages go through two stages, then land in the layout:
//!
//! ```text
//! pages/*.md ──template──▶ text ──┐
//!                                  ├─ concat ──markup──▶ content ──layout──▶ index.html
//! pages/*.md ──template──▶ text ──┘
//! ```
//!
//! | Stage    | Module       | Input → Output                    |
//! |----------|--------------|-----------------------------------|
//! | template | [`template`] | template text + namespace → text  |
//! | markup   | [`markup`]   | markdown → HTML                   |
//! | layout   | [`template`] | layout + `content` override → HTML|
//!
//! Page templates render in parallel; results are joined in page order.
//! Markup runs once over the concatenation so anchors and the table of
//! contents span every page.
//!
//! While a page renders, the namespace carries a `page` override:
//! `{ path, name, index }`. The layout render carries `content`. Neither is
//! visible outside its own call.

pub mod highlight;
pub mod markup;
pub mod template;
pub mod toc;

use crate::data::{DataMap, DataNamespace};
use markup::{MarkupOptions, MarkupRenderer};
use rayon::prelude::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use template::TemplateRenderer;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("template error in {origin}: {message}")]
    Template { origin: String, message: String },
}

impl RenderError {
    /// Template errors point at something the user wrote.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, RenderError::Template { .. })
    }
}

/// One rendering stage.
pub trait Renderer: Sync {
    fn render(&self, text: &str, namespace: &DataNamespace) -> Result<String, RenderError>;

    fn render_file(&self, path: &Path, namespace: &DataNamespace) -> Result<String, RenderError> {
        let text = read_source(path)?;
        self.render(&text, namespace)
    }
}

pub(crate) fn read_source(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// The full document renderer: template stage, markup stage, and layout.
pub struct DocRenderer {
    namespace: DataNamespace,
    template: TemplateRenderer,
    markup: MarkupRenderer,
}

impl DocRenderer {
    pub fn new(namespace: DataNamespace, options: MarkupOptions) -> Self {
        Self {
            namespace,
            template: TemplateRenderer::new(),
            markup: MarkupRenderer::new(options),
        }
    }

    pub fn namespace(&self) -> &DataNamespace {
        &self.namespace
    }

    /// Template-render one page with its `page` override.
    pub fn render_page(&self, index: usize, path: &Path) -> Result<String, RenderError> {
        let text = read_source(path)?;
        let namespace = self.namespace.with_overrides(page_override(index, path));
        self.template
            .render_named(&path.display().to_string(), &text, &namespace)
    }

    /// Render every page and the markup stage over their concatenation.
    ///
    /// The first failing page (in page order) is reported.
    pub fn render_pages(&self, pages: &[PathBuf]) -> Result<String, RenderError> {
        let rendered: Vec<Result<String, RenderError>> = pages
            .par_iter()
            .enumerate()
            .map(|(index, path)| self.render_page(index, path))
            .collect();

        let mut combined = String::new();
        for page in rendered {
            combined.push_str(&page?);
        }
        debug!(pages = pages.len(), bytes = combined.len(), "pages rendered");

        Ok(self.markup.render_markup(&combined))
    }

    /// Render the layout with `content` bound to the page HTML.
    pub fn render_layout(&self, layout: &Path, content: &str) -> Result<String, RenderError> {
        let text = read_source(layout)?;
        let mut overrides = DataMap::new();
        overrides.insert("content".to_string(), Value::String(content.to_string()));
        let namespace = self.namespace.with_overrides(overrides);
        self.template
            .render_named(&layout.display().to_string(), &text, &namespace)
    }

    /// Pages then layout: the finished document.
    pub fn render_document(&self, layout: &Path, pages: &[PathBuf]) -> Result<String, RenderError> {
        let content = self.render_pages(pages)?;
        self.render_layout(layout, &content)
    }

    /// Template-render an asset against the plain namespace.
    pub fn render_asset(&self, path: &Path) -> Result<String, RenderError> {
        self.template.render_file(path, &self.namespace)
    }
}

fn page_override(index: usize, path: &Path) -> DataMap {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut map = DataMap::new();
    map.insert(
        "page".to_string(),
        json!({
            "path": path.display().to_string(),
            "name": name,
            "index": index,
        }),
    );
    map
}
