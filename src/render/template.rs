//! Template stage.
//!
//! Templates are Jinja-style text (`{{ value }}`, `{% if %}`, `{% for %}`)
//! rendered with minijinja against the data namespace. The environment is
//! configured for document authoring rather than strictness:
//!
//! | Setting            | Behavior                                        |
//! |--------------------|-------------------------------------------------|
//! | undefined values   | render empty, including `a.b.c` chains          |
//! | `none` values      | render empty                                    |
//! | autoescaping       | off; HTML content is spliced in verbatim        |
//! | trailing newline   | kept, so page boundaries survive concatenation  |
//!
//! The common Liquid output filters (`upcase`, `downcase`, `strip`, `size`,
//! `append`, `prepend`) are registered next to the built-in ones, so
//! `{{ name | upcase }}` works in `.liquid` assets. Filter arguments use call
//! syntax: `{{ name | append("!") }}`.
//!
//! Every template is rendered on its own, with no shared registry, so pages
//! cannot include or extend each other.

use super::{RenderError, Renderer};
use crate::data::DataNamespace;
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, Error, Output, State, UndefinedBehavior};
use std::error::Error as _;
use std::path::Path;

/// Renders template text against a data namespace.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        env.set_formatter(format_value);

        env.add_filter("upcase", |s: String| s.to_uppercase());
        env.add_filter("downcase", |s: String| s.to_lowercase());
        env.add_filter("strip", |s: String| s.trim().to_string());
        env.add_filter("size", |v: Value| v.len().unwrap_or(0));
        env.add_filter("append", |s: String, suffix: String| format!("{s}{suffix}"));
        env.add_filter("prepend", |s: String, prefix: String| format!("{prefix}{s}"));

        Self { env }
    }

    /// Render `text`, attributing errors to `origin` (usually a file path).
    pub fn render_named(
        &self,
        origin: &str,
        text: &str,
        namespace: &DataNamespace,
    ) -> Result<String, RenderError> {
        self.env
            .render_named_str(origin, text, namespace)
            .map_err(|e| template_error(origin, &e))
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, text: &str, namespace: &DataNamespace) -> Result<String, RenderError> {
        self.render_named("<template>", text, namespace)
    }

    fn render_file(&self, path: &Path, namespace: &DataNamespace) -> Result<String, RenderError> {
        let text = super::read_source(path)?;
        self.render_named(&path.display().to_string(), &text, namespace)
    }
}

/// `none` prints nothing; everything else formats as usual.
fn format_value(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), Error> {
    if value.is_none() {
        return Ok(());
    }
    minijinja::escape_formatter(out, state, value)
}

fn template_error(origin: &str, err: &Error) -> RenderError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    RenderError::Template {
        origin: origin.to_string(),
        message,
    }
}
