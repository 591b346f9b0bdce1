//! Markup stage: markdown to HTML.
//!
//! Rendering runs in two passes over the pulldown-cmark event stream:
//!
//! 1. **Anchors**: every heading gets an `id`, and its text is recorded as a
//!    [`TocEntry`]. Explicit ids (`## Setup {#setup}`) are kept; the rest are
//!    slugs, made unique with `-1`, `-2`, … suffixes in document order.
//! 2. **Blocks**: fenced code becomes highlighted HTML (or a diagram
//!    container for `mermaid`), and a paragraph consisting only of a TOC
//!    marker becomes the table of contents.
//!
//! Because the anchor pass sees the whole input before anything is emitted,
//! the orchestrator feeds this stage the concatenation of all pages at once.
//!
//! Raw HTML passes through untouched, so output of a previous render (and
//! HTML pages mixed into markdown) survives a second pass unchanged.

use super::highlight::SyntaxHighlighter;
use super::toc::{self, TocEntry};
use super::{RenderError, Renderer};
use crate::data::DataNamespace;
use maud::html;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};
use std::collections::{HashMap, HashSet};

/// Markup stage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupOptions {
    /// Deepest heading level listed in the table of contents.
    pub toc_depth: u8,
    /// Render ```` ```mermaid ```` blocks as diagram containers.
    pub diagrams: bool,
    pub footnotes: bool,
    /// syntect theme for code blocks.
    pub theme: String,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            toc_depth: 2,
            diagrams: true,
            footnotes: true,
            theme: super::highlight::DEFAULT_THEME.to_string(),
        }
    }
}

/// Languages handed to the browser as diagrams instead of highlighted.
const DIAGRAM_LANGUAGES: &[&str] = &["mermaid"];

#[derive(Debug)]
pub struct MarkupRenderer {
    options: MarkupOptions,
    highlighter: SyntaxHighlighter,
}

impl Default for MarkupRenderer {
    fn default() -> Self {
        Self::new(MarkupOptions::default())
    }
}

impl MarkupRenderer {
    pub fn new(options: MarkupOptions) -> Self {
        let highlighter = SyntaxHighlighter::new(&options.theme);
        Self {
            options,
            highlighter,
        }
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        if self.options.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        options
    }

    /// Convert markdown to HTML.
    pub fn render_markup(&self, text: &str) -> String {
        let mut events: Vec<Event> = Parser::new_ext(text, self.parser_options()).collect();
        let headings = assign_anchors(&mut events);
        let events = self.replace_blocks(events, &headings);

        let mut html = String::with_capacity(text.len() * 3 / 2);
        md_html::push_html(&mut html, events.into_iter());
        html
    }

    fn replace_blocks<'a>(&self, events: Vec<Event<'a>>, headings: &[TocEntry]) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut iter = events.into_iter();

        while let Some(event) = iter.next() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match &kind {
                        CodeBlockKind::Fenced(info) => info_language(info),
                        CodeBlockKind::Indented => None,
                    };
                    let mut code = String::new();
                    for inner in iter.by_ref() {
                        match inner {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(text) => code.push_str(&text),
                            _ => {}
                        }
                    }
                    out.push(Event::Html(self.render_code(&code, lang.as_deref()).into()));
                }
                Event::Start(Tag::Paragraph) => {
                    let mut inner = Vec::new();
                    for next in iter.by_ref() {
                        if matches!(next, Event::End(TagEnd::Paragraph)) {
                            break;
                        }
                        inner.push(next);
                    }
                    if is_toc_paragraph(&inner) {
                        let nav = toc::render_toc(headings, self.options.toc_depth);
                        out.push(Event::Html(format!("{nav}\n").into()));
                    } else {
                        out.push(Event::Start(Tag::Paragraph));
                        out.extend(inner);
                        out.push(Event::End(TagEnd::Paragraph));
                    }
                }
                other => out.push(other),
            }
        }

        out
    }

    fn render_code(&self, code: &str, lang: Option<&str>) -> String {
        match lang {
            Some(l) if self.options.diagrams && DIAGRAM_LANGUAGES.contains(&l) => {
                let diagram = html! { div class=(l) { (code) } };
                format!("{}\n", diagram.into_string())
            }
            _ => format!("{}\n", self.highlighter.highlight(code, lang)),
        }
    }
}

impl Renderer for MarkupRenderer {
    fn render(&self, text: &str, _namespace: &DataNamespace) -> Result<String, RenderError> {
        Ok(self.render_markup(text))
    }
}

/// First word of a fence info string: `rust,ignore` and `rust {.x}` → `rust`.
fn info_language(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

fn is_toc_paragraph(events: &[Event]) -> bool {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) => text.push_str(t),
            _ => return false,
        }
    }
    toc::is_marker(&text)
}

/// Give every heading an id and collect the table of contents entries.
fn assign_anchors(events: &mut [Event]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut open: Option<(usize, String)> = None;

    // explicit ids are reserved up front so generated slugs can't take them
    for event in events.iter() {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            used.insert(id.to_string());
        }
    }

    for i in 0..events.len() {
        let closed_level = match &events[i] {
            Event::Start(Tag::Heading { .. }) => {
                open = Some((i, String::new()));
                None
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, heading_text)) = open.as_mut() {
                    heading_text.push_str(text);
                }
                None
            }
            Event::End(TagEnd::Heading(level)) => Some(*level as u8),
            _ => None,
        };

        let Some(level) = closed_level else {
            continue;
        };
        let Some((start, text)) = open.take() else {
            continue;
        };
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
            let anchor = match id {
                Some(explicit) => explicit.to_string(),
                None => {
                    let anchor = unique_slug(&slugify(&text), &mut used, &mut counters);
                    *id = Some(CowStr::from(anchor.clone()));
                    anchor
                }
            };
            entries.push(TocEntry {
                level,
                text: text.trim().to_string(),
                id: anchor,
            });
        }
    }

    entries
}

fn unique_slug(base: &str, used: &mut HashSet<String>, counters: &mut HashMap<String, usize>) -> String {
    let mut candidate = base.to_string();
    while used.contains(&candidate) {
        let n = counters.entry(base.to_string()).or_insert(0);
        *n += 1;
        candidate = format!("{base}-{n}");
    }
    used.insert(candidate.clone());
    candidate
}

/// Convert heading text to an anchor id.
pub fn slugify(text: &str) -> String {
    let slug = text
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() { "section".to_string() } else { slug }
}
