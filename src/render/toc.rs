//! Table of contents generation.
//!
//! Headings are collected over the whole document, so the table lists every
//! page's sections no matter where the marker appears. Only headings up to
//! the configured depth are included; deeper levels nest under the nearest
//! shallower heading before them.

use maud::{Markup, html};

/// Markers that are replaced by the table of contents when they make up a
/// whole paragraph.
pub const TOC_MARKERS: &[&str] = &["[[toc]]", "${toc}"];

/// One heading, as it appears in the rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    /// Anchor id assigned to the heading.
    pub id: String,
}

struct TocNode<'a> {
    entry: &'a TocEntry,
    children: Vec<TocNode<'a>>,
}

pub fn is_marker(text: &str) -> bool {
    TOC_MARKERS.contains(&text.trim())
}

/// Render headings of level `<= max_depth` as a nested list.
pub fn render_toc(entries: &[TocEntry], max_depth: u8) -> String {
    let visible: Vec<&TocEntry> = entries.iter().filter(|e| e.level <= max_depth).collect();
    let tree = build_tree(&visible);
    html! {
        nav class="table-of-contents" {
            (render_nodes(&tree))
        }
    }
    .into_string()
}

/// Each entry owns the following entries that are deeper than it.
fn build_tree<'a>(entries: &[&'a TocEntry]) -> Vec<TocNode<'a>> {
    let mut nodes = Vec::new();
    let mut i = 0;
    while i < entries.len() {
        let entry = entries[i];
        let mut end = i + 1;
        while end < entries.len() && entries[end].level > entry.level {
            end += 1;
        }
        nodes.push(TocNode {
            entry,
            children: build_tree(&entries[i + 1..end]),
        });
        i = end;
    }
    nodes
}

fn render_nodes(nodes: &[TocNode]) -> Markup {
    html! {
        ol {
            @for node in nodes {
                li {
                    a href=(format!("#{}", node.entry.id)) { (node.entry.text) }
                    @if !node.children.is_empty() {
                        (render_nodes(&node.children))
                    }
                }
            }
        }
    }
}
