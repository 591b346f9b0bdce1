//! Syntax highlighting for fenced code blocks.

use maud::html;
use syntect::{highlighting::ThemeSet, html::highlighted_html_for_string, parsing::SyntaxSet};

pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Syntax highlighter using syntect's bundled syntaxes and themes.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl SyntaxHighlighter {
    /// Create a highlighter. An unknown theme name falls back to the default.
    pub fn new(theme: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        let theme = if theme_set.themes.contains_key(theme) {
            theme.to_string()
        } else {
            DEFAULT_THEME.to_string()
        };
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme,
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Highlight `code` as `lang`.
    ///
    /// Never fails: no language, an unknown language, or a highlighting error
    /// all produce the escaped code in a plain `<pre><code>` block.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = lang.and_then(|l| self.syntax_set.find_syntax_by_token(l));
        let theme = self
            .theme_set
            .themes
            .get(&self.theme)
            .or_else(|| self.theme_set.themes.values().next());

        match (syntax, theme) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
                    .unwrap_or_else(|_| plain_code_block(code, lang))
            }
            _ => plain_code_block(code, lang),
        }
    }
}

/// Escaped, unhighlighted code block.
pub fn plain_code_block(code: &str, lang: Option<&str>) -> String {
    html! {
        pre {
            code class=[lang.map(|l| format!("language-{l}"))] { (code) }
        }
    }
    .into_string()
}
