//! Markdown-aware protection for the plain-text translation path.
//!
//! Spans that a plain-text backend would mangle are swapped for synthetic
//! tokens before translation and put back afterwards. Categories are
//! extracted in a fixed order, each pass working on the output of the
//! previous one:
//!
//! 1. fenced code blocks
//! 2. HTML tags
//! 3. images
//! 4. links
//! 5. inline code
//!
//! Tokens look like `__LINK_3__`. The number comes from one counter shared
//! by every category, so two tokens of the same map never collide.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::warn;

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]\([^)]+\)").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]+`").unwrap());

/// Token → original span table for a single document
#[derive(Debug, Default, Clone)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
    next_id: usize,
}

/// Outcome of putting the original spans back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restoration {
    pub text: String,
    /// Tokens that were missing from the translated text
    pub unresolved: Vec<String>,
}

impl PlaceholderMap {
    /// Replace every protected span in `markdown`, returning the tokenized
    /// text together with the map needed to undo it.
    pub fn protect(markdown: &str) -> (String, PlaceholderMap) {
        let mut map = PlaceholderMap::default();
        let mut text = markdown.to_string();

        for (category, pattern) in [
            ("CODEBLOCK", &*CODE_BLOCK),
            ("HTML", &*HTML_TAG),
            ("IMAGE", &*IMAGE),
            ("LINK", &*LINK),
            ("INLINECODE", &*INLINE_CODE),
        ] {
            text = pattern
                .replace_all(&text, |caps: &Captures| map.insert(category, &caps[0]))
                .into_owned();
        }

        (text, map)
    }

    fn insert(&mut self, category: &str, original: &str) -> String {
        let token = format!("__{}_{}__", category, self.next_id);
        self.next_id += 1;
        self.entries.push((token.clone(), original.to_string()));
        token
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(token, _)| token.as_str())
    }

    /// Put every original span back in place of its token.
    ///
    /// Tokens are matched literally and restored newest first: a later pass
    /// may have captured text that already held an earlier token (a link
    /// around an HTML tag), so the outer span has to come back before the
    /// inner token can be found. Tokens the backend lost stay reported, and
    /// any token left in the text is kept as is.
    pub fn restore(&self, translated: &str) -> Restoration {
        let mut text = translated.to_string();
        let mut unresolved = Vec::new();

        for (token, original) in self.entries.iter().rev() {
            if text.contains(token.as_str()) {
                text = text.replace(token.as_str(), original);
            } else {
                warn!("Placeholder {} was not found in the translated text", token);
                unresolved.push(token.clone());
            }
        }

        Restoration { text, unresolved }
    }
}
