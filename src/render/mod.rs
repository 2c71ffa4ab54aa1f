// Markdown to HTML conversion with pluggable link and image markup
//
// - Links: HostLinkStrategy, which points local references at resources the
//   panel can serve and turns outbound links into click-interceptable anchors

pub mod links;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::path::Path;

pub use links::HostLinkStrategy;

use crate::error::Result;

/// Markup for the two Markdown constructs that need host awareness
pub trait RenderStrategy {
    /// `<img>` markup for an image reference
    fn render_image(&self, src: &str, title: &str, alt: &str) -> String;

    /// Anchor markup around already-rendered link content
    fn render_link(&self, href: &str, title: &str, content_html: &str) -> String;
}

/// Turns a local file path into a locator the display surface can load
pub trait ResourceResolver: Send + Sync {
    fn resource_locator(&self, path: &Path) -> Result<String>;
}

/// A link or image whose closing event has not been seen yet
enum Pending<'a> {
    Link {
        dest: CowStr<'a>,
        title: CowStr<'a>,
        inner: Vec<Event<'a>>,
    },
    Image {
        dest: CowStr<'a>,
        title: CowStr<'a>,
        alt: String,
    },
}

pub struct DocumentRenderer<S> {
    strategy: S,
    options: Options,
}

impl<S: RenderStrategy> DocumentRenderer<S> {
    pub fn new(strategy: S) -> Self {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES;
        Self { strategy, options }
    }

    /// Render Markdown to HTML, delegating links and images to the strategy.
    ///
    /// Link content is rendered first so that images nested inside links
    /// (badges) go through the strategy as well.
    pub fn render(&self, markdown: &str) -> String {
        let mut events = Vec::new();
        let mut stack = Vec::new();

        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Start(Tag::Link { dest_url, title, .. }) => stack.push(Pending::Link {
                    dest: dest_url,
                    title,
                    inner: Vec::new(),
                }),
                Event::Start(Tag::Image { dest_url, title, .. }) => stack.push(Pending::Image {
                    dest: dest_url,
                    title,
                    alt: String::new(),
                }),
                Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                    let markup = match stack.pop() {
                        Some(Pending::Link { dest, title, inner }) => {
                            let mut content = String::new();
                            html::push_html(&mut content, inner.into_iter());
                            self.strategy.render_link(&dest, &title, &content)
                        }
                        Some(Pending::Image { dest, title, alt }) => {
                            self.strategy.render_image(&dest, &title, &alt)
                        }
                        None => continue,
                    };
                    emit(&mut stack, &mut events, Event::InlineHtml(markup.into()));
                }
                other => emit(&mut stack, &mut events, other),
            }
        }

        let mut output = String::new();
        html::push_html(&mut output, events.into_iter());
        output
    }
}

fn emit<'a>(stack: &mut [Pending<'a>], events: &mut Vec<Event<'a>>, event: Event<'a>) {
    match stack.last_mut() {
        Some(Pending::Link { inner, .. }) => inner.push(event),
        Some(Pending::Image { alt, .. }) => match event {
            Event::Text(text) | Event::Code(text) => alt.push_str(&text),
            Event::SoftBreak | Event::HardBreak => alt.push(' '),
            _ => {}
        },
        None => events.push(event),
    }
}

/// Escape a value for use inside a quoted HTML attribute or text node
pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Marks every link and image so the event plumbing is visible
    struct Tagging;

    impl RenderStrategy for Tagging {
        fn render_image(&self, src: &str, title: &str, alt: &str) -> String {
            format!("[img {}|{}|{}]", src, title, alt)
        }

        fn render_link(&self, href: &str, title: &str, content_html: &str) -> String {
            format!("[a {}|{}|{}]", href, title, content_html)
        }
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(
            escape_attr(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_attr("plain"), "plain");
    }

    #[test]
    fn test_links_and_images_go_through_strategy() {
        let renderer = DocumentRenderer::new(Tagging);
        let html = renderer.render("See [the *docs*](d.md \"Docs\") and ![a `b` c](i.png)");
        assert_eq!(
            html,
            "<p>See [a d.md|Docs|the <em>docs</em>] and [img i.png||a b c]</p>\n"
        );
    }

    #[test]
    fn test_image_inside_link() {
        let renderer = DocumentRenderer::new(Tagging);
        let html = renderer.render("[![build](badge.svg)](https://ci.example)");
        assert_eq!(
            html,
            "<p>[a https://ci.example||[img badge.svg||build]]</p>\n"
        );
    }

    #[test]
    fn test_other_markdown_is_rendered_normally() {
        let renderer = DocumentRenderer::new(Tagging);
        let html = renderer.render("# Title\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n```rust\nlet x = 1;\n```\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<table>"));
        assert!(html.contains("<code class=\"language-rust\">let x = 1;\n</code>"));
    }
}
