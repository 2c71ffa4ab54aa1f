use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

use crate::error::{LensError, Result};
use super::{RenderStrategy, ResourceResolver, escape_attr};

/// Rewrites links and images of a document installed at `base`.
///
/// - web and data images are left alone; local images become resource locators
/// - web links and file links become inert anchors carrying the target in a
///   `data-external-link` / `data-file-link` attribute for the panel script
/// - fragment and `mailto:` links stay as written
/// - other relative links are resolved against `base`
pub struct HostLinkStrategy<'a> {
    base: &'a Path,
    resolver: &'a dyn ResourceResolver,
}

impl<'a> HostLinkStrategy<'a> {
    pub fn new(base: &'a Path, resolver: &'a dyn ResourceResolver) -> Self {
        Self { base, resolver }
    }

    /// Resolve a reference against `base`; returns the file path and any
    /// `?query#fragment` suffix the reference carried.
    fn resolve_local(&self, reference: &str) -> Result<(PathBuf, String)> {
        let base = Url::from_directory_path(self.base).map_err(|_| {
            LensError::Render(format!("Base path is not absolute: {}", self.base.display()))
        })?;
        let mut url = base
            .join(reference)
            .map_err(|e| LensError::Render(format!("Cannot resolve {}: {}", reference, e)))?;

        let mut suffix = String::new();
        if let Some(query) = url.query() {
            suffix.push('?');
            suffix.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            suffix.push('#');
            suffix.push_str(fragment);
        }
        url.set_query(None);
        url.set_fragment(None);

        let path = url
            .to_file_path()
            .map_err(|_| LensError::Render(format!("Not a local path: {}", reference)))?;
        Ok((path, suffix))
    }

    fn locate(&self, reference: &str, keep_suffix: bool) -> Result<String> {
        let (path, suffix) = self.resolve_local(reference)?;
        let locator = self.resolver.resource_locator(&path)?;
        Ok(if keep_suffix { locator + &suffix } else { locator })
    }
}

impl RenderStrategy for HostLinkStrategy<'_> {
    fn render_image(&self, src: &str, title: &str, alt: &str) -> String {
        let mut src = normalize_href(src);

        if !src.is_empty() && !is_web_or_data(&src) {
            match self.locate(&src, false) {
                Ok(locator) => src = locator,
                Err(e) => warn!("Failed to resolve image URI for {}: {}", src, e),
            }
        }

        format!(
            "<img src=\"{}\"{} alt=\"{}\">",
            escape_attr(&src),
            title_attr(title),
            escape_attr(alt)
        )
    }

    fn render_link(&self, href: &str, title: &str, content_html: &str) -> String {
        let href = normalize_href(href);
        let title = title_attr(title);

        if href.starts_with("http:") || href.starts_with("https:") {
            return format!(
                "<a href=\"#\" data-external-link=\"{}\"{}>{}</a>",
                escape_attr(&href),
                title,
                content_html
            );
        }
        if href.starts_with("file:") || Path::new(&href).is_absolute() {
            return format!(
                "<a href=\"#\" data-file-link=\"{}\"{}>{}</a>",
                escape_attr(&href),
                title,
                content_html
            );
        }
        if href.starts_with('#') || href.starts_with("mailto:") {
            return format!("<a href=\"{}\"{}>{}</a>", escape_attr(&href), title, content_html);
        }
        if has_other_scheme(&href) {
            debug!("Leaving link with unsupported scheme inert: {}", href);
            return format!("<a href=\"#\"{}>{}</a>", title, content_html);
        }

        let target = match self.locate(&href, true) {
            Ok(locator) => locator,
            Err(e) => {
                warn!("Failed to resolve link URI for {}: {}", href, e);
                href
            }
        };
        format!("<a href=\"{}\"{}>{}</a>", escape_attr(&target), title, content_html)
    }
}

/// Strip wrapping `<>`, `"` or `'` and embedded line breaks from a reference
pub fn normalize_href(href: &str) -> String {
    let mut s = href.trim();
    for (open, close) in [('<', '>'), ('"', '"'), ('\'', '\'')] {
        if s.len() >= 2 && s.starts_with(open) && s.ends_with(close) {
            s = &s[1..s.len() - 1];
            break;
        }
    }
    s.replace(['\r', '\n'], "")
}

/// An absolute URL whose scheme the panel cannot open (`vscode:`, `ftp:`, ...)
fn has_other_scheme(href: &str) -> bool {
    match Url::parse(href) {
        Ok(url) => !matches!(url.scheme(), "http" | "https" | "file" | "mailto"),
        Err(_) => false,
    }
}

fn is_web_or_data(src: &str) -> bool {
    src.starts_with("https:") || src.starts_with("http:") || src.starts_with("data:")
}

fn title_attr(title: &str) -> String {
    if title.is_empty() {
        String::new()
    } else {
        format!(" title=\"{}\"", escape_attr(title))
    }
}
