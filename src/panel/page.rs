use chrono::Local;
use uuid::Uuid;

use crate::host::ExtensionInfo;
use crate::render::escape_attr;
use super::RenderedPair;

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; margin: 20px; color: #1f2328; background: #ffffff; }
.header { display: flex; align-items: center; margin-bottom: 20px; padding-bottom: 10px; border-bottom: 1px solid #d0d7de; }
.header img { width: 48px; height: 48px; margin-right: 15px; }
.header-info h1 { margin: 0 0 5px 0; font-size: 1.5em; }
.header-info p { margin: 0; opacity: 0.8; }
.description { margin-bottom: 20px; padding: 15px; background: #f6f8fa; border-radius: 5px; }
.documents { display: flex; gap: 24px; align-items: flex-start; }
.documents section { flex: 1 1 0; min-width: 0; }
.documents h2 { font-size: 1.1em; opacity: 0.7; border-bottom: 1px solid #d0d7de; }
pre { background: #f6f8fa; padding: 10px; border-radius: 5px; overflow-x: auto; }
code { font-family: 'SF Mono', Monaco, Menlo, Consolas, 'Ubuntu Mono', monospace; }
img { max-width: 100%; }
table { border-collapse: collapse; width: 100%; margin: 15px 0; }
th, td { border: 1px solid #d0d7de; padding: 8px; text-align: left; }
th { background: #f6f8fa; }
footer { margin-top: 30px; font-size: 0.8em; opacity: 0.6; }
@media (max-width: 900px) { .documents { flex-direction: column; } }
"#;

const SCRIPT: &str = r#"
async function post(message, fallback) {
  try {
    const response = await fetch('/message', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(message),
    });
    if (!response.ok) {
      console.error('Panel message failed', response.status, await response.text());
    }
  } catch (e) {
    window.open(fallback, '_blank', 'noopener');
  }
}

document.addEventListener('click', (e) => {
  const target = e.target.closest('a');
  if (!target) return;
  const href = target.getAttribute('data-external-link');
  const filePath = target.getAttribute('data-file-link');
  if (href) {
    e.preventDefault();
    post({ command: 'openExternal', href }, href);
  } else if (filePath) {
    e.preventDefault();
    const fallback = filePath.startsWith('file:') ? filePath : 'file://' + filePath;
    post({ command: 'openFile', path: filePath }, fallback);
  }
});
"#;

/// A complete HTML page for one translated extension
#[derive(Debug, Clone)]
pub struct PanelPage {
    nonce: String,
    html: String,
}

impl PanelPage {
    /// Assemble the page. `icon_src` is an already resolved locator.
    pub fn build(
        extension: &ExtensionInfo,
        icon_src: Option<&str>,
        pair: &RenderedPair,
        target_language: &str,
    ) -> Self {
        let nonce = Uuid::new_v4().simple().to_string();

        let icon = icon_src
            .map(|src| format!("<img src=\"{}\" alt=\"Extension Icon\">", escape_attr(src)))
            .unwrap_or_default();
        let description = match extension.description_text().trim() {
            "" => "No description".to_string(),
            text => escape_attr(text),
        };
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S");

        let html = format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="UTF-8">
<meta http-equiv="Content-Security-Policy" content="default-src 'none'; img-src 'self' https: data: file:; style-src 'unsafe-inline'; script-src 'nonce-{nonce}'; connect-src 'self';">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{label} - README</title>
<style>{style}</style>
</head>
<body>
<div class="header">
{icon}
<div class="header-info">
<h1>{label}</h1>
<p>Version: {version}</p>
</div>
</div>
<div class="description">
<h3>Description</h3>
<p><strong>Original:</strong> {description}</p>
<p><strong>Translation:</strong> {translated_description}</p>
</div>
<div class="documents">
<section id="translated">
<h2>Translation ({lang})</h2>
<div class="markdown-body">{translated}</div>
</section>
<section id="original">
<h2>Original</h2>
<div class="markdown-body">{original}</div>
</section>
</div>
<footer>{id} &middot; generated {generated}</footer>
<script nonce="{nonce}">{script}</script>
</body>
</html>
"#,
            lang = escape_attr(target_language),
            nonce = nonce,
            label = escape_attr(extension.label()),
            style = STYLE,
            icon = icon,
            version = escape_attr(&extension.version),
            description = description,
            translated_description = escape_attr(&pair.translated_description),
            translated = pair.translated_html,
            original = pair.original_html,
            id = escape_attr(&extension.id),
            generated = generated,
            script = SCRIPT,
        );

        Self { nonce, html }
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}
