use async_trait::async_trait;
use isolang::Language;
use std::sync::Arc;
use tracing::info;

use crate::error::{Backend, LensError, Result};
use super::{DocumentTranslator, TextGenerator};

/// Translates whole Markdown documents through a generative model, telling
/// it which parts of the syntax must survive verbatim.
pub struct StructuredTranslator {
    generator: Arc<dyn TextGenerator>,
}

impl StructuredTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Build the prompt for a full Markdown document
    pub fn document_prompt(markdown: &str, target_language: &str) -> String {
        let language = language_name(target_language);
        format!(
            r#"Translate the following Markdown text into natural, high-quality {language}.
Never translate or change the contents of code blocks (```), inline code (`), URLs, file paths, or HTML tags.
Keep the Markdown structure (headings, lists, links, images, tables) exactly as it is.
Return only the translated Markdown.

---
{markdown}
---
"#
        )
    }

    /// Build the prompt for a short plain description
    pub fn description_prompt(text: &str, target_language: &str) -> String {
        format!(
            "Translate the following text into natural-sounding {}:\n\n{}",
            language_name(target_language),
            text
        )
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generator.generate(prompt).await.map_err(|e| match e {
            e @ LensError::Backend { backend: Backend::Generative, .. } => e,
            other => LensError::generative(other.to_string()),
        })
    }
}

#[async_trait]
impl DocumentTranslator for StructuredTranslator {
    async fn translate_document(&self, markdown: &str, target_language: &str) -> Result<String> {
        if markdown.trim().is_empty() {
            return Ok(markdown.to_string());
        }

        info!(
            "Structured translation of {} characters to {}",
            markdown.chars().count(),
            target_language
        );
        self.generate(&Self::document_prompt(markdown, target_language)).await
    }

    async fn translate_description(&self, text: &str, target_language: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let translated = self
            .generate(&Self::description_prompt(text, target_language))
            .await?;
        Ok(translated.trim().to_string())
    }
}

/// English name for an ISO 639-1 code, or the code itself when unknown
pub fn language_name(code: &str) -> String {
    let primary = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();
    Language::from_639_1(&primary)
        .map(|lang| lang.to_name().to_string())
        .unwrap_or_else(|| code.to_string())
}
