use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Backend, LensError, Result};
use super::{DocumentTranslator, MachineTranslator, PlaceholderMap};

/// Chooses between structured and plain-text translation for each call.
///
/// With a structured translator configured, documents go through it first
/// and fall back to the placeholder-protected plain-text path when its
/// backend fails. Without one, the plain-text path is used directly.
#[derive(Clone)]
pub struct TranslationPolicy {
    machine: MachineTranslator,
    structured: Option<Arc<dyn DocumentTranslator>>,
    description_requires_credential: bool,
}

impl TranslationPolicy {
    pub fn new(machine: MachineTranslator, structured: Option<Arc<dyn DocumentTranslator>>) -> Self {
        Self {
            machine,
            structured,
            description_requires_credential: false,
        }
    }

    /// Make description translation fail instead of using the plain-text
    /// backend when no structured translator is configured
    pub fn with_description_requires_credential(mut self, required: bool) -> Self {
        self.description_requires_credential = required;
        self
    }

    pub fn has_structured(&self) -> bool {
        self.structured.is_some()
    }

    /// Translate a Markdown document.
    ///
    /// Plain-text backend faults are not errors here: the document comes
    /// back untranslated.
    pub async fn translate_markdown(&self, markdown: &str, target_language: &str) -> Result<String> {
        if markdown.trim().is_empty() {
            return Ok(markdown.to_string());
        }

        if let Some(structured) = &self.structured {
            match structured.translate_document(markdown, target_language).await {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_backend(Backend::Generative) => {
                    warn!("Structured translation failed, falling back to placeholder method: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        self.translate_with_placeholders(markdown, target_language).await
    }

    /// Plain-text translation with Markdown syntax shielded by placeholders
    pub async fn translate_with_placeholders(
        &self,
        markdown: &str,
        target_language: &str,
    ) -> Result<String> {
        let (tokenized, map) = PlaceholderMap::protect(markdown);
        info!("Protected {} Markdown span(s) before machine translation", map.len());

        let translated = match self.machine.translate(&tokenized, target_language).await {
            Ok(translated) => translated,
            Err(e) if e.is_backend(Backend::Machine) => {
                warn!("Machine translation failed, keeping the original text: {}", e);
                return Ok(markdown.to_string());
            }
            Err(e) => return Err(e),
        };

        let restoration = map.restore(&translated);
        if !restoration.unresolved.is_empty() {
            warn!(
                "{} placeholder(s) could not be restored: {}",
                restoration.unresolved.len(),
                restoration.unresolved.join(", ")
            );
        }

        Ok(restoration.text)
    }

    /// Translate a short description.
    ///
    /// Unlike documents, a plain-text backend fault is returned to the caller.
    pub async fn translate_description(&self, text: &str, target_language: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        match &self.structured {
            Some(structured) => match structured.translate_description(text, target_language).await {
                Ok(translated) => return Ok(translated),
                Err(e) => {
                    warn!("Structured description translation failed, using machine translation: {}", e);
                }
            },
            None if self.description_requires_credential => {
                return Err(LensError::Config(
                    "Description translation requires a Gemini API key".to_string(),
                ));
            }
            None => {}
        }

        self.machine.translate(text, target_language).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{MockChunkTranslator, MockDocumentTranslator};

    fn identity_machine() -> MachineTranslator {
        let mut backend = MockChunkTranslator::new();
        backend
            .expect_translate_chunk()
            .returning(|text, _| Ok(text.to_string()));
        MachineTranslator::new(Arc::new(backend), 3800)
    }

    fn fixed_machine(output: &'static str) -> MachineTranslator {
        let mut backend = MockChunkTranslator::new();
        backend
            .expect_translate_chunk()
            .returning(move |_, _| Ok(output.to_string()));
        MachineTranslator::new(Arc::new(backend), 3800)
    }

    fn failing_machine() -> MachineTranslator {
        let mut backend = MockChunkTranslator::new();
        backend
            .expect_translate_chunk()
            .returning(|_, _| Err(LensError::machine("fail")));
        MachineTranslator::new(Arc::new(backend), 3800)
    }

    fn unused_machine() -> MachineTranslator {
        let mut backend = MockChunkTranslator::new();
        backend.expect_translate_chunk().never();
        MachineTranslator::new(Arc::new(backend), 3800)
    }

    #[tokio::test]
    async fn test_structured_output_is_returned_verbatim() {
        let mut structured = MockDocumentTranslator::new();
        structured
            .expect_translate_document()
            .times(1)
            .returning(|_, _| Ok("文章".to_string()));
        let policy = TranslationPolicy::new(unused_machine(), Some(Arc::new(structured)));

        assert_eq!(policy.translate_markdown("text", "ja").await.unwrap(), "文章");
    }

    #[tokio::test]
    async fn test_structured_fault_falls_back_once() {
        let mut structured = MockDocumentTranslator::new();
        structured
            .expect_translate_document()
            .times(1)
            .returning(|_, _| Err(LensError::generative("fail")));
        let policy = TranslationPolicy::new(fixed_machine("文章"), Some(Arc::new(structured)));

        assert_eq!(policy.translate_markdown("text", "ja").await.unwrap(), "文章");
    }

    #[tokio::test]
    async fn test_fallback_output_matches_placeholder_path() {
        let input = "Use `cargo build` and see [docs](docs/README.md).";

        let mut structured = MockDocumentTranslator::new();
        structured
            .expect_translate_document()
            .returning(|_, _| Err(LensError::generative("quota")));
        let with_fallback = TranslationPolicy::new(identity_machine(), Some(Arc::new(structured)));
        let direct = TranslationPolicy::new(identity_machine(), None);

        assert_eq!(
            with_fallback.translate_markdown(input, "ja").await.unwrap(),
            direct.translate_with_placeholders(input, "ja").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_non_backend_error_is_not_masked() {
        let mut structured = MockDocumentTranslator::new();
        structured
            .expect_translate_document()
            .returning(|_, _| Err(LensError::Config("broken".to_string())));
        let policy = TranslationPolicy::new(unused_machine(), Some(Arc::new(structured)));

        let err = policy.translate_markdown("text", "ja").await.unwrap_err();
        assert!(matches!(err, LensError::Config(_)));
    }

    #[tokio::test]
    async fn test_without_credential_uses_placeholder_path() {
        let policy = TranslationPolicy::new(fixed_machine("文章"), None);
        assert_eq!(policy.translate_markdown("text", "ja").await.unwrap(), "文章");
    }

    #[tokio::test]
    async fn test_machine_fault_returns_original_document() {
        let input = "# Title\n\n`code` and text";
        let policy = TranslationPolicy::new(failing_machine(), None);
        assert_eq!(policy.translate_markdown(input, "ja").await.unwrap(), input);
    }

    #[tokio::test]
    async fn test_blank_document_invokes_nothing() {
        let mut structured = MockDocumentTranslator::new();
        structured.expect_translate_document().never();
        let policy = TranslationPolicy::new(unused_machine(), Some(Arc::new(structured)));

        assert_eq!(policy.translate_markdown("", "ja").await.unwrap(), "");
        assert_eq!(policy.translate_markdown(" \n ", "ja").await.unwrap(), " \n ");
    }

    #[tokio::test]
    async fn test_identity_translation_keeps_protected_spans() {
        let input = "# Heading\n\nNormal text\n\n```js\nconsole.log(\"hello\");\n```\n\nInline: `const a = 1;`\n\nTrailing text";
        let policy = TranslationPolicy::new(identity_machine(), None);

        let result = policy.translate_markdown(input, "ja").await.unwrap();
        assert!(result.contains("```js\nconsole.log(\"hello\");\n```"));
        assert!(result.contains("`const a = 1;`"));
    }

    #[tokio::test]
    async fn test_machine_only_sees_tokens() {
        let mut backend = MockChunkTranslator::new();
        backend
            .expect_translate_chunk()
            .withf(|text: &str, _: &str| text == "See __LINK_0__ for __INLINECODE_1__")
            .times(1)
            .returning(|_, _| Ok("__INLINECODE_1__ については __LINK_0__ を参照".to_string()));
        let policy = TranslationPolicy::new(MachineTranslator::new(Arc::new(backend), 3800), None);

        let result = policy
            .translate_markdown("See [guide](guide.md) for `init`", "ja")
            .await
            .unwrap();
        assert_eq!(result, "`init` については [guide](guide.md) を参照");
    }

    #[tokio::test]
    async fn test_description_prefers_structured() {
        let mut structured = MockDocumentTranslator::new();
        structured
            .expect_translate_description()
            .times(1)
            .returning(|_, _| Ok("説明文".to_string()));
        let policy = TranslationPolicy::new(unused_machine(), Some(Arc::new(structured)));

        assert_eq!(policy.translate_description("desc", "ja").await.unwrap(), "説明文");
    }

    #[tokio::test]
    async fn test_description_falls_back_to_machine() {
        let mut structured = MockDocumentTranslator::new();
        structured
            .expect_translate_description()
            .times(1)
            .returning(|_, _| Err(LensError::generative("fail")));
        let policy = TranslationPolicy::new(fixed_machine("説明"), Some(Arc::new(structured)));

        assert_eq!(policy.translate_description("desc", "ja").await.unwrap(), "説明");
    }

    #[tokio::test]
    async fn test_description_without_credential_uses_machine() {
        let policy = TranslationPolicy::new(fixed_machine("説明"), None);
        assert_eq!(policy.translate_description("desc", "ja").await.unwrap(), "説明");
    }

    #[tokio::test]
    async fn test_description_machine_fault_is_returned() {
        let policy = TranslationPolicy::new(failing_machine(), None);
        let err = policy.translate_description("desc", "ja").await.unwrap_err();
        assert!(err.is_backend(Backend::Machine));
    }

    #[tokio::test]
    async fn test_description_strict_mode_requires_credential() {
        let policy =
            TranslationPolicy::new(unused_machine(), None).with_description_requires_credential(true);
        let err = policy.translate_description("desc", "ja").await.unwrap_err();
        assert!(matches!(err, LensError::Config(_)));
    }

    #[tokio::test]
    async fn test_blank_description_is_empty() {
        let policy = TranslationPolicy::new(unused_machine(), None);
        assert_eq!(policy.translate_description("  ", "ja").await.unwrap(), "");
    }
}
