// Translation capabilities and the policy that combines them
//
// - Chunker: newline-aligned splitting for size-limited backends
// - Machine: plain-text translation (Google Translate) chunk by chunk
// - Structured: whole-document translation through a generative model (Gemini)
// - Placeholder: protects Markdown syntax on the plain-text path
// - Policy: picks a path per call and falls back between them

pub mod chunker;
pub mod gemini;
pub mod google;
pub mod machine;
pub mod placeholder;
pub mod policy;
pub mod structured;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use chunker::split_into_chunks;
pub use gemini::GeminiClient;
pub use google::GoogleTranslateClient;
pub use machine::MachineTranslator;
pub use placeholder::{PlaceholderMap, Restoration};
pub use policy::TranslationPolicy;
pub use structured::StructuredTranslator;

use crate::config::TranslateConfig;
use crate::error::Result;

/// Translates one chunk of plain text with no knowledge of Markdown
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkTranslator: Send + Sync {
    async fn translate_chunk(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Free-form prompt completion on a generative-language backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Whole-document translation that keeps Markdown syntax intact
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentTranslator: Send + Sync {
    /// Translate a full Markdown document in a single backend call
    async fn translate_document(&self, markdown: &str, target_language: &str) -> Result<String>;

    /// Translate a short plain description
    async fn translate_description(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Factory wiring the production backends into a policy
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Build the policy; the structured path exists only when a credential is set
    pub fn create_policy(config: &TranslateConfig) -> Result<TranslationPolicy> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let chunks: Arc<dyn ChunkTranslator> = Arc::new(GoogleTranslateClient::new(
            &config.google_endpoint,
            &config.source_language,
            timeout,
        )?);
        let machine = MachineTranslator::new(chunks, config.max_chunk_chars);

        let structured = match config.credential() {
            Some(key) => {
                let generator = GeminiClient::new(
                    &config.gemini_endpoint,
                    &config.gemini_model,
                    key,
                    timeout,
                )?;
                let translator: Arc<dyn DocumentTranslator> =
                    Arc::new(StructuredTranslator::new(Arc::new(generator)));
                Some(translator)
            }
            None => None,
        };

        Ok(TranslationPolicy::new(machine, structured)
            .with_description_requires_credential(config.description_requires_credential))
    }
}
