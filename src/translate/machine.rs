use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use super::{ChunkTranslator, chunker::split_into_chunks};

/// Plain-text translation: chunk, translate each chunk in order, rejoin
#[derive(Clone)]
pub struct MachineTranslator {
    backend: Arc<dyn ChunkTranslator>,
    max_chunk_chars: usize,
}

impl MachineTranslator {
    pub fn new(backend: Arc<dyn ChunkTranslator>, max_chunk_chars: usize) -> Self {
        Self {
            backend,
            max_chunk_chars,
        }
    }

    /// Translate `text`, returning blank input untouched. Blank chunks are
    /// kept as they are and never sent to the backend.
    ///
    /// Chunks are sent one at a time; the first backend fault aborts the
    /// whole call and is returned to the caller.
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let chunks = split_into_chunks(text, self.max_chunk_chars);
        info!(
            "Machine translating {} characters in {} chunk(s) to {}",
            text.chars().count(),
            chunks.len(),
            target_language
        );

        let mut translated = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                translated.push(chunk.clone());
                continue;
            }
            debug!("Translating chunk {}/{} ({} chars)", idx + 1, chunks.len(), chunk.chars().count());
            translated.push(self.backend.translate_chunk(chunk, target_language).await?);
        }

        Ok(translated.join("\n"))
    }
}
