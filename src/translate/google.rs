use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{LensError, Result};
use super::ChunkTranslator;

/// Google Translate client using the public `translate_a/single` endpoint
pub struct GoogleTranslateClient {
    client: Client,
    endpoint: String,
    source_language: String,
}

impl GoogleTranslateClient {
    pub fn new(endpoint: &str, source_language: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LensError::machine(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            source_language: source_language.to_string(),
        })
    }
}

#[async_trait]
impl ChunkTranslator for GoogleTranslateClient {
    async fn translate_chunk(&self, text: &str, target_language: &str) -> Result<String> {
        debug!("Sending translation request to: {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_language.as_str()),
                ("tl", target_language),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| LensError::machine(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LensError::machine(format!(
                "Translate API error {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LensError::machine(format!("Failed to parse response: {}", e)))?;

        parse_response(&body)
    }
}

/// The response is a nested array; its first element lists sentence entries
/// whose first element is the translated sentence.
fn parse_response(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| LensError::machine("Invalid response: missing sentence array"))?;

    Ok(sentences
        .iter()
        .filter_map(|entry| entry.get(0).and_then(Value::as_str))
        .collect())
}
