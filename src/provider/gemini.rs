use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::{
    check_status,
    transport_error,
    CompletionOptions,
    CompletionProvider,
    Credential,
    ProviderError,
};
use crate::core::ProviderKind;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini `generateContent`. The base may point at `v1` or `v1beta`.
pub struct GeminiProvider {
    client: Client,
    base: String,
    credential: Credential,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiProvider {
    pub fn new(client: Client, base: &str, credential: Credential) -> Self {
        Self { client, base: base.trim_end_matches('/').to_string(), credential }
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base, model)
    }

    fn shape_error(&self, detail: impl Into<String>) -> ProviderError {
        ProviderError::Request { provider: ProviderKind::Gemini, detail: detail.into() }
    }
}

impl CompletionProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions<'_>,
    ) -> Result<String, ProviderError> {
        // Only the fields below; Gemini rejects unknown response_* settings on v1.
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": options.temperature },
        });

        debug!(model = options.model, "Gemini generateContent");
        let resp = self
            .client
            .post(self.url(options.model))
            .header(API_KEY_HEADER, self.credential.expose())
            .json(&body)
            .send()
            .map_err(|e| transport_error(ProviderKind::Gemini, &self.credential, e))?;
        let resp = check_status(ProviderKind::Gemini, &self.credential, resp)?;

        let parsed: GenerateResponse = resp
            .json()
            .map_err(|e| self.shape_error(format!("unreadable response: {}", e.without_url())))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!(" (blocked: {r})"))
                .unwrap_or_default();
            return Err(self.shape_error(format!("no candidates in response{reason}")));
        };

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        if parts.is_empty() {
            return Err(self.shape_error("no content parts in response"));
        }
        Ok(parts.into_iter().filter_map(|p| p.text).collect())
    }
}
