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

const SYSTEM_PROMPT: &str = "You are a precise bilingual translator for Anki flashcards. \
     Preserve technical and medical terminology. \
     Use plain text only (no markdown or HTML).";

/// OpenAI-compatible chat completions endpoint.
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    credential: Credential,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(client: Client, endpoint: &str, credential: Credential) -> Self {
        Self { client, endpoint: endpoint.to_string(), credential }
    }

    fn shape_error(&self, detail: impl Into<String>) -> ProviderError {
        ProviderError::Request { provider: ProviderKind::OpenAi, detail: detail.into() }
    }
}

impl CompletionProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions<'_>,
    ) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": options.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": options.temperature,
            "response_format": { "type": "json_object" },
        });

        debug!(model = options.model, "OpenAI chat completion");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.credential.expose())
            .json(&body)
            .send()
            .map_err(|e| transport_error(ProviderKind::OpenAi, &self.credential, e))?;
        let resp = check_status(ProviderKind::OpenAi, &self.credential, resp)?;

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| self.shape_error(format!("unreadable response: {}", e.without_url())))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| self.shape_error("response contained no choices"))
    }
}
