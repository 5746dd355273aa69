//! Completion providers.
//!
//! Every backend satisfies [`CompletionProvider`]: one prompt in, the model's
//! raw text out. Which backend is used is decided by
//! [`TranslationConfig::provider`]; nothing downstream knows the difference.

use std::fmt;

use reqwest::{
    blocking::{
        Client,
        Response,
    },
    StatusCode,
};
use thiserror::Error;

use crate::core::{
    http::{
        body_text,
        truncate_chars,
    },
    ConfigError,
    ProviderKind,
    TranslationConfig,
};

pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions<'a> {
    pub model: &'a str,
    pub temperature: f64,
}

pub trait CompletionProvider {
    fn kind(&self) -> ProviderKind;

    fn complete(&self, prompt: &str, options: &CompletionOptions<'_>)
        -> Result<String, ProviderError>;
}

/// Per-call failures. Messages never contain the credential.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{provider} rejected the credential (HTTP {status}): {detail}")]
    Auth { provider: ProviderKind, status: u16, detail: String },

    #[error("{provider} is rate limiting requests: {detail}")]
    RateLimited { provider: ProviderKind, detail: String },

    #[error("{provider} request failed: {detail}")]
    Request { provider: ProviderKind, detail: String },
}

/// API key read from the environment variable named in the config.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn from_env(kind: ProviderKind, env_var: &str) -> Result<Self, ConfigError> {
        Self::resolve(kind, env_var, |name| std::env::var(name).ok())
    }

    pub fn resolve(
        kind: ProviderKind,
        env_var: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        match lookup(env_var) {
            Some(value) if !value.trim().is_empty() => Ok(Self(value.trim().to_string())),
            _ => Err(ConfigError::MissingCredential {
                provider: kind.as_str(),
                env_var: env_var.to_string(),
            }),
        }
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    /// Masks every occurrence of the key in `text`.
    pub fn redact(&self, text: &str) -> String {
        text.replace(&self.0, "***")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Builds the backend selected by `config`.
pub fn build_provider(
    config: &TranslationConfig,
    credential: Credential,
    client: Client,
) -> Box<dyn CompletionProvider> {
    let settings = config.provider_settings();
    match settings.kind {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(client, settings.endpoint, credential)),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(client, settings.endpoint, credential)),
    }
}

pub(crate) fn transport_error(
    provider: ProviderKind,
    credential: &Credential,
    error: reqwest::Error,
) -> ProviderError {
    ProviderError::Request { provider, detail: credential.redact(&error.without_url().to_string()) }
}

/// Maps non-2xx statuses onto the error taxonomy; successful responses pass through.
pub(crate) fn check_status(
    provider: ProviderKind,
    credential: &Credential,
    resp: Response,
) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let detail = truncate_chars(&credential.redact(&body_text(resp)), ERROR_BODY_LIMIT);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Auth { provider, status: status.as_u16(), detail }
        }
        // Gemini answers an invalid key with 400 rather than 401.
        StatusCode::BAD_REQUEST if detail.contains("API_KEY_INVALID") => {
            ProviderError::Auth { provider, status: status.as_u16(), detail }
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { provider, detail },
        _ => ProviderError::Request { provider, detail: format!("HTTP {status}: {detail}") },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_credential_is_a_config_error() {
        let err = Credential::resolve(ProviderKind::OpenAi, "OPENAI_API_KEY", |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let blank = Credential::resolve(ProviderKind::Gemini, "K", |_| Some("  ".to_string()));
        assert!(blank.is_err());
    }

    #[test]
    fn credential_never_prints() {
        let credential =
            Credential::resolve(ProviderKind::OpenAi, "K", |_| Some("sk-secret".to_string()))
                .unwrap();
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert_eq!(credential.redact("bad key sk-secret given"), "bad key *** given");
    }

    #[test]
    fn builds_the_configured_backend() {
        let credential =
            Credential::resolve(ProviderKind::Gemini, "K", |_| Some("key".to_string())).unwrap();
        let config = TranslationConfig { provider: ProviderKind::Gemini, ..Default::default() };
        let provider = build_provider(&config, credential, Client::new());
        assert_eq!(provider.kind(), ProviderKind::Gemini);
    }
}
