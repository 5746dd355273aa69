use std::{
    fmt,
    str::FromStr,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::{
    errors::ConfigError,
    models::Side,
};

pub const DEFAULT_MAX_CHARS_PER_FIELD: usize = 800;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_ANKI_CONNECT_URL: &str = "http://localhost:8765";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(ConfigError::InvalidValue {
                key: "provider".to_string(),
                reason: format!("unknown provider '{other}' (expected 'openai' or 'gemini')"),
            }),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Endpoint settings of the selected provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderSettings<'a> {
    pub kind: ProviderKind,
    pub model: &'a str,
    pub endpoint: &'a str,
    pub credential_env: &'a str,
}

/// Per-run configuration. Stored as a flat key/value JSON document; missing
/// keys fall back to [`TranslationConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub provider: ProviderKind,

    pub openai_model: String,
    pub openai_api_base: String,
    pub openai_api_key_env: String,

    pub gemini_model: String,
    pub gemini_api_base: String,
    pub gemini_api_key_env: String,

    pub source_language: String,
    pub target_language: String,

    pub question_source_field: String,
    pub question_target_field: String,
    pub answer_source_field: String,
    pub answer_target_field: String,

    pub translate_question: bool,
    pub translate_answer: bool,

    pub max_chars_per_field: usize,
    pub temperature: f64,
    pub batch_query_default: String,

    pub tag_translated: String,
    pub tag_error: String,

    pub skip_if_target_not_empty: bool,
    pub skip_if_has_translated_tag: bool,

    pub anki_connect_url: String,
    pub request_timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            openai_model: "gpt-4o-mini".to_string(),
            openai_api_base: "https://api.openai.com/v1/chat/completions".to_string(),
            openai_api_key_env: "OPENAI_API_KEY".to_string(),
            gemini_model: "gemini-2.5-flash-lite".to_string(),
            gemini_api_base: "https://generativelanguage.googleapis.com/v1".to_string(),
            gemini_api_key_env: "GEMINI_API_KEY".to_string(),
            source_language: "English".to_string(),
            target_language: "Japanese".to_string(),
            question_source_field: "Front".to_string(),
            question_target_field: "Front_jp".to_string(),
            answer_source_field: "Back".to_string(),
            answer_target_field: "Back_jp".to_string(),
            translate_question: true,
            translate_answer: true,
            max_chars_per_field: DEFAULT_MAX_CHARS_PER_FIELD,
            temperature: DEFAULT_TEMPERATURE,
            batch_query_default: "deck:current".to_string(),
            tag_translated: "AI_Translated".to_string(),
            tag_error: "AI_TranslateError".to_string(),
            skip_if_target_not_empty: true,
            skip_if_has_translated_tag: true,
            anki_connect_url: DEFAULT_ANKI_CONNECT_URL.to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl TranslationConfig {
    pub fn provider_settings(&self) -> ProviderSettings<'_> {
        match self.provider {
            ProviderKind::OpenAi => ProviderSettings {
                kind: ProviderKind::OpenAi,
                model: &self.openai_model,
                endpoint: &self.openai_api_base,
                credential_env: &self.openai_api_key_env,
            },
            ProviderKind::Gemini => ProviderSettings {
                kind: ProviderKind::Gemini,
                model: &self.gemini_model,
                endpoint: &self.gemini_api_base,
                credential_env: &self.gemini_api_key_env,
            },
        }
    }

    pub fn side_enabled(&self, side: Side) -> bool {
        match side {
            Side::Question => self.translate_question,
            Side::Answer => self.translate_answer,
        }
    }

    pub fn source_field(&self, side: Side) -> &str {
        match side {
            Side::Question => &self.question_source_field,
            Side::Answer => &self.answer_source_field,
        }
    }

    pub fn target_field(&self, side: Side) -> &str {
        match side {
            Side::Question => &self.question_target_field,
            Side::Answer => &self.answer_target_field,
        }
    }

    pub fn enabled_sides(&self) -> Vec<Side> {
        Side::ALL.into_iter().filter(|s| self.side_enabled(*s)).collect()
    }

    /// Checks everything that can be decided without looking at a note.
    /// Field names that are set but absent on a note's type are reported
    /// per note at apply time instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let enabled = self.enabled_sides();
        for side in &enabled {
            let source = self.source_field(*side);
            let target = self.target_field(*side);
            if source.trim().is_empty() {
                return Err(ConfigError::InvalidFieldMapping(format!(
                    "{side} source field is empty while translate_{side} is on"
                )));
            }
            if target.trim().is_empty() {
                return Err(ConfigError::InvalidFieldMapping(format!(
                    "{side} target field is empty while translate_{side} is on"
                )));
            }
            if enabled.iter().any(|s| self.source_field(*s) == target) {
                return Err(ConfigError::InvalidFieldMapping(format!(
                    "{side} target field '{target}' is also a source field"
                )));
            }
        }

        if enabled.len() == 2 && self.question_target_field == self.answer_target_field {
            return Err(ConfigError::InvalidFieldMapping(format!(
                "question and answer share the target field '{}'",
                self.question_target_field
            )));
        }

        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature", "must be between 0.0 and 2.0"));
        }

        let settings = self.provider_settings();
        if settings.model.trim().is_empty() {
            return Err(invalid(&format!("{}_model", settings.kind), "must not be empty"));
        }
        if !is_http_url(settings.endpoint) {
            return Err(invalid(
                &format!("{}_api_base", settings.kind),
                "must start with http:// or https://",
            ));
        }
        if settings.credential_env.trim().is_empty() {
            return Err(invalid(&format!("{}_api_key_env", settings.kind), "must not be empty"));
        }
        if !is_http_url(&self.anki_connect_url) {
            return Err(invalid("anki_connect_url", "must start with http:// or https://"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be greater than zero"));
        }

        Ok(())
    }

    /// Sets one key from its textual form. String keys take the text as-is,
    /// other keys parse it as JSON (`true`, `800`, `0.2`).
    pub fn set_key(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let mut document = match serde_json::to_value(&*self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return Err(invalid(key, "config is not representable as a JSON object")),
        };

        let current = document.get(key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let value = match current {
            serde_json::Value::String(_) => serde_json::Value::String(raw.trim().to_string()),
            _ => serde_json::from_str(raw.trim()).map_err(|e| invalid(key, &e.to_string()))?,
        };
        document.insert(key.to_string(), value);

        *self = serde_json::from_value(serde_json::Value::Object(document))
            .map_err(|e| invalid(key, &e.to_string()))?;
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_string(), reason: reason.to_string() }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
