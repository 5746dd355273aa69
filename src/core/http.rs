use std::time::Duration;

use reqwest::{
    blocking::{
        Client,
        Response,
    },
    header::USER_AGENT,
};

use crate::core::TranslatorError;

const CLIENT_USER_AGENT: &str = concat!("anki-ai-translator/", env!("CARGO_PKG_VERSION"));

pub fn http_client(timeout: Duration) -> Result<Client, TranslatorError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(USER_AGENT, reqwest::header::HeaderValue::from_static(CLIENT_USER_AGENT));

    Client::builder().timeout(timeout).default_headers(headers).build().map_err(Into::into)
}

/// Reads the whole body of a failed response for error reporting. Callers
/// scrub secrets from it before bounding it with [`truncate_chars`].
pub fn body_text(resp: Response) -> String {
    match resp.text() {
        Ok(body) => body.trim().to_string(),
        Err(_) => String::new(),
    }
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
