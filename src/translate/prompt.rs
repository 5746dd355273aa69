use crate::core::{
    TranslationConfig,
    TranslationRequest,
};

/// Builds the user prompt for one note. Only the sides present in `request`
/// are embedded.
pub fn build_prompt(request: &TranslationRequest, config: &TranslationConfig) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let source = format!("Source language: {}", config.source_language);
    let target = format!("Target language: {}", config.target_language);
    parts.push(&source);
    parts.push(&target);
    parts.push("Translate the following Anki card fields.");
    parts.push("Return ONLY a JSON object in this format:");
    parts.push(r#"{"question": "...", "answer": "..."}"#);
    parts.push("Include only the keys for the fields given below.");
    parts.push("No extra commentary, no markdown, no HTML.");
    parts.push("");

    if let Some(question) = request.question.as_deref() {
        parts.push("Original QUESTION:");
        parts.push(question);
        parts.push("");
    }
    if let Some(answer) = request.answer.as_deref() {
        parts.push("Original ANSWER:");
        parts.push(answer);
    }

    parts.join("\n").trim_end().to_string()
}
