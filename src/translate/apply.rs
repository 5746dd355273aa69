use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{
    debug,
    warn,
};

use crate::{
    anki::{
        NoteStore,
        NoteStoreError,
    },
    core::{
        NoteId,
        Side,
        TranslationConfig,
        TranslationResult,
    },
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("Field '{0}' does not exist in note type")]
    FieldMissing(String),

    #[error(transparent)]
    NoteStore(#[from] NoteStoreError),
}

/// Writes `result` into the note's target fields and tags it as translated.
///
/// The note's schema is read again right before writing, so a note type
/// edited since filtering fails here instead of being written partially.
/// Every target field is checked before anything is written; a single
/// missing field fails the whole note with no writes.
pub fn apply(
    store: &dyn NoteStore,
    note_id: NoteId,
    result: &TranslationResult,
    config: &TranslationConfig,
) -> Result<(), ApplyError> {
    let note = store.note(note_id)?;

    let mut fields = BTreeMap::new();
    for side in Side::ALL {
        let Some(text) = result.side(side).filter(|_| config.side_enabled(side)) else {
            continue;
        };
        let target = config.target_field(side);
        if !note.has_field(target) {
            return Err(ApplyError::FieldMissing(target.to_string()));
        }
        fields.insert(target.to_string(), text.to_string());
    }

    let error_tag = config.tag_error.to_lowercase();
    let mut tags: Vec<String> = note
        .tags
        .iter()
        .filter(|t| error_tag.is_empty() || t.to_lowercase() != error_tag)
        .cloned()
        .collect();
    if !config.tag_translated.is_empty() && !note.has_tag(&config.tag_translated) {
        tags.push(config.tag_translated.clone());
    }

    debug!(note_id, fields = fields.len(), "Applying translation");
    store.update_note(note_id, &fields, &tags)?;
    Ok(())
}

/// Adds `tag_error` after a failed note. Best effort: a failure here is
/// logged and does not replace the original error.
pub fn mark_failed(store: &dyn NoteStore, note_id: NoteId, config: &TranslationConfig) {
    if config.tag_error.is_empty() {
        return;
    }
    if let Err(e) = store.add_tag(note_id, &config.tag_error) {
        warn!(note_id, "Failed to add error tag: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::memory::{
        bilingual_note,
        MemoryNoteStore,
    };

    fn result(question: &str, answer: &str) -> TranslationResult {
        TranslationResult { question: Some(question.to_string()), answer: Some(answer.to_string()) }
    }

    #[test]
    fn writes_fields_and_tag_together() {
        let store = MemoryNoteStore::new(vec![bilingual_note(1, "Hello", "World")]);
        apply(&store, 1, &result("こんにちは", "世界"), &Default::default()).unwrap();

        let note = store.get(1);
        assert_eq!(note.field("Front_jp"), Some("こんにちは"));
        assert_eq!(note.field("Back_jp"), Some("世界"));
        assert_eq!(note.tags, vec!["AI_Translated"]);
        assert_eq!(store.update_calls(), 1);
    }

    #[test]
    fn missing_answer_target_writes_nothing() {
        let store = MemoryNoteStore::new(vec![bilingual_note(1, "Hello", "World")]);
        store.remove_field(1, "Back_jp");
        let before = store.get(1);

        let err = apply(&store, 1, &result("こんにちは", "世界"), &Default::default()).unwrap_err();
        assert_eq!(err, ApplyError::FieldMissing("Back_jp".to_string()));
        assert_eq!(store.get(1), before);
        assert_eq!(store.update_calls(), 0);
    }

    #[test]
    fn disabled_side_is_not_written() {
        let store = MemoryNoteStore::new(vec![bilingual_note(1, "Hello", "World")]);
        let config = TranslationConfig { translate_answer: false, ..Default::default() };
        apply(&store, 1, &result("こんにちは", "世界"), &config).unwrap();

        assert_eq!(store.get(1).field("Back_jp"), Some(""));
    }

    #[test]
    fn success_clears_a_previous_error_tag() {
        let mut note = bilingual_note(1, "Hello", "World");
        note.tags = vec!["en".to_string(), "AI_TranslateError".to_string()];
        let store = MemoryNoteStore::new(vec![note]);

        apply(&store, 1, &result("こんにちは", "世界"), &Default::default()).unwrap();
        assert_eq!(store.get(1).tags, vec!["en", "AI_Translated"]);
    }

    #[test]
    fn vanished_note_is_a_store_error() {
        let store = MemoryNoteStore::new(Vec::new());
        let err = apply(&store, 9, &result("a", "b"), &Default::default()).unwrap_err();
        assert_eq!(err, ApplyError::NoteStore(NoteStoreError::NotFound(9)));
    }

    #[test]
    fn mark_failed_adds_error_tag_once() {
        let store = MemoryNoteStore::new(vec![bilingual_note(1, "Hello", "World")]);
        mark_failed(&store, 1, &Default::default());
        mark_failed(&store, 1, &Default::default());
        assert_eq!(store.get(1).tags, vec!["AI_TranslateError"]);

        let config = TranslationConfig { tag_error: String::new(), ..Default::default() };
        let store = MemoryNoteStore::new(vec![bilingual_note(2, "Hello", "World")]);
        mark_failed(&store, 2, &config);
        assert!(store.get(2).tags.is_empty());
    }
}
