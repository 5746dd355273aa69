use std::fmt;

use crate::core::{
    Note,
    NoteId,
    Side,
    TranslationConfig,
    TranslationRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    AlreadyTagged,
    TargetNotEmpty,
    NoEligibleField,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::AlreadyTagged => "already tagged as translated",
            SkipReason::TargetNotEmpty => "target field is not empty",
            SkipReason::NoEligibleField => "no field to translate",
        })
    }
}

/// Why an enabled side was left out of a note's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideExclusion {
    Empty,
    TooLong { chars: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EligibleNote {
    pub note: Note,
    pub request: TranslationRequest,
    pub excluded: Vec<(Side, SideExclusion)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedNote {
    pub note_id: NoteId,
    pub reason: SkipReason,
    pub excluded: Vec<(Side, SideExclusion)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub eligible: Vec<EligibleNote>,
    pub skipped: Vec<SkippedNote>,
}

impl Partition {
    /// Enabled sides dropped for exceeding `max_chars_per_field`.
    pub fn sides_too_long(&self) -> usize {
        let eligible = self.eligible.iter().flat_map(|n| n.excluded.iter());
        let skipped = self.skipped.iter().flat_map(|n| n.excluded.iter());
        eligible.chain(skipped).filter(|(_, e)| matches!(e, SideExclusion::TooLong { .. })).count()
    }
}

pub enum Decision {
    Eligible(EligibleNote),
    Skipped(SkippedNote),
}

fn target_has_content(note: &Note, field: &str) -> bool {
    note.field(field).is_some_and(|value| !value.trim().is_empty())
}

/// Applies the skip rules to one note. First matching rule wins.
pub fn classify(note: Note, config: &TranslationConfig) -> Decision {
    let skipped = |note: &Note, reason: SkipReason, excluded: Vec<(Side, SideExclusion)>| {
        Decision::Skipped(SkippedNote { note_id: note.id, reason, excluded })
    };

    if config.skip_if_has_translated_tag && note.has_tag(&config.tag_translated) {
        return skipped(&note, SkipReason::AlreadyTagged, Vec::new());
    }

    if config.skip_if_target_not_empty
        && Side::ALL.iter().any(|side| target_has_content(&note, config.target_field(*side)))
    {
        return skipped(&note, SkipReason::TargetNotEmpty, Vec::new());
    }

    let mut request = TranslationRequest { note_id: note.id, question: None, answer: None };
    let mut excluded = Vec::new();
    for side in config.enabled_sides() {
        let text = note.field(config.source_field(side)).filter(|t| !t.trim().is_empty());
        let Some(text) = text else {
            excluded.push((side, SideExclusion::Empty));
            continue;
        };

        let chars = text.chars().count();
        if chars > config.max_chars_per_field {
            excluded.push((side, SideExclusion::TooLong { chars }));
            continue;
        }

        match side {
            Side::Question => request.question = Some(text.to_string()),
            Side::Answer => request.answer = Some(text.to_string()),
        }
    }

    if request.question.is_none() && request.answer.is_none() {
        return skipped(&note, SkipReason::NoEligibleField, excluded);
    }
    Decision::Eligible(EligibleNote { note, request, excluded })
}

/// Splits candidates into eligible and skipped notes, preserving input order.
/// Depends only on note content, tags and `config`.
pub fn filter(notes: Vec<Note>, config: &TranslationConfig) -> Partition {
    let mut partition = Partition::default();
    for note in notes {
        match classify(note, config) {
            Decision::Eligible(eligible) => partition.eligible.push(eligible),
            Decision::Skipped(skipped) => partition.skipped.push(skipped),
        }
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::memory::bilingual_note;

    fn with_field(mut note: Note, field: &str, value: &str) -> Note {
        note.fields.insert(field.to_string(), value.to_string());
        note
    }

    fn reason(partition: &Partition, id: NoteId) -> Option<SkipReason> {
        partition.skipped.iter().find(|s| s.note_id == id).map(|s| s.reason)
    }

    #[test]
    fn default_note_is_eligible_with_both_sides() {
        let partition = filter(vec![bilingual_note(1, "Hello", "World")], &Default::default());
        assert!(partition.skipped.is_empty());
        let request = &partition.eligible[0].request;
        assert_eq!(request.question.as_deref(), Some("Hello"));
        assert_eq!(request.answer.as_deref(), Some("World"));
    }

    #[test]
    fn translated_tag_skips_before_anything_else() {
        let mut note = with_field(bilingual_note(1, "Hello", "World"), "Front_jp", "こんにちは");
        note.tags.push("AI_Translated".to_string());

        let partition = filter(vec![note.clone()], &Default::default());
        assert_eq!(reason(&partition, 1), Some(SkipReason::AlreadyTagged));

        let config =
            TranslationConfig { skip_if_has_translated_tag: false, ..Default::default() };
        let partition = filter(vec![note], &config);
        assert_eq!(reason(&partition, 1), Some(SkipReason::TargetNotEmpty));
    }

    #[test]
    fn any_configured_target_with_content_skips() {
        let note = with_field(bilingual_note(1, "Hello", "World"), "Back_jp", "世界");
        let config = TranslationConfig { translate_answer: false, ..Default::default() };
        assert_eq!(reason(&filter(vec![note.clone()], &config), 1), Some(SkipReason::TargetNotEmpty));

        let whitespace = with_field(bilingual_note(2, "Hello", "World"), "Back_jp", "  \n");
        assert!(filter(vec![whitespace], &Default::default()).skipped.is_empty());

        let config = TranslationConfig { skip_if_target_not_empty: false, ..Default::default() };
        assert!(filter(vec![note], &config).skipped.is_empty());
    }

    #[test]
    fn long_side_is_omitted_but_note_stays_eligible() {
        let config = TranslationConfig { max_chars_per_field: 5, ..Default::default() };
        let partition = filter(vec![bilingual_note(1, "Hello", "World, again")], &config);

        let eligible = &partition.eligible[0];
        assert_eq!(eligible.request.question.as_deref(), Some("Hello"));
        assert_eq!(eligible.request.answer, None);
        assert_eq!(eligible.excluded, vec![(Side::Answer, SideExclusion::TooLong { chars: 12 })]);
        assert_eq!(partition.sides_too_long(), 1);
    }

    #[test]
    fn both_sides_too_long_is_no_eligible_field() {
        let config = TranslationConfig { max_chars_per_field: 3, ..Default::default() };
        let partition = filter(vec![bilingual_note(1, "Hello", "World")], &config);
        assert_eq!(reason(&partition, 1), Some(SkipReason::NoEligibleField));
        assert_eq!(partition.sides_too_long(), 2);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let config = TranslationConfig { max_chars_per_field: 5, ..Default::default() };
        let partition = filter(vec![bilingual_note(1, "こんにちは", "")], &config);
        assert_eq!(partition.eligible.len(), 1);
    }

    #[test]
    fn disabled_and_missing_sides_are_never_requested() {
        let config = TranslationConfig { translate_question: false, ..Default::default() };
        let partition = filter(vec![bilingual_note(1, "Hello", "World")], &config);
        assert_eq!(partition.eligible[0].request.requested_sides(), vec![Side::Answer]);

        let config = TranslationConfig {
            answer_source_field: "Extra".to_string(),
            translate_question: false,
            ..Default::default()
        };
        let partition = filter(vec![bilingual_note(2, "Hello", "World")], &config);
        assert_eq!(reason(&partition, 2), Some(SkipReason::NoEligibleField));
    }

    #[test]
    fn partition_is_deterministic_and_ordered() {
        let mut tagged = bilingual_note(2, "b", "b");
        tagged.tags.push("AI_Translated".to_string());
        let notes = vec![
            bilingual_note(3, "c", "c"),
            tagged,
            bilingual_note(1, "a", "a"),
            bilingual_note(4, "", ""),
        ];

        let first = filter(notes.clone(), &Default::default());
        let second = filter(notes, &Default::default());
        assert_eq!(first, second);

        let eligible: Vec<NoteId> = first.eligible.iter().map(|e| e.note.id).collect();
        let skipped: Vec<NoteId> = first.skipped.iter().map(|s| s.note_id).collect();
        assert_eq!(eligible, vec![3, 1]);
        assert_eq!(skipped, vec![2, 4]);
    }
}
