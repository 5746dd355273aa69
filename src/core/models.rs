use std::{
    collections::HashMap,
    fmt,
};

pub type NoteId = u64;

/// A note as read from the note store. The pipeline never assumes a fixed
/// schema, so every field lookup goes through `field_names`.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub model_name: String,
    pub field_names: Vec<String>, // Ordered note-type schema
    pub fields: HashMap<String, String>,
    pub tags: Vec<String>,
}

impl Note {
    pub fn has_field(&self, name: &str) -> bool {
        !name.is_empty() && self.field_names.iter().any(|f| f == name)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        if !self.has_field(name) {
            return None;
        }
        self.fields.get(name).map(String::as_str)
    }

    /// Anki compares tags case-insensitively.
    pub fn has_tag(&self, tag: &str) -> bool {
        !tag.is_empty() && self.tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Question,
    Answer,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Question, Side::Answer];

    /// JSON key the model is asked to answer with.
    pub fn key(&self) -> &'static str {
        match self {
            Side::Question => "question",
            Side::Answer => "answer",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Texts to send for one note. A side is `Some` only when it passed filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub note_id: NoteId,
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl TranslationRequest {
    pub fn side(&self, side: Side) -> Option<&str> {
        match side {
            Side::Question => self.question.as_deref(),
            Side::Answer => self.answer.as_deref(),
        }
    }

    pub fn requested_sides(&self) -> Vec<Side> {
        Side::ALL.into_iter().filter(|s| self.side(*s).is_some()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationResult {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl TranslationResult {
    pub fn side(&self, side: Side) -> Option<&str> {
        match side {
            Side::Question => self.question.as_deref(),
            Side::Answer => self.answer.as_deref(),
        }
    }

    pub fn set_side(&mut self, side: Side, text: String) {
        match side {
            Side::Question => self.question = Some(text),
            Side::Answer => self.answer = Some(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.question.is_none() && self.answer.is_none()
    }
}
