use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::{
    Note,
    NoteId,
};

pub mod api;
#[cfg(test)]
pub mod memory;

pub use api::AnkiConnect;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoteStoreError {
    #[error("Cannot reach the note store: {0}")]
    Transport(String),

    #[error("Note store rejected '{action}': {message}")]
    Api { action: String, message: String },

    #[error("Unexpected note store response to '{action}': {detail}")]
    UnexpectedResponse { action: String, detail: String },

    #[error("Note {0} no longer exists")]
    NotFound(NoteId),
}

/// The external note collection. Query syntax is passed through untouched.
pub trait NoteStore {
    /// Ordered note ids matching `query`.
    fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, NoteStoreError>;

    /// Notes for `ids` in the same order; ids that no longer exist are left out.
    fn notes(&self, ids: &[NoteId]) -> Result<Vec<Note>, NoteStoreError>;

    /// Note behind the card currently shown in the reviewer, if any.
    fn current_note_id(&self) -> Result<Option<NoteId>, NoteStoreError>;

    /// Writes `fields` and replaces the tag list of one note in a single update.
    fn update_note(
        &self,
        id: NoteId,
        fields: &BTreeMap<String, String>,
        tags: &[String],
    ) -> Result<(), NoteStoreError>;

    fn add_tag(&self, id: NoteId, tag: &str) -> Result<(), NoteStoreError>;

    fn note(&self, id: NoteId) -> Result<Note, NoteStoreError> {
        self.notes(&[id])?.into_iter().find(|n| n.id == id).ok_or(NoteStoreError::NotFound(id))
    }
}
