use std::{
    collections::{
        BTreeMap,
        HashMap,
        HashSet,
    },
    sync::Mutex,
};

use super::{
    NoteStore,
    NoteStoreError,
};
use crate::core::{
    Note,
    NoteId,
};

/// In-memory collection for pipeline tests. Queries are matched against
/// registered result lists; `"*"` returns every note in insertion order.
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: Mutex<Vec<Note>>,
    queries: Mutex<HashMap<String, Vec<NoteId>>>,
    current: Mutex<Option<NoteId>>,
    failing_updates: Mutex<HashSet<NoteId>>,
    update_calls: Mutex<usize>,
}

impl MemoryNoteStore {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes: Mutex::new(notes), ..Default::default() }
    }

    pub fn with_query(self, query: &str, ids: Vec<NoteId>) -> Self {
        self.queries.lock().unwrap().insert(query.to_string(), ids);
        self
    }

    pub fn with_current(self, id: NoteId) -> Self {
        *self.current.lock().unwrap() = Some(id);
        self
    }

    pub fn fail_updates_for(&self, id: NoteId) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    pub fn get(&self, id: NoteId) -> Note {
        self.notes.lock().unwrap().iter().find(|n| n.id == id).cloned().unwrap()
    }

    /// Simulates a note-type edit made outside the pipeline.
    pub fn remove_field(&self, id: NoteId, field: &str) {
        let mut notes = self.notes.lock().unwrap();
        let note = notes.iter_mut().find(|n| n.id == id).unwrap();
        note.field_names.retain(|f| f != field);
        note.fields.remove(field);
    }

    pub fn update_calls(&self) -> usize {
        *self.update_calls.lock().unwrap()
    }
}

impl NoteStore for MemoryNoteStore {
    fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, NoteStoreError> {
        if query == "*" {
            return Ok(self.notes.lock().unwrap().iter().map(|n| n.id).collect());
        }
        Ok(self.queries.lock().unwrap().get(query).cloned().unwrap_or_default())
    }

    fn notes(&self, ids: &[NoteId]) -> Result<Vec<Note>, NoteStoreError> {
        let notes = self.notes.lock().unwrap();
        Ok(ids.iter().filter_map(|id| notes.iter().find(|n| n.id == *id).cloned()).collect())
    }

    fn current_note_id(&self) -> Result<Option<NoteId>, NoteStoreError> {
        Ok(*self.current.lock().unwrap())
    }

    fn update_note(
        &self,
        id: NoteId,
        fields: &BTreeMap<String, String>,
        tags: &[String],
    ) -> Result<(), NoteStoreError> {
        *self.update_calls.lock().unwrap() += 1;
        if self.failing_updates.lock().unwrap().contains(&id) {
            return Err(NoteStoreError::Transport("connection reset".to_string()));
        }

        let mut notes = self.notes.lock().unwrap();
        let note = notes.iter_mut().find(|n| n.id == id).ok_or(NoteStoreError::NotFound(id))?;
        if let Some(missing) = fields.keys().find(|f| !note.field_names.contains(f)) {
            return Err(NoteStoreError::Api {
                action: "updateNote".to_string(),
                message: format!("field '{missing}' does not exist"),
            });
        }
        for (name, value) in fields {
            note.fields.insert(name.clone(), value.clone());
        }
        note.tags = tags.to_vec();
        Ok(())
    }

    fn add_tag(&self, id: NoteId, tag: &str) -> Result<(), NoteStoreError> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes.iter_mut().find(|n| n.id == id).ok_or(NoteStoreError::NotFound(id))?;
        if !note.has_tag(tag) {
            note.tags.push(tag.to_string());
        }
        Ok(())
    }
}

/// A note of a "Basic (bilingual)" type with `Front`, `Back`, `Front_jp` and `Back_jp`.
pub fn bilingual_note(id: NoteId, front: &str, back: &str) -> Note {
    let fields = [("Front", front), ("Back", back), ("Front_jp", ""), ("Back_jp", "")];
    Note {
        id,
        model_name: "Basic (bilingual)".to_string(),
        field_names: fields.iter().map(|(name, _)| name.to_string()).collect(),
        fields: fields.iter().map(|(name, value)| (name.to_string(), value.to_string())).collect(),
        tags: Vec::new(),
    }
}
