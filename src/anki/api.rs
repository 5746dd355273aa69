use std::collections::{
    BTreeMap,
    HashMap,
};

use reqwest::blocking::Client;
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use tracing::debug;

use super::{
    NoteStore,
    NoteStoreError,
};
use crate::core::{
    Note,
    NoteId,
};

const ANKI_CONNECT_VERSION: u32 = 6;
const NOTES_INFO_CHUNK: usize = 256;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Field {
    pub value: String,
    order: u32,
}

/// `notesInfo` entry. Deleted notes come back as `{}`, hence the defaults.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
struct NoteInfo {
    note_id: Option<u64>,
    tags: Vec<String>,
    fields: HashMap<String, Field>,
    model_name: String,
}

impl NoteInfo {
    fn into_note(self) -> Option<Note> {
        let id = self.note_id?;
        let mut ordered: Vec<(&String, &Field)> = self.fields.iter().collect();
        ordered.sort_by_key(|(_, field)| field.order);
        let field_names = ordered.into_iter().map(|(name, _)| name.clone()).collect();
        let fields = self.fields.into_iter().map(|(name, field)| (name, field.value)).collect();

        Some(Note { id, model_name: self.model_name, field_names, fields, tags: self.tags })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentCard {
    card_id: u64,
}

#[derive(Debug, Deserialize)]
struct CardInfo {
    note: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

/// Blocking client for the AnkiConnect add-on.
pub struct AnkiConnect {
    client: Client,
    url: String,
}

impl AnkiConnect {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    fn make_request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<Option<T>, NoteStoreError> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
        body.insert("version".to_string(), serde_json::Value::Number(ANKI_CONNECT_VERSION.into()));

        if let Some(params) = params {
            body.insert("params".to_string(), params);
        }

        debug!(action, "AnkiConnect request");
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| NoteStoreError::Transport(e.to_string()))?;

        let response: ApiResponse<T> = response.json().map_err(|e| {
            NoteStoreError::UnexpectedResponse { action: action.to_string(), detail: e.to_string() }
        })?;

        if let Some(message) = response.error {
            return Err(NoteStoreError::Api { action: action.to_string(), message });
        }
        Ok(response.result)
    }

    fn require<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<T, NoteStoreError> {
        self.make_request(action, params)?.ok_or_else(|| NoteStoreError::UnexpectedResponse {
            action: action.to_string(),
            detail: "missing result".to_string(),
        })
    }

    /// Used to check that AnkiConnect is online.
    pub fn version(&self) -> Result<u32, NoteStoreError> {
        self.require("version", None)
    }
}

impl NoteStore for AnkiConnect {
    fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, NoteStoreError> {
        let params = serde_json::json!({ "query": query });
        Ok(self.make_request("findNotes", Some(params))?.unwrap_or_default())
    }

    fn notes(&self, ids: &[NoteId]) -> Result<Vec<Note>, NoteStoreError> {
        let mut notes = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(NOTES_INFO_CHUNK) {
            let params = serde_json::json!({ "notes": chunk });
            let infos: Vec<NoteInfo> =
                self.make_request("notesInfo", Some(params))?.unwrap_or_default();
            notes.extend(infos.into_iter().filter_map(NoteInfo::into_note));
        }
        Ok(notes)
    }

    fn current_note_id(&self) -> Result<Option<NoteId>, NoteStoreError> {
        let Some(card) = self.make_request::<CurrentCard>("guiCurrentCard", None)? else {
            return Ok(None);
        };

        let params = serde_json::json!({ "cards": [card.card_id] });
        let cards: Vec<CardInfo> = self.require("cardsInfo", Some(params))?;
        Ok(cards.first().map(|c| c.note))
    }

    fn update_note(
        &self,
        id: NoteId,
        fields: &BTreeMap<String, String>,
        tags: &[String],
    ) -> Result<(), NoteStoreError> {
        let params = serde_json::json!({
            "note": { "id": id, "fields": fields, "tags": tags }
        });
        self.make_request::<serde_json::Value>("updateNote", Some(params))?;
        Ok(())
    }

    fn add_tag(&self, id: NoteId, tag: &str) -> Result<(), NoteStoreError> {
        let params = serde_json::json!({ "notes": [id], "tags": tag });
        self.make_request::<serde_json::Value>("addTags", Some(params))?;
        Ok(())
    }
}
