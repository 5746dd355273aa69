use std::{
    fmt,
    time::Duration,
};

use tracing::{
    debug,
    info,
    warn,
};

use super::{
    apply::{
        apply,
        mark_failed,
    },
    extract::extract,
    filter::{
        filter,
        EligibleNote,
        Partition,
    },
    prompt::build_prompt,
    summary::{
        NoteFailure,
        RunOutcome,
        RunSummary,
    },
};
use crate::{
    anki::NoteStore,
    core::{
        http::http_client,
        CancelToken,
        ConfigError,
        NoteId,
        TranslationConfig,
        TranslatorError,
    },
    provider::{
        build_provider,
        CompletionOptions,
        CompletionProvider,
        Credential,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Filtering,
    Confirming,
    Processing,
    Reporting,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What the user is asked to approve before any provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub query: String,
    pub matched: usize,
    pub eligible: usize,
}

pub trait Confirm {
    fn confirm(&mut self, plan: &RunPlan) -> bool;
}

impl<F: FnMut(&RunPlan) -> bool> Confirm for F {
    fn confirm(&mut self, plan: &RunPlan) -> bool {
        self(plan)
    }
}

#[derive(Debug)]
pub enum RunEvent<'e> {
    StateChanged(RunState),
    NoteStarted { index: usize, total: usize, note_id: NoteId },
    NoteFinished { note_id: NoteId, outcome: &'e RunOutcome },
}

type Observer<'a> = Box<dyn FnMut(&RunEvent<'_>) + 'a>;

/// Validates `config`, resolves the credential and builds the selected
/// provider. Any failure here is fatal and happens before a note is read.
pub fn prepare_provider(
    config: &TranslationConfig,
) -> Result<Box<dyn CompletionProvider>, TranslatorError> {
    prepare_provider_with(config, |name| std::env::var(name).ok())
}

pub fn prepare_provider_with(
    config: &TranslationConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Box<dyn CompletionProvider>, TranslatorError> {
    config.validate()?;
    let settings = config.provider_settings();
    let credential = Credential::resolve(settings.kind, settings.credential_env, lookup)?;
    let client = http_client(Duration::from_secs(config.request_timeout_secs))?;
    info!(provider = %settings.kind, model = settings.model, "Provider ready");
    Ok(build_provider(config, credential, client))
}

/// Drives one run: filter, confirm, translate each eligible note, report.
pub struct Translator<'a> {
    store: &'a dyn NoteStore,
    provider: &'a dyn CompletionProvider,
    config: &'a TranslationConfig,
    cancel: CancelToken,
    observer: Option<Observer<'a>>,
    state: RunState,
}

impl<'a> Translator<'a> {
    pub fn new(
        store: &'a dyn NoteStore,
        provider: &'a dyn CompletionProvider,
        config: &'a TranslationConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
            cancel: CancelToken::new(),
            observer: None,
            state: RunState::Idle,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn on_event(mut self, observer: impl FnMut(&RunEvent<'_>) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn emit(&mut self, event: RunEvent<'_>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    fn enter(&mut self, state: RunState) {
        debug!(%state, "Run state");
        self.state = state;
        self.emit(RunEvent::StateChanged(state));
    }

    /// Batch mode. `confirm` is asked once the eligible set is known and
    /// before any provider call; declining ends the run untouched.
    pub fn run_batch(
        &mut self,
        query: &str,
        confirm: &mut dyn Confirm,
    ) -> Result<RunSummary, TranslatorError> {
        self.config.validate()?;
        let query = query.trim();
        if query.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "query".to_string(),
                reason: "search query is empty".to_string(),
            }
            .into());
        }

        self.enter(RunState::Filtering);
        let ids = self.store.find_notes(query)?;
        info!(query, matched = ids.len(), "Notes matched");
        let (partition, mut summary) = self.filter_notes(&ids)?;

        if partition.eligible.is_empty() {
            return Ok(self.finish(summary));
        }

        self.enter(RunState::Confirming);
        let plan = RunPlan {
            query: query.to_string(),
            matched: summary.matched,
            eligible: partition.eligible.len(),
        };
        if !confirm.confirm(&plan) {
            info!("Run declined at confirmation");
            summary.declined = true;
            summary.not_processed = plan.eligible;
            return Ok(self.finish(summary));
        }

        self.process(partition.eligible, &mut summary);
        Ok(self.finish(summary))
    }

    /// Single-card mode: the note behind the card on screen. Triggering it
    /// is the confirmation, so there is no `Confirming` step.
    pub fn run_current(&mut self) -> Result<RunSummary, TranslatorError> {
        self.config.validate()?;
        let note_id = self.store.current_note_id()?.ok_or(TranslatorError::NoCurrentNote)?;
        self.run_note(note_id)
    }

    pub fn run_note(&mut self, note_id: NoteId) -> Result<RunSummary, TranslatorError> {
        self.config.validate()?;
        self.enter(RunState::Filtering);
        let (partition, mut summary) = self.filter_notes(&[note_id])?;
        if summary.matched == 0 {
            return Err(crate::anki::NoteStoreError::NotFound(note_id).into());
        }

        self.process(partition.eligible, &mut summary);
        Ok(self.finish(summary))
    }

    fn filter_notes(&mut self, ids: &[NoteId]) -> Result<(Partition, RunSummary), TranslatorError> {
        let notes = if ids.is_empty() { Vec::new() } else { self.store.notes(ids)? };
        let partition = filter(notes, self.config);

        let mut summary = RunSummary {
            matched: partition.eligible.len() + partition.skipped.len(),
            sides_too_long: partition.sides_too_long(),
            ..Default::default()
        };
        for skipped in &partition.skipped {
            debug!(note_id = skipped.note_id, reason = %skipped.reason, "Skipped");
            summary.record(skipped.note_id, RunOutcome::Skipped(skipped.reason));
        }
        info!(
            eligible = partition.eligible.len(),
            skipped = partition.skipped.len(),
            "Filtering done"
        );
        Ok((partition, summary))
    }

    fn process(&mut self, eligible: Vec<EligibleNote>, summary: &mut RunSummary) {
        self.enter(RunState::Processing);
        let total = eligible.len();

        for (index, note) in eligible.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                summary.not_processed = total - index;
                warn!(remaining = summary.not_processed, "Run cancelled");
                break;
            }

            let note_id = note.note.id;
            self.emit(RunEvent::NoteStarted { index: index + 1, total, note_id });

            let outcome = match self.translate_note(note) {
                Ok(()) => RunOutcome::Translated,
                Err(failure) => {
                    warn!(note_id, kind = %failure.kind(), "Note failed: {failure}");
                    mark_failed(self.store, note_id, self.config);
                    RunOutcome::from(failure)
                }
            };

            self.emit(RunEvent::NoteFinished { note_id, outcome: &outcome });
            summary.record(note_id, outcome);
        }
    }

    fn translate_note(&self, note: &EligibleNote) -> Result<(), NoteFailure> {
        let prompt = build_prompt(&note.request, self.config);
        let options = CompletionOptions {
            model: self.config.provider_settings().model,
            temperature: self.config.temperature,
        };

        let raw = self.provider.complete(&prompt, &options)?;
        let result = extract(&raw, &note.request.requested_sides())?;
        apply(self.store, note.note.id, &result, self.config)?;
        debug!(note_id = note.note.id, "Translated");
        Ok(())
    }

    fn finish(&mut self, summary: RunSummary) -> RunSummary {
        self.enter(RunState::Reporting);
        info!(
            matched = summary.matched,
            translated = summary.translated,
            skipped = summary.skipped(),
            errors = summary.errored(),
            "Run finished"
        );
        self.enter(RunState::Done);
        summary
    }
}
