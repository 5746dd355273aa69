use std::fmt;

use super::{
    apply::ApplyError,
    extract::ExtractError,
    filter::SkipReason,
};
use crate::{
    core::NoteId,
    provider::ProviderError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ProviderAuth,
    ProviderRequest,
    ProviderRateLimited,
    MalformedResponse,
    FieldMissing,
    NoteStore,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ProviderAuth => "ProviderAuthError",
            ErrorKind::ProviderRequest => "ProviderRequestError",
            ErrorKind::ProviderRateLimited => "ProviderRateLimited",
            ErrorKind::MalformedResponse => "MalformedResponse",
            ErrorKind::FieldMissing => "FieldMissing",
            ErrorKind::NoteStore => "NoteStoreError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that can fail for a single note once processing started.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteFailure {
    Provider(ProviderError),
    Extract(ExtractError),
    Apply(ApplyError),
}

impl NoteFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NoteFailure::Provider(ProviderError::Auth { .. }) => ErrorKind::ProviderAuth,
            NoteFailure::Provider(ProviderError::RateLimited { .. }) => ErrorKind::ProviderRateLimited,
            NoteFailure::Provider(ProviderError::Request { .. }) => ErrorKind::ProviderRequest,
            NoteFailure::Extract(ExtractError::MalformedResponse { .. }) => {
                ErrorKind::MalformedResponse
            }
            NoteFailure::Apply(ApplyError::FieldMissing(_)) => ErrorKind::FieldMissing,
            NoteFailure::Apply(ApplyError::NoteStore(_)) => ErrorKind::NoteStore,
        }
    }
}

impl fmt::Display for NoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteFailure::Provider(e) => write!(f, "{e}"),
            NoteFailure::Extract(e) => write!(f, "{e}"),
            NoteFailure::Apply(e) => write!(f, "{e}"),
        }
    }
}

impl From<ProviderError> for NoteFailure {
    fn from(error: ProviderError) -> Self {
        NoteFailure::Provider(error)
    }
}

impl From<ExtractError> for NoteFailure {
    fn from(error: ExtractError) -> Self {
        NoteFailure::Extract(error)
    }
}

impl From<ApplyError> for NoteFailure {
    fn from(error: ApplyError) -> Self {
        NoteFailure::Apply(error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Translated,
    Skipped(SkipReason),
    Error { kind: ErrorKind, detail: String },
}

impl From<NoteFailure> for RunOutcome {
    fn from(failure: NoteFailure) -> Self {
        RunOutcome::Error { kind: failure.kind(), detail: failure.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteError {
    pub note_id: NoteId,
    pub kind: ErrorKind,
    pub detail: String,
}

impl fmt::Display for NoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note {}: [{}] {}", self.note_id, self.kind, self.detail)
    }
}

/// Outcome counts of one run plus the ordered error report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub matched: usize,
    pub translated: usize,
    pub skipped_already_tagged: usize,
    pub skipped_target_not_empty: usize,
    pub skipped_no_eligible_field: usize,
    /// Enabled sides left out for exceeding `max_chars_per_field`. There is
    /// no per-note too-long outcome: a note that loses every side this way
    /// is counted under `skipped_no_eligible_field`.
    pub sides_too_long: usize,
    pub errors: Vec<NoteError>,
    /// Eligible notes never processed because the run stopped early.
    pub not_processed: usize,
    pub cancelled: bool,
    pub declined: bool,
}

impl RunSummary {
    pub fn record(&mut self, note_id: NoteId, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Translated => self.translated += 1,
            RunOutcome::Skipped(SkipReason::AlreadyTagged) => self.skipped_already_tagged += 1,
            RunOutcome::Skipped(SkipReason::TargetNotEmpty) => self.skipped_target_not_empty += 1,
            RunOutcome::Skipped(SkipReason::NoEligibleField) => {
                self.skipped_no_eligible_field += 1
            }
            RunOutcome::Error { kind, detail } => {
                self.errors.push(NoteError { note_id, kind, detail })
            }
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_already_tagged + self.skipped_target_not_empty + self.skipped_no_eligible_field
    }

    pub fn errored(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Ordered `Note <id>: [<kind>] <detail>` lines, empty when nothing failed.
    pub fn error_report(&self) -> String {
        self.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.declined {
            return write!(f, "Cancelled before sending anything ({} notes matched).", self.matched);
        }
        if self.cancelled {
            writeln!(f, "Run cancelled; {} eligible notes were not processed.", self.not_processed)?;
        }
        writeln!(f, "Matched: {}", self.matched)?;
        writeln!(f, "Translated: {}", self.translated)?;
        writeln!(f, "Skipped by rules: {}", self.skipped())?;
        writeln!(f, "  already tagged: {}", self.skipped_already_tagged)?;
        writeln!(f, "  target not empty: {}", self.skipped_target_not_empty)?;
        writeln!(f, "  no field to translate: {}", self.skipped_no_eligible_field)?;
        writeln!(f, "  sides skipped too long: {}", self.sides_too_long)?;
        write!(f, "Errors: {}", self.errored())
    }
}
