//! The translation pipeline: filter candidates, build a prompt per note,
//! call the provider, extract the JSON payload and write it back.

pub mod apply;
pub mod extract;
pub mod filter;
pub mod orchestrator;
pub mod prompt;
pub mod summary;

pub use filter::{
    filter,
    Partition,
    SkipReason,
};
pub use orchestrator::{
    prepare_provider,
    Confirm,
    RunEvent,
    RunPlan,
    RunState,
    Translator,
};
pub use summary::{
    ErrorKind,
    RunOutcome,
    RunSummary,
};
