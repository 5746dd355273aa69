pub mod cancel;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;

pub use cancel::CancelToken;
pub use config::{
    ProviderKind,
    ProviderSettings,
    TranslationConfig,
};
pub use errors::{
    ConfigError,
    TranslatorError,
};
pub use models::{
    Note,
    NoteId,
    Side,
    TranslationRequest,
    TranslationResult,
};
