pub mod anki;
pub mod core;
pub mod persistence;
pub mod provider;
pub mod translate;

pub use crate::core::{
    TranslationConfig,
    TranslatorError,
};
