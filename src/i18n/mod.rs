//! Internationalization module

pub mod loader;

pub use loader::{I18n, TranslationParams};
