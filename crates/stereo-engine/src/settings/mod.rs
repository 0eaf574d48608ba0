//! Persistent key/value settings and session bookkeeping.
//!
//! Values are `f32` only. A stored value of any other shape is reported as
//! `SettingsError::UnexpectedShape`, never coerced.

mod error;
mod json;
mod memory;
mod session;

pub use error::SettingsError;
pub use json::JsonFileSettings;
pub use memory::MemorySettings;
pub use session::{
    persist_on_suspend, restore_on_launch, ActivationKind, CLEAN_EXIT_KEY, EXAGGERATION_KEY,
};

/// Key/value store that survives process restarts.
pub trait PersistentSettings {
    /// `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<f32>, SettingsError>;
    fn set(&mut self, key: &str, value: f32) -> Result<(), SettingsError>;
    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), SettingsError>;
}
