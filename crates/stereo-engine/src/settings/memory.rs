use std::collections::HashMap;

use super::{PersistentSettings, SettingsError};

/// In-process store. Nothing survives the process; used when no settings path
/// is configured and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: HashMap<String, f32>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentSettings for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<f32>, SettingsError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: f32) -> Result<(), SettingsError> {
        if !value.is_finite() {
            return Err(SettingsError::InvalidValue { key: key.to_owned(), value });
        }
        self.values.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        self.values.remove(key);
        Ok(())
    }
}
