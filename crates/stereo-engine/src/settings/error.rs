use std::fmt;
use std::path::PathBuf;

use super::ActivationKind;

/// Errors from the settings store and session restore.
#[derive(Debug)]
pub enum SettingsError {
    Io { path: PathBuf, source: std::io::Error },
    /// The settings file is not a JSON object.
    Parse { path: PathBuf, reason: String },
    /// The key holds something other than a finite number.
    UnexpectedShape { key: String, found: String },
    /// Only non-finite values are rejected on write.
    InvalidValue { key: String, value: f32 },
    UnsupportedActivation(ActivationKind),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io { path, source } => {
                write!(f, "settings I/O error at {}: {source}", path.display())
            }
            SettingsError::Parse { path, reason } => {
                write!(f, "settings file {} is malformed: {reason}", path.display())
            }
            SettingsError::UnexpectedShape { key, found } => {
                write!(f, "setting {key} has unexpected shape: {found}")
            }
            SettingsError::InvalidValue { key, value } => {
                write!(f, "setting {key} cannot store {value}")
            }
            SettingsError::UnsupportedActivation(kind) => {
                write!(f, "unsupported activation kind: {kind:?}")
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
