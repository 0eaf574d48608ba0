use std::fmt;

/// Failure to load a named asset.
#[derive(Debug)]
pub enum AssetError {
    /// No loader knows an asset by this name.
    NotFound(String),
    Io { name: String, source: std::io::Error },
    /// The bytes were read but could not be decoded.
    Decode { name: String, reason: String },
    /// Decoded data violates a structural constraint (e.g. index out of range).
    Invalid { name: String, reason: String },
}

impl AssetError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        AssetError::Invalid { name: name.to_owned(), reason: reason.into() }
    }

    /// Name of the asset that failed.
    pub fn name(&self) -> &str {
        match self {
            AssetError::NotFound(name) => name,
            AssetError::Io { name, .. }
            | AssetError::Decode { name, .. }
            | AssetError::Invalid { name, .. } => name,
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound(name) => write!(f, "asset not found: {name}"),
            AssetError::Io { name, source } => write!(f, "failed to read asset {name}: {source}"),
            AssetError::Decode { name, reason } => write!(f, "failed to decode asset {name}: {reason}"),
            AssetError::Invalid { name, reason } => write!(f, "invalid asset {name}: {reason}"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
