use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};

use super::{PersistentSettings, SettingsError};

/// Settings kept in a flat JSON object on disk.
///
/// The file is read once on open and rewritten on every change. A missing file
/// is an empty store.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileSettings {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();

        let values = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(SettingsError::Parse {
                        path,
                        reason: format!("expected an object, found {}", kind_of(&other)),
                    });
                }
                Err(e) => return Err(SettingsError::Parse { path, reason: e.to_string() }),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(SettingsError::Io { path, source }),
        };

        log::debug!("settings: {} key(s) from {}", values.len(), path.display());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io { path: self.path.clone(), source };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }

        let text = serde_json::to_string_pretty(&self.values).map_err(|e| SettingsError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        // Write-then-rename so a crash mid-write leaves the old file intact.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl PersistentSettings for JsonFileSettings {
    fn get(&self, key: &str) -> Result<Option<f32>, SettingsError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() => Ok(Some(v as f32)),
                _ => Err(SettingsError::UnexpectedShape { key: key.to_owned(), found: n.to_string() }),
            },
            Some(other) => Err(SettingsError::UnexpectedShape {
                key: key.to_owned(),
                found: kind_of(other).to_owned(),
            }),
        }
    }

    fn set(&mut self, key: &str, value: f32) -> Result<(), SettingsError> {
        let number = Number::from_f64(value as f64)
            .ok_or_else(|| SettingsError::InvalidValue { key: key.to_owned(), value })?;
        self.values.insert(key.to_owned(), Value::Number(number));
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let s = JsonFileSettings::open(dir.path().join("settings.json")).unwrap();
        assert_eq!(s.get("StereoExaggerationFactor").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut s = JsonFileSettings::open(&path).unwrap();
        s.set("StereoExaggerationFactor", 1.5).unwrap();
        s.set("Other", 0.25).unwrap();
        s.remove("Other").unwrap();
        drop(s);

        let s = JsonFileSettings::open(&path).unwrap();
        assert_eq!(s.get("StereoExaggerationFactor").unwrap(), Some(1.5));
        assert_eq!(s.get("Other").unwrap(), None);
    }

    #[test]
    fn non_number_value_is_unexpected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "StereoExaggerationFactor": "high" }"#).unwrap();

        let s = JsonFileSettings::open(&path).unwrap();
        let err = s.get("StereoExaggerationFactor").unwrap_err();
        assert!(matches!(err, SettingsError::UnexpectedShape { .. }));
    }

    #[test]
    fn non_object_root_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(JsonFileSettings::open(&path), Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn nan_is_rejected_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = JsonFileSettings::open(dir.path().join("settings.json")).unwrap();
        assert!(matches!(
            s.set("StereoExaggerationFactor", f32::NAN),
            Err(SettingsError::InvalidValue { .. })
        ));
    }
}
