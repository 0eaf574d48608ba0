use super::{PersistentSettings, SettingsError};

/// Key holding the last user-chosen exaggeration factor.
pub const EXAGGERATION_KEY: &str = "StereoExaggerationFactor";
/// Present while the last session ended through suspend or an orderly close.
pub const CLEAN_EXIT_KEY: &str = "SessionExitedCleanly";

/// How the process was started.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ActivationKind {
    /// Plain start with no target.
    Launch,
    /// Started to open a file.
    File,
    /// Started through a URI scheme.
    Protocol,
}

impl ActivationKind {
    /// Classifies the command line, program name excluded.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match args.into_iter().next() {
            None => ActivationKind::Launch,
            Some(arg) if arg.as_ref().contains("://") => ActivationKind::Protocol,
            Some(_) => ActivationKind::File,
        }
    }
}

/// Starts a session: returns the exaggeration to restore, if any.
///
/// The stored factor is used only when the previous session exited cleanly.
/// The clean-exit marker is consumed here, so a crash before the next suspend
/// leaves the following launch with defaults. Activation kinds other than
/// `Launch` are not supported.
pub fn restore_on_launch(
    settings: &mut dyn PersistentSettings,
    kind: ActivationKind,
) -> Result<Option<f32>, SettingsError> {
    if kind != ActivationKind::Launch {
        return Err(SettingsError::UnsupportedActivation(kind));
    }

    let clean = settings.get(CLEAN_EXIT_KEY)?.is_some();
    settings.remove(CLEAN_EXIT_KEY)?;

    if !clean {
        log::info!("previous session did not exit cleanly; using default exaggeration");
        return Ok(None);
    }

    let restored = settings.get(EXAGGERATION_KEY)?;
    if let Some(v) = restored {
        log::info!("restored stereo exaggeration {v:.2}");
    }
    Ok(restored)
}

/// Records the exaggeration factor and marks the session as cleanly suspended.
pub fn persist_on_suspend(settings: &mut dyn PersistentSettings, exaggeration: f32) -> Result<(), SettingsError> {
    settings.set(EXAGGERATION_KEY, exaggeration)?;
    settings.set(CLEAN_EXIT_KEY, 1.0)?;
    log::debug!("persisted stereo exaggeration {exaggeration:.2}");
    Ok(())
}
