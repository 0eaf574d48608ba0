use crate::stereo::EXAGGERATION_STEP;

use super::{Key, KeyEvent, KeyState};

/// What a key press asks the viewer to do.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StereoCommand {
    /// Change the exaggeration factor by this amount.
    AdjustExaggeration(f32),
    Exit,
}

/// Maps a key event to a viewer command.
///
/// Up and down arrows step the exaggeration factor on press and on auto-repeat.
/// Releases are ignored.
pub fn command_for_key(event: KeyEvent) -> Option<StereoCommand> {
    if event.state != KeyState::Pressed {
        return None;
    }

    match event.key {
        Key::ArrowUp => Some(StereoCommand::AdjustExaggeration(EXAGGERATION_STEP)),
        Key::ArrowDown => Some(StereoCommand::AdjustExaggeration(-EXAGGERATION_STEP)),
        Key::Escape if !event.repeat => Some(StereoCommand::Exit),
        _ => None,
    }
}
