//! Input subsystem.
//!
//! Public API does not expose winit types. The runtime translates platform
//! keyboard events through `platform::winit` and feeds them to
//! `command_for_key`.

pub(crate) mod platform;
mod commands;
mod types;

pub use commands::{command_for_key, StereoCommand};
pub use types::{Key, KeyEvent, KeyState};
