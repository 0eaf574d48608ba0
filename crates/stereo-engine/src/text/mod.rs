//! Font loading and measurement for overlay text.

mod font_system;

pub(crate) use font_system::{find_system_font, FontId, FontSystem};
