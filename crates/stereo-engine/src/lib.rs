//! Stereo engine crate.
//!
//! Owns the GPU device lifecycle, the per-eye stereoscopic projection and the
//! render loop that drives one rotating object in mono or left/right stereo.

pub mod device;
pub mod stereo;
pub mod render;
pub mod window;
pub mod input;
pub mod time;

pub mod assets;
pub mod coords;
pub mod logging;
pub mod settings;
mod text;
