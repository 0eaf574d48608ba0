//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the device
//! lifecycle and the stereo renderer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
