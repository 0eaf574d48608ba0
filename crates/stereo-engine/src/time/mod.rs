//! Time subsystem.
//!
//! `BasicTimer` feeds the render loop with elapsed and per-frame seconds.
//! Call `update()` once per rendered frame.

mod timer;

pub use timer::BasicTimer;
