//! Stereoscopic math and state.
//!
//! - `projection`: pure per-eye off-axis projection
//! - `exaggeration`: the clamped depth-intensity setting
//!
//! Nothing in here touches the GPU.

mod eye;
mod exaggeration;
mod projection;

pub use eye::Eye;
pub use exaggeration::{
    StereoExaggerationController, DEFAULT_EXAGGERATION, EXAGGERATION_STEP, MAX_EXAGGERATION,
    MIN_EXAGGERATION,
};
pub use projection::{
    compute_eye_projection, stereo_projection_rh, ScreenInches, StereoParameters,
    DEFAULT_INTEROCULAR_DISTANCE_INCHES, DEFAULT_VIEWER_DISTANCE_INCHES,
};
