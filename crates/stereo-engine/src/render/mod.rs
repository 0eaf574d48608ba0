//! GPU rendering subsystem.
//!
//! `PerEyeRenderLoop` decides what each eye sees; `StereoRenderer` turns that
//! into wgpu commands against the targets owned by the device lifecycle.
//!
//! Convention:
//! - overlay geometry is in logical pixels (top-left origin, +Y down)
//! - scene matrices are right-handed and uploaded column by column

mod constants;
mod ctx;
mod frame_loop;
pub mod overlay;
mod renderer;
mod scene;
mod text;

pub use constants::{ConstantBufferData, GpuConstants};
pub use ctx::{RenderCtx, RenderTarget};
pub use frame_loop::{
    hint_message, hint_rect, CameraRig, EyePass, HintText, PerEyeRenderLoop, CLEAR_COLOR,
    MONO_HINT, STEREO_HINT,
};
pub use renderer::StereoRenderer;
pub use scene::CubeScene;
