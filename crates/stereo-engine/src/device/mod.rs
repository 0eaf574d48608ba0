//! GPU device lifecycle.
//!
//! This module is responsible for:
//! - the lifecycle state machine (`DeviceLifecycleManager`)
//! - the backend seam (`GpuBackend`) and its wgpu implementation
//! - viewport/DPI bookkeeping that sizes the render targets
//! - device-loss detection and recovery at present time

mod backend;
mod error;
mod gpu;
mod init;
mod lifecycle;
mod surface;
mod viewport;

pub use backend::{FeatureLevel, GpuBackend, PresentOutcome};
pub use error::{DeviceError, PresentStatus, ResourceStage};
pub use gpu::{DepthTarget, EyeTarget, WgpuBackend, WgpuDevice, WgpuSwapChain, DEPTH_FORMAT};
pub use init::{GpuInit, StereoOutput};
pub use lifecycle::{DeviceLifecycleManager, DeviceResourceBundle, LifecycleState, RendererHooks};
pub use viewport::{LogicalSize, PixelSize, ViewportState, DEFAULT_DPI};
