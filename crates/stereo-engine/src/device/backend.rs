use crate::stereo::Eye;

use super::{DeviceError, PixelSize};

/// Capability tier of the created device.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum FeatureLevel {
    /// Downlevel hardware (GL/GLES-class limits).
    Downlevel,
    /// Fully WebGPU-compliant hardware.
    Core,
}

impl FeatureLevel {
    /// Sampler anisotropy to request at this level.
    #[inline]
    pub fn max_anisotropy(self) -> u16 {
        match self {
            FeatureLevel::Downlevel => 2,
            FeatureLevel::Core => 4,
        }
    }
}

/// Result of a successful present call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentOutcome {
    Presented,
    /// The surface was outdated or timed out; nothing was shown.
    Skipped,
}

/// The graphics API seam used by `DeviceLifecycleManager`.
///
/// The manager owns every value produced here and decides when it is released.
/// Implementations only create, resize and present; they never cache views or
/// devices on their own side, so one generation can be dropped completely
/// before the next is built.
///
/// `Err(DeviceError::DeviceLost)` from `resize_swap_chain` or `present` starts
/// device recovery. Any other error is fatal. Allocation and validation failures
/// must come back as `ResourceCreationFailed`, never as a panic.
pub trait GpuBackend {
    /// Device plus its immediate command queue.
    type Device;
    type SwapChain;
    /// Per-eye color render target.
    type ColorTarget;
    type DepthTarget;

    /// Creates resources that survive device loss (instance, surface).
    fn create_device_independent_resources(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Creates the device at the highest available capability level.
    fn create_device(&mut self) -> Result<(Self::Device, FeatureLevel), DeviceError>;

    /// Whether the active display can show simultaneous left/right output.
    fn stereo_supported(&self, device: &Self::Device) -> bool;

    /// Largest width or height the device accepts for a render target.
    fn max_target_dimension(&self, device: &Self::Device) -> u32;

    fn create_swap_chain(
        &mut self,
        device: &Self::Device,
        size: PixelSize,
        stereo: bool,
    ) -> Result<Self::SwapChain, DeviceError>;

    fn resize_swap_chain(
        &mut self,
        device: &Self::Device,
        swap_chain: &mut Self::SwapChain,
        size: PixelSize,
        stereo: bool,
    ) -> Result<(), DeviceError>;

    fn create_color_target(
        &mut self,
        device: &Self::Device,
        swap_chain: &Self::SwapChain,
        eye: Eye,
        size: PixelSize,
    ) -> Result<Self::ColorTarget, DeviceError>;

    fn create_depth_target(
        &mut self,
        device: &Self::Device,
        size: PixelSize,
    ) -> Result<Self::DepthTarget, DeviceError>;

    fn color_target_size(target: &Self::ColorTarget) -> PixelSize;

    fn depth_target_size(target: &Self::DepthTarget) -> PixelSize;

    /// Shows the eye targets, waiting for the display's vertical sync.
    fn present(
        &mut self,
        device: &Self::Device,
        swap_chain: &mut Self::SwapChain,
        eye_targets: &[Self::ColorTarget],
    ) -> Result<PresentOutcome, DeviceError>;

    /// Lets the driver reclaim memory while the application is idle.
    fn trim(&mut self, device: &Self::Device);
}
