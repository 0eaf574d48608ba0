use std::fmt;

/// Resource-creation stage, in lifecycle order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceStage {
    DeviceIndependent,
    Device,
    WindowSize,
}

impl fmt::Display for ResourceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceStage::DeviceIndependent => "device-independent",
            ResourceStage::Device => "device",
            ResourceStage::WindowSize => "window-size",
        };
        f.write_str(s)
    }
}

/// Errors raised by the device lifecycle.
///
/// Only `DeviceLost` is recoverable, and the manager recovers from it before
/// returning to the caller. Everything else is fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The adapter/device could not be created. No fallback is attempted.
    DeviceCreationFailed(String),
    /// A GPU allocation failed while building `stage`. The stage is aborted.
    ResourceCreationFailed { stage: ResourceStage, reason: String },
    /// The device was removed or reset.
    DeviceLost,
    /// Presentation failed for a reason other than device loss.
    PresentFailed(String),
    /// Lifecycle misuse, or an activation/settings shape that is not understood.
    UnexpectedState(String),
}

impl DeviceError {
    pub(crate) fn resource(stage: ResourceStage, reason: impl Into<String>) -> Self {
        DeviceError::ResourceCreationFailed { stage, reason: reason.into() }
    }

    /// True for the one variant the lifecycle recovers from.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DeviceError::DeviceLost)
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::DeviceCreationFailed(msg) => write!(f, "device creation failed: {msg}"),
            DeviceError::ResourceCreationFailed { stage, reason } => {
                write!(f, "{stage} resource creation failed: {reason}")
            }
            DeviceError::DeviceLost => f.write_str("graphics device was lost"),
            DeviceError::PresentFailed(msg) => write!(f, "present failed: {msg}"),
            DeviceError::UnexpectedState(msg) => write!(f, "unexpected state: {msg}"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// What happened during `present()`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentStatus {
    /// The frame reached the display.
    Presented,
    /// Transient surface condition; the frame was dropped.
    Skipped,
    /// The device was lost and every device-dependent resource was rebuilt.
    /// The frame was dropped; the next one renders normally.
    DeviceRecovered,
}
