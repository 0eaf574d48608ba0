/// How two eye images reach the display.
///
/// The surface is a single flat image, so stereo output is composited into it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum StereoOutput {
    /// The display is treated as mono; only the left eye is rendered.
    #[default]
    Mono,
    /// Left eye in the left half of the surface, right eye in the right half.
    /// Suits side-by-side 3D displays and head-mounted viewers.
    SideBySide,
}

impl StereoOutput {
    /// Parses a configuration value (`mono`, `sbs`, `side-by-side`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mono" | "off" | "0" => Some(StereoOutput::Mono),
            "sbs" | "side-by-side" | "sidebyside" | "on" | "1" => Some(StereoOutput::SideBySide),
            _ => None,
        }
    }

    #[inline]
    pub fn is_stereo(self) -> bool {
        self != StereoOutput::Mono
    }
}

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode. FIFO waits for vertical sync, which the render loop relies on.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface. A hint only.
    pub desired_maximum_frame_latency: u32,

    /// Stereo presentation reported to the lifecycle as display capability.
    pub stereo_output: StereoOutput,

    /// Restricts stereo to monitors whose name contains this text
    /// (case-insensitive). Moving the window to another monitor re-evaluates it.
    pub stereo_monitor: Option<String>,
}

impl GpuInit {
    /// Whether stereo output applies while the window is on `monitor_name`.
    ///
    /// An unnamed or unknown monitor never matches a filter.
    pub fn stereo_on(&self, monitor_name: Option<&str>) -> bool {
        if !self.stereo_output.is_stereo() {
            return false;
        }
        match (self.stereo_monitor.as_deref(), monitor_name) {
            (None, _) => true,
            (Some(filter), Some(name)) => name.to_lowercase().contains(&filter.trim().to_lowercase()),
            (Some(_), None) => false,
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
            stereo_output: StereoOutput::Mono,
            stereo_monitor: None,
        }
    }
}
