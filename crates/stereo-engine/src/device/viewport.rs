/// Logical DPI at which one logical unit equals one pixel.
pub const DEFAULT_DPI: f32 = 96.0;

/// Size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Size in logical (DPI-independent) units.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LogicalSize {
    pub width: f32,
    pub height: f32,
}

impl LogicalSize {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Window and render-target geometry.
///
/// Mutated only by the resize/DPI paths of the lifecycle manager. The render
/// target size is always derived from `window_bounds` and `dpi`, capped per axis
/// at the device's largest texture dimension.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportState {
    window_bounds: LogicalSize,
    dpi: f32,
    render_target_size: PixelSize,
    size_change_in_progress: bool,
}

impl ViewportState {
    pub fn new(window_bounds: LogicalSize, dpi: f32) -> Self {
        let mut v = Self {
            window_bounds,
            dpi: sanitize_dpi(dpi),
            render_target_size: PixelSize::new(1, 1),
            size_change_in_progress: false,
        };
        v.recompute_render_target_size(u32::MAX);
        v
    }

    #[inline]
    pub fn window_bounds(&self) -> LogicalSize {
        self.window_bounds
    }

    #[inline]
    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    #[inline]
    pub fn render_target_size(&self) -> PixelSize {
        self.render_target_size
    }

    #[inline]
    pub fn size_change_in_progress(&self) -> bool {
        self.size_change_in_progress
    }

    /// Ratio of physical pixels to logical units.
    #[inline]
    pub fn scale_factor(&self) -> f32 {
        self.dpi / DEFAULT_DPI
    }

    /// Physical size of the render target in inches, as `(width, height)`.
    pub fn size_in_inches(&self) -> (f32, f32) {
        (
            self.render_target_size.width as f32 / self.dpi,
            self.render_target_size.height as f32 / self.dpi,
        )
    }

    pub(crate) fn set_window_bounds(&mut self, bounds: LogicalSize) {
        self.window_bounds = bounds;
    }

    pub(crate) fn set_dpi(&mut self, dpi: f32) {
        self.dpi = sanitize_dpi(dpi);
    }

    pub(crate) fn set_size_change_in_progress(&mut self, in_progress: bool) {
        self.size_change_in_progress = in_progress;
    }

    pub(crate) fn recompute_render_target_size(&mut self, max_dimension: u32) -> PixelSize {
        let max_dimension = max_dimension.max(1);
        let width = dips_to_pixels(self.window_bounds.width, self.dpi);
        let height = dips_to_pixels(self.window_bounds.height, self.dpi);
        if width > max_dimension || height > max_dimension {
            log::warn!("render target {width}x{height} exceeds the device limit of {max_dimension}; clamping");
        }
        self.render_target_size = PixelSize::new(width.min(max_dimension), height.min(max_dimension));
        self.render_target_size
    }
}

/// Converts logical units to whole pixels, rounding to nearest. Never below one pixel.
pub(crate) fn dips_to_pixels(dips: f32, dpi: f32) -> u32 {
    let px = (dips * dpi / DEFAULT_DPI + 0.5).floor();
    if px.is_finite() && px >= 1.0 { px as u32 } else { 1 }
}

fn sanitize_dpi(dpi: f32) -> f32 {
    if dpi.is_finite() && dpi > 0.0 { dpi } else { DEFAULT_DPI }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dpi_maps_one_to_one() {
        let v = ViewportState::new(LogicalSize::new(1920.0, 1080.0), 96.0);
        assert_eq!(v.render_target_size(), PixelSize::new(1920, 1080));
        assert_eq!(v.size_in_inches(), (20.0, 11.25));
    }

    #[test]
    fn high_dpi_scales_pixels_not_inches() {
        let v = ViewportState::new(LogicalSize::new(960.0, 540.0), 192.0);
        assert_eq!(v.render_target_size(), PixelSize::new(1920, 1080));
        assert_eq!(v.size_in_inches(), (10.0, 5.625));
        assert_eq!(v.scale_factor(), 2.0);
    }

    #[test]
    fn fractional_scale_rounds_to_nearest() {
        assert_eq!(dips_to_pixels(101.0, 144.0), 152); // 151.5
        assert_eq!(dips_to_pixels(100.2, 96.0), 100);
    }

    #[test]
    fn zero_bounds_clamp_to_one_pixel() {
        let v = ViewportState::new(LogicalSize::new(0.0, 0.0), 96.0);
        assert_eq!(v.render_target_size(), PixelSize::new(1, 1));
    }

    #[test]
    fn oversized_targets_are_capped_per_axis() {
        let mut v = ViewportState::new(LogicalSize::new(5000.0, 3000.0), 192.0);
        assert_eq!(v.render_target_size(), PixelSize::new(10000, 6000));

        assert_eq!(v.recompute_render_target_size(8192), PixelSize::new(8192, 6000));
        assert_eq!(v.render_target_size(), PixelSize::new(8192, 6000));
        assert_eq!(v.recompute_render_target_size(0), PixelSize::new(1, 1));
    }

    #[test]
    fn invalid_dpi_falls_back_to_default() {
        let v = ViewportState::new(LogicalSize::new(800.0, 600.0), 0.0);
        assert_eq!(v.dpi(), DEFAULT_DPI);
        assert_eq!(v.render_target_size(), PixelSize::new(800, 600));
    }
}
