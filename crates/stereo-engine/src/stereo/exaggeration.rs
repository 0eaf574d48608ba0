/// Lower bound of the exaggeration factor.
pub const MIN_EXAGGERATION: f32 = 0.0;
/// Upper bound of the exaggeration factor.
pub const MAX_EXAGGERATION: f32 = 2.0;
/// Factor used when nothing has been restored.
pub const DEFAULT_EXAGGERATION: f32 = 1.0;
/// Adjustment applied per arrow-key press.
pub const EXAGGERATION_STEP: f32 = 0.1;

/// Holds the stereo exaggeration factor, always inside
/// `[MIN_EXAGGERATION, MAX_EXAGGERATION]`.
///
/// Out-of-range requests are normal user input and are clamped, never rejected.
/// The controller does not know whether the display is stereo capable; callers
/// gate adjustments on that themselves.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StereoExaggerationController {
    factor: f32,
}

impl StereoExaggerationController {
    pub fn new(initial: f32) -> Self {
        let mut c = Self { factor: DEFAULT_EXAGGERATION };
        c.set(initial);
        c
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.factor
    }

    /// Stores `value` clamped to the valid range. NaN resets to the lower bound.
    pub fn set(&mut self, value: f32) {
        self.factor = if value.is_nan() {
            MIN_EXAGGERATION
        } else {
            value.clamp(MIN_EXAGGERATION, MAX_EXAGGERATION)
        };
    }

    /// Applies `set(get() + delta)` and returns the stored value.
    pub fn adjust_by(&mut self, delta: f32) -> f32 {
        self.set(self.factor + delta);
        self.factor
    }
}

impl Default for StereoExaggerationController {
    fn default() -> Self {
        Self::new(DEFAULT_EXAGGERATION)
    }
}
