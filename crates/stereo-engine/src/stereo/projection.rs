use glam::{Mat4, Vec4};

use super::Eye;

/// Assumed distance between the viewer and the physical screen.
pub const DEFAULT_VIEWER_DISTANCE_INCHES: f32 = 24.0;
/// Typical human interocular distance.
pub const DEFAULT_INTEROCULAR_DISTANCE_INCHES: f32 = 1.25;

// Floor for physical extents and world scale so the frustum stays finite.
const MIN_EXTENT: f32 = 1.0e-6;

/// Physical size of the drawable area in inches.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ScreenInches {
    pub width: f32,
    pub height: f32,
}

impl ScreenInches {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Stereo camera parameters expressed in world units.
///
/// Built fresh every frame: exaggeration and viewport may change between frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StereoParameters {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub viewer_distance: f32,
    /// Eye separation, already multiplied by the exaggeration factor.
    pub interocular_distance: f32,
}

impl StereoParameters {
    /// Derives world-space parameters from the physical screen size.
    ///
    /// `world_scale` is inches per world unit and applies uniformly to every axis.
    pub fn new(screen: ScreenInches, world_scale: f32, exaggeration: f32) -> Self {
        let world_scale = sanitize_extent(world_scale);
        Self {
            viewport_width: sanitize_extent(screen.width) / world_scale,
            viewport_height: sanitize_extent(screen.height) / world_scale,
            viewer_distance: DEFAULT_VIEWER_DISTANCE_INCHES / world_scale,
            interocular_distance: DEFAULT_INTEROCULAR_DISTANCE_INCHES / world_scale * exaggeration,
        }
    }

    /// Signed horizontal eye offset: negative for the left eye, positive for the right.
    #[inline]
    pub fn eye_offset(&self, eye: Eye) -> f32 {
        eye.sign() * self.interocular_distance
    }
}

/// Right-handed off-axis perspective projection for one eye (depth range 0..1).
///
/// Compared with a symmetric projection the matrix carries two extra terms: an
/// x-shear proportional to view-space depth and an x-translation. They cancel at
/// the viewer distance, which is the zero-parallax (convergence) plane. With zero
/// interocular distance both terms vanish and the result is the mono frustum.
pub fn stereo_projection_rh(params: &StereoParameters, near_z: f32, far_z: f32, eye: Eye) -> Mat4 {
    let d = params.viewer_distance;
    let x_scale = 2.0 * d / params.viewport_width;
    let y_scale = 2.0 * d / params.viewport_height;

    // `+ 0.0` folds -0.0 into 0.0 so both eyes agree bit-for-bit at zero offset.
    let shear = -params.eye_offset(eye) / params.viewport_width + 0.0;

    debug_assert!(near_z > 0.0 && far_z > near_z, "invalid depth range {near_z}..{far_z}");
    let m22 = far_z / (near_z - far_z);

    Mat4::from_cols(
        Vec4::new(x_scale, 0.0, 0.0, 0.0),
        Vec4::new(0.0, y_scale, 0.0, 0.0),
        Vec4::new(shear, 0.0, m22, -1.0),
        Vec4::new(d * shear, 0.0, near_z * m22, 0.0),
    )
}

/// Computes the projection for `eye` straight from physical inputs.
///
/// Mono rendering calls this with `exaggeration_factor = 0.0`.
pub fn compute_eye_projection(
    screen_width_inches: f32,
    screen_height_inches: f32,
    world_scale: f32,
    exaggeration_factor: f32,
    near_z: f32,
    far_z: f32,
    eye: Eye,
) -> Mat4 {
    let params = StereoParameters::new(
        ScreenInches::new(screen_width_inches, screen_height_inches),
        world_scale,
        exaggeration_factor,
    );
    stereo_projection_rh(&params, near_z, far_z, eye)
}

#[inline]
fn sanitize_extent(v: f32) -> f32 {
    if v.is_finite() { v.max(MIN_EXTENT) } else { MIN_EXTENT }
}
