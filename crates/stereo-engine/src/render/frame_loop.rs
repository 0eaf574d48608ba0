use glam::{Mat4, Vec3};

use crate::coords::{Color, Rect};
use crate::device::{DeviceError, ViewportState};
use crate::stereo::{compute_eye_projection, Eye, StereoExaggerationController};

use super::ConstantBufferData;

/// Background of every eye target.
pub const CLEAR_COLOR: Color = Color { r: 0.071, g: 0.040, b: 0.561, a: 1.0 };

pub const STEREO_HINT: &str = "Press up/down arrow keys to adjust stereo 3D exaggeration effect";
pub const MONO_HINT: &str = "Stereo 3D is not enabled on your system";

// Windows at or below this logical width get the compact hint layout.
const NARROW_WINDOW_WIDTH: f32 = 550.0;

/// Fixed camera looking at the object.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraRig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub near_z: f32,
    pub far_z: f32,
    /// Inches per world unit; 12 means one world unit is one foot.
    pub world_scale: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            near_z: 0.01,
            far_z: 100.0,
            world_scale: 12.0,
        }
    }
}

impl CameraRig {
    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

/// Hint text and where to draw it, in logical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HintText {
    pub message: &'static str,
    pub rect: Rect,
}

/// Message for the current stereo state.
#[inline]
pub fn hint_message(stereo_enabled: bool) -> &'static str {
    if stereo_enabled { STEREO_HINT } else { MONO_HINT }
}

/// Hint rectangle for a window `window_width` logical pixels wide.
pub fn hint_rect(window_width: f32) -> Rect {
    if window_width <= NARROW_WINDOW_WIDTH {
        Rect::from_ltrb(10.0, 10.0, window_width - 10.0, 500.0)
    } else {
        Rect::from_ltrb(100.0, 100.0, 550.0, 380.0)
    }
}

/// GPU work for one eye, in the order the loop issues it.
///
/// Both eyes share one constant block: everything recorded for an eye must be
/// submitted in `finish_eye`, before the next eye's `upload_constants`.
pub trait EyePass {
    fn upload_constants(&mut self, eye: Eye, constants: &ConstantBufferData) -> Result<(), DeviceError>;

    /// Binds the eye target and shared depth buffer, clears both, draws the object.
    fn draw_scene(&mut self, eye: Eye, clear: Color) -> Result<(), DeviceError>;

    /// Draws the caption overlay and then the hint into the eye target.
    fn draw_overlay(&mut self, eye: Eye) -> Result<(), DeviceError>;

    fn finish_eye(&mut self, eye: Eye) -> Result<(), DeviceError>;
}

/// Drives one frame: one or two eyes, each fully rendered before the next.
///
/// Owns the exaggeration factor and everything derived from the window size
/// (mono projection, hint text). Refresh those with
/// `update_for_window_size_change` after every window-size pass.
#[derive(Debug, Clone)]
pub struct PerEyeRenderLoop {
    camera: CameraRig,
    exaggeration: StereoExaggerationController,
    stereo_enabled: bool,
    screen_inches: (f32, f32),
    mono_projection: Mat4,
    hint: HintText,
}

impl PerEyeRenderLoop {
    pub fn new(camera: CameraRig) -> Self {
        Self {
            camera,
            exaggeration: StereoExaggerationController::default(),
            stereo_enabled: false,
            screen_inches: (0.0, 0.0),
            mono_projection: Mat4::IDENTITY,
            hint: HintText {
                message: hint_message(false),
                rect: hint_rect(0.0),
            },
        }
    }

    /// Recomputes the mono projection and hint for the new size and stereo state.
    pub fn update_for_window_size_change(&mut self, viewport: &ViewportState, stereo_enabled: bool) {
        self.stereo_enabled = stereo_enabled;
        self.screen_inches = viewport.size_in_inches();
        self.mono_projection = self.projection(0.0, Eye::Left);
        self.hint = HintText {
            message: hint_message(stereo_enabled),
            rect: hint_rect(viewport.window_bounds().width),
        };
    }

    /// Renders every active eye. Returns the number of eyes rendered.
    ///
    /// The caller presents once afterwards. An error aborts the frame; eyes not
    /// yet started are skipped.
    pub fn render_frame<P: EyePass>(&self, pass: &mut P, total_seconds: f32) -> Result<usize, DeviceError> {
        let eyes = Eye::active(self.stereo_enabled);
        for &eye in eyes {
            let constants = self.eye_constants(eye, total_seconds);
            pass.upload_constants(eye, &constants)?;
            pass.draw_scene(eye, CLEAR_COLOR)?;
            pass.draw_overlay(eye)?;
            pass.finish_eye(eye)?;
        }
        Ok(eyes.len())
    }

    /// Transforms for `eye` at `total_seconds`.
    ///
    /// The model matrix depends only on time, so both eyes of a frame agree on it.
    pub fn eye_constants(&self, eye: Eye, total_seconds: f32) -> ConstantBufferData {
        let projection = if self.stereo_enabled {
            self.projection(self.exaggeration.get(), eye)
        } else {
            self.mono_projection
        };

        ConstantBufferData {
            model: Mat4::from_rotation_y(total_seconds),
            view: self.camera.view(),
            projection,
        }
    }

    /// Applies an exaggeration step from user input. Ignored on a mono display.
    ///
    /// Returns whether the factor was adjusted.
    pub fn adjust_exaggeration(&mut self, delta: f32) -> bool {
        if !self.stereo_enabled {
            return false;
        }
        let before = self.exaggeration.get();
        let after = self.exaggeration.adjust_by(delta);
        log::debug!("stereo exaggeration {before:.2} -> {after:.2}");
        true
    }

    #[inline]
    pub fn exaggeration(&self) -> &StereoExaggerationController {
        &self.exaggeration
    }

    #[inline]
    pub fn exaggeration_mut(&mut self) -> &mut StereoExaggerationController {
        &mut self.exaggeration
    }

    #[inline]
    pub fn stereo_enabled(&self) -> bool {
        self.stereo_enabled
    }

    #[inline]
    pub fn hint(&self) -> &HintText {
        &self.hint
    }

    #[inline]
    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    fn projection(&self, exaggeration: f32, eye: Eye) -> Mat4 {
        let (w, h) = self.screen_inches;
        compute_eye_projection(
            w,
            h,
            self.camera.world_scale,
            exaggeration,
            self.camera.near_z,
            self.camera.far_z,
            eye,
        )
    }
}

impl Default for PerEyeRenderLoop {
    fn default() -> Self {
        Self::new(CameraRig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::LogicalSize;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Upload(Eye, ConstantBufferData),
        Scene(Eye, Color),
        Overlay(Eye),
        Finish(Eye),
    }

    #[derive(Default)]
    struct RecordingPass {
        calls: Vec<Call>,
        fail_scene_for: Option<Eye>,
    }

    impl EyePass for RecordingPass {
        fn upload_constants(&mut self, eye: Eye, c: &ConstantBufferData) -> Result<(), DeviceError> {
            self.calls.push(Call::Upload(eye, *c));
            Ok(())
        }

        fn draw_scene(&mut self, eye: Eye, clear: Color) -> Result<(), DeviceError> {
            if self.fail_scene_for == Some(eye) {
                return Err(DeviceError::DeviceLost);
            }
            self.calls.push(Call::Scene(eye, clear));
            Ok(())
        }

        fn draw_overlay(&mut self, eye: Eye) -> Result<(), DeviceError> {
            self.calls.push(Call::Overlay(eye));
            Ok(())
        }

        fn finish_eye(&mut self, eye: Eye) -> Result<(), DeviceError> {
            self.calls.push(Call::Finish(eye));
            Ok(())
        }
    }

    fn frame_loop(stereo: bool) -> PerEyeRenderLoop {
        let mut l = PerEyeRenderLoop::default();
        l.update_for_window_size_change(&ViewportState::new(LogicalSize::new(1920.0, 1080.0), 96.0), stereo);
        l
    }

    fn uploads(pass: &RecordingPass) -> Vec<(Eye, ConstantBufferData)> {
        pass.calls
            .iter()
            .filter_map(|c| match c {
                Call::Upload(eye, data) => Some((*eye, *data)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn mono_renders_left_eye_once_with_mono_projection() {
        let l = frame_loop(false);
        let mut pass = RecordingPass::default();

        assert_eq!(l.render_frame(&mut pass, 1.0).unwrap(), 1);

        let ups = uploads(&pass);
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].0, Eye::Left);
        assert_eq!(
            ups[0].1.projection,
            compute_eye_projection(20.0, 11.25, 12.0, 0.0, 0.01, 100.0, Eye::Left)
        );
    }

    #[test]
    fn stereo_finishes_left_eye_before_right_constants() {
        let l = frame_loop(true);
        let mut pass = RecordingPass::default();

        assert_eq!(l.render_frame(&mut pass, 0.5).unwrap(), 2);

        let order: Vec<_> = pass
            .calls
            .iter()
            .map(|c| match c {
                Call::Upload(e, _) => ("upload", *e),
                Call::Scene(e, _) => ("scene", *e),
                Call::Overlay(e) => ("overlay", *e),
                Call::Finish(e) => ("finish", *e),
            })
            .collect();
        assert_eq!(
            order,
            [
                ("upload", Eye::Left),
                ("scene", Eye::Left),
                ("overlay", Eye::Left),
                ("finish", Eye::Left),
                ("upload", Eye::Right),
                ("scene", Eye::Right),
                ("overlay", Eye::Right),
                ("finish", Eye::Right),
            ]
        );
    }

    #[test]
    fn both_eyes_share_model_and_view() {
        let l = frame_loop(true);
        let mut pass = RecordingPass::default();
        l.render_frame(&mut pass, 2.25).unwrap();

        let ups = uploads(&pass);
        assert_eq!(ups[0].1.model, ups[1].1.model);
        assert_eq!(ups[0].1.view, ups[1].1.view);
        assert_ne!(ups[0].1.projection, ups[1].1.projection);
        assert_eq!(ups[0].1.model, Mat4::from_rotation_y(2.25));
    }

    #[test]
    fn zero_exaggeration_stereo_eyes_match() {
        let mut l = frame_loop(true);
        l.exaggeration_mut().set(0.0);
        assert_eq!(l.eye_constants(Eye::Left, 1.0), l.eye_constants(Eye::Right, 1.0));
    }

    #[test]
    fn every_eye_clears_to_background() {
        let l = frame_loop(true);
        let mut pass = RecordingPass::default();
        l.render_frame(&mut pass, 0.0).unwrap();
        let clears: Vec<_> = pass.calls.iter().filter(|c| matches!(c, Call::Scene(..))).collect();
        assert_eq!(clears.len(), 2);
        assert!(clears.iter().all(|c| matches!(c, Call::Scene(_, color) if *color == CLEAR_COLOR)));
    }

    #[test]
    fn failure_aborts_remaining_eyes() {
        let l = frame_loop(true);
        let mut pass = RecordingPass { fail_scene_for: Some(Eye::Left), ..Default::default() };
        assert_eq!(l.render_frame(&mut pass, 0.0), Err(DeviceError::DeviceLost));
        assert_eq!(uploads(&pass).len(), 1);
    }

    #[test]
    fn exaggeration_input_is_gated_on_stereo() {
        let mut mono = frame_loop(false);
        assert!(!mono.adjust_exaggeration(0.1));
        assert_eq!(mono.exaggeration().get(), 1.0);

        let mut stereo = frame_loop(true);
        assert!(stereo.adjust_exaggeration(0.1));
        assert!((stereo.exaggeration().get() - 1.1).abs() < 1.0e-6);
    }

    #[test]
    fn hint_rect_depends_on_window_width() {
        assert_eq!(hint_rect(550.0), Rect::from_ltrb(10.0, 10.0, 540.0, 500.0));
        assert_eq!(hint_rect(320.0), Rect::from_ltrb(10.0, 10.0, 310.0, 500.0));
        assert_eq!(hint_rect(551.0), Rect::from_ltrb(100.0, 100.0, 550.0, 380.0));
        assert_eq!(hint_rect(1920.0), Rect::new(100.0, 100.0, 450.0, 280.0));
    }

    #[test]
    fn hint_follows_stereo_state() {
        assert_eq!(frame_loop(true).hint().message, STEREO_HINT);
        assert_eq!(frame_loop(false).hint().message, MONO_HINT);

        let mut l = frame_loop(true);
        l.update_for_window_size_change(&ViewportState::new(LogicalSize::new(400.0, 300.0), 96.0), false);
        assert_eq!(l.hint().message, MONO_HINT);
        assert_eq!(l.hint().rect, hint_rect(400.0));
        assert!(!l.stereo_enabled());
    }
}
