use std::path::PathBuf;

use crate::assets::AssetLoader;
use crate::coords::{Color, Viewport};
use crate::device::{
    DeviceError, DeviceLifecycleManager, EyeTarget, FeatureLevel, RendererHooks, ResourceStage,
    ViewportState, WgpuBackend, WgpuDevice,
};
use crate::stereo::Eye;

use super::overlay::{Overlay, TextOverlay, CAPTION};
use super::{CameraRig, ConstantBufferData, CubeScene, EyePass, PerEyeRenderLoop, RenderCtx, RenderTarget};

/// The sample renderer: a rotating textured cube with a caption and hint overlay.
///
/// Plugs into `DeviceLifecycleManager` as its `RendererHooks`, so scene and
/// overlay resources follow the device through loss and resize.
pub struct StereoRenderer {
    assets: Box<dyn AssetLoader>,
    scene: Option<CubeScene>,
    overlay: TextOverlay,
    frame_loop: PerEyeRenderLoop,
}

impl StereoRenderer {
    pub fn new(assets: Box<dyn AssetLoader>, font_path: Option<PathBuf>) -> Self {
        Self {
            assets,
            scene: None,
            overlay: TextOverlay::new(CAPTION, font_path),
            frame_loop: PerEyeRenderLoop::new(CameraRig::default()),
        }
    }

    #[inline]
    pub fn frame_loop(&self) -> &PerEyeRenderLoop {
        &self.frame_loop
    }

    #[inline]
    pub fn frame_loop_mut(&mut self) -> &mut PerEyeRenderLoop {
        &mut self.frame_loop
    }

    #[inline]
    pub fn has_device_resources(&self) -> bool {
        self.scene.is_some()
    }

    /// Draws every active eye into its target. Presenting is left to the caller.
    ///
    /// Returns the number of eyes drawn; zero while device resources are missing.
    pub fn render_frame(
        &mut self,
        manager: &DeviceLifecycleManager<WgpuBackend<'_>>,
        total_seconds: f32,
    ) -> Result<usize, DeviceError> {
        let Some(resources) = manager.resources() else {
            return Ok(0);
        };
        let (Some(scene), Some(depth)) = (self.scene.as_ref(), resources.depth_target()) else {
            return Ok(0);
        };

        let device = resources.device();
        let size = depth.size();
        let ctx = RenderCtx::new(
            device.device(),
            device.queue(),
            device.surface_format(),
            Viewport::new(size.width as f32, size.height as f32),
            manager.viewport().scale_factor(),
        );

        let mut pass = WgpuEyePass {
            device,
            ctx: &ctx,
            scene,
            overlay: &mut self.overlay,
            eye_targets: resources.eye_targets(),
            depth_view: depth.view(),
            encoder: None,
        };
        self.frame_loop.render_frame(&mut pass, total_seconds)
    }
}

impl<'w> RendererHooks<WgpuBackend<'w>> for StereoRenderer {
    fn create_device_independent_resources(&mut self) -> Result<(), DeviceError> {
        self.overlay.load_fonts();
        Ok(())
    }

    fn create_device_resources(
        &mut self,
        device: &WgpuDevice,
        feature_level: FeatureLevel,
    ) -> Result<(), DeviceError> {
        let scene = CubeScene::new(
            device.device(),
            device.queue(),
            device.surface_format(),
            feature_level,
            self.assets.as_ref(),
        )
        .map_err(|e| DeviceError::resource(ResourceStage::Device, e.to_string()))?;

        self.scene = Some(scene);
        self.overlay.create_device_resources(device.device(), device.surface_format());
        Ok(())
    }

    fn release_device_resources(&mut self) {
        self.scene = None;
        self.overlay.release_device_resources();
    }

    fn create_window_size_dependent_resources(
        &mut self,
        viewport: &ViewportState,
        stereo_enabled: bool,
    ) -> Result<(), DeviceError> {
        apply_window_size(&mut self.frame_loop, &mut self.overlay, viewport, stereo_enabled);
        Ok(())
    }
}

fn apply_window_size(
    frame_loop: &mut PerEyeRenderLoop,
    overlay: &mut TextOverlay,
    viewport: &ViewportState,
    stereo_enabled: bool,
) {
    frame_loop.update_for_window_size_change(viewport, stereo_enabled);
    overlay.update_for_window_size_change(viewport.window_bounds().width);
    overlay.set_hint(*frame_loop.hint());
}

/// Records and submits one eye at a time.
///
/// The constant block is shared, so each eye's commands are submitted in
/// `finish_eye` before the next eye overwrites it.
struct WgpuEyePass<'a> {
    device: &'a WgpuDevice,
    ctx: &'a RenderCtx<'a>,
    scene: &'a CubeScene,
    overlay: &'a mut TextOverlay,
    eye_targets: &'a [EyeTarget],
    depth_view: &'a wgpu::TextureView,
    encoder: Option<wgpu::CommandEncoder>,
}

impl<'a> WgpuEyePass<'a> {
    fn eye_view(&self, eye: Eye) -> Result<&'a wgpu::TextureView, DeviceError> {
        let targets: &'a [EyeTarget] = self.eye_targets;
        targets
            .get(eye.index())
            .map(EyeTarget::view)
            .ok_or_else(|| DeviceError::UnexpectedState(format!("no render target for the {eye:?} eye")))
    }

    fn encoder(encoder: &mut Option<wgpu::CommandEncoder>) -> Result<&mut wgpu::CommandEncoder, DeviceError> {
        encoder
            .as_mut()
            .ok_or_else(|| DeviceError::UnexpectedState("eye drawn before its constants".into()))
    }
}

impl EyePass for WgpuEyePass<'_> {
    fn upload_constants(&mut self, eye: Eye, constants: &ConstantBufferData) -> Result<(), DeviceError> {
        if self.device.is_lost() {
            return Err(DeviceError::DeviceLost);
        }

        self.scene.upload_constants(self.ctx.queue, constants);
        self.encoder = Some(self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(match eye {
                Eye::Left => "left eye encoder",
                Eye::Right => "right eye encoder",
            }),
        }));
        Ok(())
    }

    fn draw_scene(&mut self, eye: Eye, clear: Color) -> Result<(), DeviceError> {
        let view = self.eye_view(eye)?;
        let encoder = Self::encoder(&mut self.encoder)?;
        let mut target = RenderTarget::new(encoder, view, Some(self.depth_view));
        self.scene.draw(&mut target, clear);
        Ok(())
    }

    fn draw_overlay(&mut self, eye: Eye) -> Result<(), DeviceError> {
        let view = self.eye_view(eye)?;
        let encoder = Self::encoder(&mut self.encoder)?;
        let mut target = RenderTarget::new(encoder, view, None);
        self.overlay.render(self.ctx, &mut target);
        Ok(())
    }

    fn finish_eye(&mut self, _eye: Eye) -> Result<(), DeviceError> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| DeviceError::UnexpectedState("eye finished twice".into()))?;
        self.ctx.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::EmbeddedAssets;
    use crate::device::LogicalSize;
    use crate::render::{hint_rect, MONO_HINT, STEREO_HINT};

    fn renderer() -> StereoRenderer {
        StereoRenderer::new(Box::new(EmbeddedAssets), None)
    }

    #[test]
    fn window_size_pass_refreshes_frame_loop_and_hint() {
        let mut r = renderer();
        let viewport = ViewportState::new(LogicalSize::new(1280.0, 720.0), 96.0);

        apply_window_size(&mut r.frame_loop, &mut r.overlay, &viewport, true);
        assert!(r.frame_loop().stereo_enabled());
        assert_eq!(r.frame_loop().hint().message, STEREO_HINT);
        assert_eq!(r.frame_loop().hint().rect, hint_rect(1280.0));

        apply_window_size(&mut r.frame_loop, &mut r.overlay, &viewport, false);
        assert_eq!(r.frame_loop().hint().message, MONO_HINT);
    }

    #[test]
    fn starts_without_device_resources() {
        let mut r = renderer();
        assert!(!r.has_device_resources());
        <StereoRenderer as RendererHooks<WgpuBackend<'static>>>::release_device_resources(&mut r);
        assert!(!r.has_device_resources());
    }
}
