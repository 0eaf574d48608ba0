use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize as WinitLogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::assets::{AssetLoader, DirAssetLoader, EmbeddedAssets};
use crate::device::{
    DeviceError, DeviceLifecycleManager, GpuInit, LogicalSize, PresentStatus, WgpuBackend,
    DEFAULT_DPI,
};
use crate::input::platform::winit::translate_key_event;
use crate::input::{command_for_key, StereoCommand};
use crate::render::StereoRenderer;
use crate::settings::{persist_on_suspend, PersistentSettings};
use crate::time::BasicTimer;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: WinitLogicalSize<f64>,
    pub gpu_init: GpuInit,
    /// Overlay font; the system font search runs when unset.
    pub font_path: Option<PathBuf>,
    /// Directory with asset overrides; built-in assets are used when unset.
    pub asset_dir: Option<PathBuf>,
    /// Exaggeration restored from the previous session.
    pub initial_exaggeration: Option<f32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Stereoscopic 3D sample".to_string(),
            initial_size: WinitLogicalSize::new(1280.0, 720.0),
            gpu_init: GpuInit::default(),
            font_path: None,
            asset_dir: None,
            initial_exaggeration: None,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and runs until it closes.
    ///
    /// `settings` receives the exaggeration factor and the clean-exit marker on
    /// suspend and on an orderly close.
    pub fn run(config: RuntimeConfig, settings: Box<dyn PersistentSettings>) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, settings);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    renderer: StereoRenderer,
    timer: BasicTimer,
    occluded: bool,

    window: Window,

    #[borrows(window)]
    #[not_covariant]
    manager: DeviceLifecycleManager<WgpuBackend<'this>>,
}

struct AppState {
    config: RuntimeConfig,
    settings: Box<dyn PersistentSettings>,
    entry: Option<WindowEntry>,
    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, settings: Box<dyn PersistentSettings>) -> Self {
        Self {
            config,
            settings,
            entry: None,
            exit_requested: false,
            fatal: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let assets: Box<dyn AssetLoader> = match &self.config.asset_dir {
            Some(dir) => Box::new(DirAssetLoader::new(dir.clone())),
            None => Box::new(EmbeddedAssets),
        };
        let mut renderer = StereoRenderer::new(assets, self.config.font_path.clone());
        if let Some(v) = self.config.initial_exaggeration {
            renderer.frame_loop_mut().exaggeration_mut().set(v);
        }

        let gpu_init = self.config.gpu_init.clone();
        let mut entry = WindowEntryBuilder {
            renderer,
            timer: BasicTimer::new(),
            occluded: false,
            window,
            manager_builder: |w| DeviceLifecycleManager::new(WgpuBackend::new(w, gpu_init)),
        }
        .build();

        entry
            .with_mut(|fields| {
                let scale = fields.window.scale_factor();
                let bounds = logical_bounds(fields.window.inner_size(), scale);
                fields.manager.initialize(bounds, dpi_for_scale(scale), fields.renderer)
            })
            .context("graphics initialization failed")?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    /// Stores the exaggeration factor and marks the session as cleanly ended.
    fn persist_session(&mut self) {
        let Some(entry) = self.entry.as_ref() else {
            return;
        };
        let exaggeration = entry.with_renderer(|r| r.frame_loop().exaggeration().get());
        if let Err(e) = persist_on_suspend(self.settings.as_mut(), exaggeration) {
            log::warn!("failed to persist session settings: {e}");
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
        self.exit(event_loop);
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        // Drop device resources before the window goes away.
        self.entry = None;
        event_loop.exit();
    }

    /// Runs `f` against the manager and renderer. Device errors end the run.
    fn with_device<F>(&mut self, event_loop: &ActiveEventLoop, what: &str, f: F)
    where
        F: FnOnce(&mut DeviceLifecycleManager<WgpuBackend<'_>>, &mut StereoRenderer) -> Result<(), DeviceError>,
    {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let result = entry.with_mut(|fields| f(fields.manager, fields.renderer));
        if let Err(e) = result {
            self.fail(event_loop, anyhow!(e).context(format!("{what} failed")));
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if *entry.borrow_occluded() {
            return;
        }

        let result = entry.with_mut(|fields| {
            fields.timer.update();
            match fields.renderer.render_frame(fields.manager, fields.timer.total()) {
                Ok(_) => {}
                // Present detects the loss and rebuilds.
                Err(DeviceError::DeviceLost) => log::debug!("device lost while drawing"),
                Err(e) => return Err(e),
            }

            let status = fields.manager.present(fields.renderer)?;
            if status == PresentStatus::DeviceRecovered {
                log::info!("graphics device recovered");
            }
            Ok(())
        });

        match result {
            Ok(()) => entry.with_window(|w| w.request_redraw()),
            Err(e) => self.fail(event_loop, anyhow!(e).context("frame failed")),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.persist_session();
        if let Some(entry) = self.entry.as_mut() {
            entry.with_manager_mut(|m| m.trim());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw while visible; presentation waits for vertical sync.
        // An occluded window sleeps until the next event.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = self.entry.as_ref() {
            if !*entry.borrow_occluded() {
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.persist_session();
                self.exit(event_loop);
            }

            WindowEvent::Resized(size) => {
                let Some(entry) = self.entry.as_ref() else { return; };
                let bounds = entry.with_window(|w| logical_bounds(size, w.scale_factor()));
                self.with_device(event_loop, "resize", |m, r| m.update_for_window_size_change(bounds, r));
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let dpi = dpi_for_scale(scale_factor);
                self.with_device(event_loop, "DPI change", |m, r| m.set_dpi(dpi, r));
            }

            WindowEvent::Moved(_) => {
                self.with_device(event_loop, "display change", |m, r| m.on_display_changed(r).map(|_| ()));
            }

            WindowEvent::Occluded(occluded) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_occluded_mut(|o| *o = occluded);
                    if !occluded {
                        entry.with_window(|w| w.request_redraw());
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                match command_for_key(translate_key_event(&event)) {
                    Some(StereoCommand::AdjustExaggeration(delta)) => {
                        if let Some(entry) = self.entry.as_mut() {
                            entry.with_renderer_mut(|r| r.frame_loop_mut().adjust_exaggeration(delta));
                        }
                    }
                    Some(StereoCommand::Exit) => {
                        self.persist_session();
                        self.exit(event_loop);
                    }
                    None => {}
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

/// Window bounds in logical pixels for a physical inner size.
fn logical_bounds(size: PhysicalSize<u32>, scale_factor: f64) -> LogicalSize {
    let logical = size.to_logical::<f64>(scale_factor);
    LogicalSize::new(logical.width as f32, logical.height as f32)
}

/// Logical DPI for a winit scale factor.
#[inline]
fn dpi_for_scale(scale_factor: f64) -> f32 {
    (scale_factor as f32) * DEFAULT_DPI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_logical() {
        assert_eq!(logical_bounds(PhysicalSize::new(2560, 1440), 2.0), LogicalSize::new(1280.0, 720.0));
        assert_eq!(logical_bounds(PhysicalSize::new(800, 600), 1.0), LogicalSize::new(800.0, 600.0));
    }

    #[test]
    fn dpi_scales_from_96() {
        assert_eq!(dpi_for_scale(1.0), 96.0);
        assert_eq!(dpi_for_scale(1.5), 144.0);
    }

    #[test]
    fn default_config_has_no_overrides() {
        let c = RuntimeConfig::default();
        assert!(c.font_path.is_none());
        assert!(c.asset_dir.is_none());
        assert!(c.initial_exaggeration.is_none());
        assert!(!c.gpu_init.stereo_output.is_stereo());
    }
}
