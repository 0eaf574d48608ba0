use crate::stereo::Eye;

use super::{
    DeviceError, FeatureLevel, GpuBackend, LogicalSize, PresentOutcome, PresentStatus,
    ViewportState, DEFAULT_DPI,
};

/// Lifecycle of the device resources.
///
/// `DeviceLost` is transient: the manager moves through it while rebuilding and
/// leaves it before control returns to the caller.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LifecycleState {
    Uninitialized,
    DeviceIndependentResourcesReady,
    DeviceResourcesReady,
    WindowSizeResourcesReady,
    DeviceLost,
}

/// Resource-creation callbacks supplied by the concrete renderer.
///
/// The manager calls them in lifecycle order, after its own resources for the
/// same stage exist. Anything created in `create_device_resources` belongs to the
/// current device and must be dropped in `release_device_resources`.
pub trait RendererHooks<B: GpuBackend> {
    fn create_device_independent_resources(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn create_device_resources(
        &mut self,
        device: &B::Device,
        feature_level: FeatureLevel,
    ) -> Result<(), DeviceError>;

    fn release_device_resources(&mut self);

    fn create_window_size_dependent_resources(
        &mut self,
        viewport: &ViewportState,
        stereo_enabled: bool,
    ) -> Result<(), DeviceError>;
}

/// One generation of device-dependent resources.
///
/// Fields drop in declaration order: views, then the swap chain, then the device.
pub struct DeviceResourceBundle<B: GpuBackend> {
    eye_targets: Vec<B::ColorTarget>,
    depth_target: Option<B::DepthTarget>,
    swap_chain: Option<B::SwapChain>,
    device: B::Device,
    feature_level: FeatureLevel,
}

impl<B: GpuBackend> DeviceResourceBundle<B> {
    #[inline]
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    #[inline]
    pub fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    #[inline]
    pub fn swap_chain(&self) -> Option<&B::SwapChain> {
        self.swap_chain.as_ref()
    }

    /// Render target for `eye`, if that eye is active.
    #[inline]
    pub fn eye_target(&self, eye: Eye) -> Option<&B::ColorTarget> {
        self.eye_targets.get(eye.index())
    }

    #[inline]
    pub fn eye_targets(&self) -> &[B::ColorTarget] {
        &self.eye_targets
    }

    #[inline]
    pub fn depth_target(&self) -> Option<&B::DepthTarget> {
        self.depth_target.as_ref()
    }

    fn release_views(&mut self) {
        self.eye_targets.clear();
        self.depth_target = None;
    }
}

/// Owns the GPU device, swap chain, per-eye render targets and depth buffer.
///
/// Every other component borrows these per call. References must not be kept
/// across `present()`, `update_for_window_size_change()`, `set_dpi()` or
/// `on_display_changed()`: any of them may rebuild the resources.
/// `device_generation()` changes whenever the device is recreated.
pub struct DeviceLifecycleManager<B: GpuBackend> {
    backend: B,
    state: LifecycleState,
    viewport: ViewportState,
    bundle: Option<DeviceResourceBundle<B>>,
    stereo_enabled: bool,
    device_generation: u64,
    recovering: bool,
}

impl<B: GpuBackend> DeviceLifecycleManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: LifecycleState::Uninitialized,
            viewport: ViewportState::new(LogicalSize::default(), DEFAULT_DPI),
            bundle: None,
            stereo_enabled: false,
            device_generation: 0,
            recovering: false,
        }
    }

    /// Builds device-independent, device and window-size resources, in that order.
    pub fn initialize<H: RendererHooks<B>>(
        &mut self,
        window_bounds: LogicalSize,
        dpi: f32,
        hooks: &mut H,
    ) -> Result<(), DeviceError> {
        if self.state != LifecycleState::Uninitialized {
            return Err(DeviceError::UnexpectedState(format!(
                "initialize called in state {:?}",
                self.state
            )));
        }

        self.viewport = ViewportState::new(window_bounds, dpi);

        self.backend.create_device_independent_resources()?;
        hooks.create_device_independent_resources()?;
        self.transition(LifecycleState::DeviceIndependentResourcesReady);

        self.create_device_resources(hooks)?;
        self.create_window_size_dependent_resources(hooks)
    }

    /// Creates a new device generation, releasing the previous one first.
    ///
    /// Leaves the manager in `DeviceResourcesReady`; window-size resources must
    /// be created afterwards.
    pub fn create_device_resources<H: RendererHooks<B>>(
        &mut self,
        hooks: &mut H,
    ) -> Result<(), DeviceError> {
        if self.state == LifecycleState::Uninitialized {
            return Err(DeviceError::UnexpectedState(
                "device resources requested before device-independent resources".into(),
            ));
        }

        self.release_device_resources(hooks);

        let (device, feature_level) = self.backend.create_device()?;
        self.stereo_enabled = self.backend.stereo_supported(&device);
        self.device_generation += 1;

        log::info!(
            "device created (generation {}, {:?}, stereo {})",
            self.device_generation,
            feature_level,
            if self.stereo_enabled { "supported" } else { "unsupported" },
        );

        let bundle = self.bundle.insert(DeviceResourceBundle {
            eye_targets: Vec::with_capacity(Eye::ALL.len()),
            depth_target: None,
            swap_chain: None,
            device,
            feature_level,
        });

        hooks.create_device_resources(&bundle.device, feature_level)?;
        self.transition(LifecycleState::DeviceResourcesReady);
        Ok(())
    }

    /// (Re)builds the swap chain buffers, eye render targets and depth buffer at
    /// the size derived from the current window bounds and DPI.
    ///
    /// Prior views are released before new ones are created, so repeated calls
    /// with unchanged inputs leave the same set of resources behind.
    pub fn create_window_size_dependent_resources<H: RendererHooks<B>>(
        &mut self,
        hooks: &mut H,
    ) -> Result<(), DeviceError> {
        self.viewport.set_size_change_in_progress(true);
        let result = self.build_window_size_resources(hooks);
        self.viewport.set_size_change_in_progress(false);
        result
    }

    fn build_window_size_resources<H: RendererHooks<B>>(
        &mut self,
        hooks: &mut H,
    ) -> Result<(), DeviceError> {
        if self.bundle.is_none() {
            return Err(DeviceError::UnexpectedState(
                "window-size resources requested without a device".into(),
            ));
        }

        // Not presentable again until every target below exists.
        self.transition(LifecycleState::DeviceResourcesReady);

        let Some(bundle) = self.bundle.as_mut() else {
            return Err(DeviceError::UnexpectedState("device vanished during resize".into()));
        };

        let max_dimension = self.backend.max_target_dimension(&bundle.device);
        let size = self.viewport.recompute_render_target_size(max_dimension);
        let stereo = self.stereo_enabled;

        bundle.release_views();

        let swap_result = match bundle.swap_chain.take() {
            Some(mut swap_chain) => {
                let r = self.backend.resize_swap_chain(&bundle.device, &mut swap_chain, size, stereo);
                bundle.swap_chain = Some(swap_chain);
                r
            }
            None => self
                .backend
                .create_swap_chain(&bundle.device, size, stereo)
                .map(|swap_chain| bundle.swap_chain = Some(swap_chain)),
        };

        match swap_result {
            Ok(()) => {}
            Err(DeviceError::DeviceLost) => return self.handle_device_lost(hooks),
            Err(e) => return Err(e),
        }

        let swap_chain = bundle.swap_chain.as_ref().ok_or_else(|| {
            DeviceError::UnexpectedState("swap chain missing after creation".into())
        })?;

        for &eye in Eye::active(stereo) {
            let target = self.backend.create_color_target(&bundle.device, swap_chain, eye, size)?;
            bundle.eye_targets.push(target);
        }
        bundle.depth_target = Some(self.backend.create_depth_target(&bundle.device, size)?);

        debug_assert!(bundle.eye_targets.iter().all(|t| B::color_target_size(t) == size));
        debug_assert!(bundle.depth_target.as_ref().is_some_and(|d| B::depth_target_size(d) == size));

        log::debug!(
            "window-size resources: {}x{} px, {} eye target(s)",
            size.width,
            size.height,
            bundle.eye_targets.len()
        );

        hooks.create_window_size_dependent_resources(&self.viewport, stereo)?;
        self.transition(LifecycleState::WindowSizeResourcesReady);
        Ok(())
    }

    /// Applies new window bounds and rebuilds window-size resources if they changed.
    pub fn update_for_window_size_change<H: RendererHooks<B>>(
        &mut self,
        window_bounds: LogicalSize,
        hooks: &mut H,
    ) -> Result<(), DeviceError> {
        if window_bounds == self.viewport.window_bounds() {
            return Ok(());
        }
        self.viewport.set_window_bounds(window_bounds);
        self.rebuild_if_ready(hooks)
    }

    /// Applies a new logical DPI and rebuilds window-size resources if it changed.
    pub fn set_dpi<H: RendererHooks<B>>(&mut self, dpi: f32, hooks: &mut H) -> Result<(), DeviceError> {
        if dpi == self.viewport.dpi() {
            return Ok(());
        }
        self.viewport.set_dpi(dpi);
        self.rebuild_if_ready(hooks)
    }

    /// Re-queries display stereo support; rebuilds window-size resources when it
    /// changed. Returns whether it changed.
    pub fn on_display_changed<H: RendererHooks<B>>(&mut self, hooks: &mut H) -> Result<bool, DeviceError> {
        let Some(bundle) = self.bundle.as_ref() else {
            return Ok(false);
        };

        let supported = self.backend.stereo_supported(&bundle.device);
        if supported == self.stereo_enabled {
            return Ok(false);
        }

        log::info!("display stereo support changed: {} -> {}", self.stereo_enabled, supported);
        self.stereo_enabled = supported;
        self.rebuild_if_ready(hooks)?;
        Ok(true)
    }

    /// Presents the rendered eye targets, synchronized to vertical sync.
    ///
    /// A lost device is rebuilt here, synchronously, before returning
    /// `PresentStatus::DeviceRecovered`.
    pub fn present<H: RendererHooks<B>>(&mut self, hooks: &mut H) -> Result<PresentStatus, DeviceError> {
        if self.state != LifecycleState::WindowSizeResourcesReady {
            return Err(DeviceError::UnexpectedState(format!(
                "present called in state {:?}",
                self.state
            )));
        }

        let Some(bundle) = self.bundle.as_mut() else {
            return Err(DeviceError::UnexpectedState("present without a device".into()));
        };
        let Some(swap_chain) = bundle.swap_chain.as_mut() else {
            return Err(DeviceError::UnexpectedState("present without a swap chain".into()));
        };

        match self.backend.present(&bundle.device, swap_chain, &bundle.eye_targets) {
            Ok(PresentOutcome::Presented) => Ok(PresentStatus::Presented),
            Ok(PresentOutcome::Skipped) => Ok(PresentStatus::Skipped),
            Err(DeviceError::DeviceLost) => {
                self.handle_device_lost(hooks)?;
                Ok(PresentStatus::DeviceRecovered)
            }
            Err(e) => Err(e),
        }
    }

    /// Hints the driver to release idle memory. Resources needed to resume stay alive.
    pub fn trim(&mut self) {
        if let Some(bundle) = self.bundle.as_ref() {
            self.backend.trim(&bundle.device);
            log::debug!("device memory trimmed");
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    /// Whether frames are rendered for two eyes.
    #[inline]
    pub fn stereo_enabled(&self) -> bool {
        self.stereo_enabled
    }

    #[inline]
    pub fn device_generation(&self) -> u64 {
        self.device_generation
    }

    #[inline]
    pub fn resources(&self) -> Option<&DeviceResourceBundle<B>> {
        self.bundle.as_ref()
    }

    #[inline]
    pub fn device(&self) -> Option<&B::Device> {
        self.bundle.as_ref().map(|b| &b.device)
    }

    #[inline]
    pub fn feature_level(&self) -> Option<FeatureLevel> {
        self.bundle.as_ref().map(|b| b.feature_level)
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn rebuild_if_ready<H: RendererHooks<B>>(&mut self, hooks: &mut H) -> Result<(), DeviceError> {
        if self.bundle.is_none() {
            return Ok(());
        }
        self.create_window_size_dependent_resources(hooks)
    }

    fn release_device_resources<H: RendererHooks<B>>(&mut self, hooks: &mut H) {
        if let Some(mut bundle) = self.bundle.take() {
            hooks.release_device_resources();
            bundle.release_views();
            drop(bundle);
        }
    }

    fn handle_device_lost<H: RendererHooks<B>>(&mut self, hooks: &mut H) -> Result<(), DeviceError> {
        if self.recovering {
            log::error!("device lost again while recovering");
            return Err(DeviceError::DeviceLost);
        }

        log::warn!("graphics device lost (generation {}); rebuilding", self.device_generation);
        self.transition(LifecycleState::DeviceLost);

        self.recovering = true;
        let result = self
            .create_device_resources(hooks)
            .and_then(|()| self.create_window_size_dependent_resources(hooks));
        self.recovering = false;

        if result.is_ok() {
            log::info!("device recovered (generation {})", self.device_generation);
        }
        result
    }

    fn transition(&mut self, next: LifecycleState) {
        if self.state != next {
            log::debug!("device lifecycle: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::device::{PixelSize, ResourceStage};

    // ── mock backend ──────────────────────────────────────────────────────

    /// Any GPU object; counts itself in `live` until dropped.
    struct Handle {
        live: Rc<Cell<i64>>,
        size: PixelSize,
    }

    impl Handle {
        fn new(live: &Rc<Cell<i64>>, size: PixelSize) -> Self {
            live.set(live.get() + 1);
            Self { live: live.clone(), size }
        }
    }

    impl Drop for Handle {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    #[derive(Default)]
    struct MockBackend {
        live: Rc<Cell<i64>>,
        stereo: bool,
        fail_device: bool,
        fail_depth: bool,
        max_dimension: Option<u32>,
        lose_next_present: bool,
        lose_next_resize: bool,
        lose_swap_chain_create: bool,
        independent_created: u32,
        devices_created: u32,
        swap_chains_created: u32,
        resizes: u32,
        presents: u32,
        trims: u32,
    }

    impl GpuBackend for MockBackend {
        type Device = Handle;
        type SwapChain = Handle;
        type ColorTarget = Handle;
        type DepthTarget = Handle;

        fn create_device_independent_resources(&mut self) -> Result<(), DeviceError> {
            self.independent_created += 1;
            Ok(())
        }

        fn create_device(&mut self) -> Result<(Handle, FeatureLevel), DeviceError> {
            if self.fail_device {
                return Err(DeviceError::DeviceCreationFailed("no adapter".into()));
            }
            self.devices_created += 1;
            Ok((Handle::new(&self.live, PixelSize::default()), FeatureLevel::Core))
        }

        fn stereo_supported(&self, _device: &Handle) -> bool {
            self.stereo
        }

        fn max_target_dimension(&self, _device: &Handle) -> u32 {
            self.max_dimension.unwrap_or(u32::MAX)
        }

        fn create_swap_chain(&mut self, _: &Handle, size: PixelSize, _: bool) -> Result<Handle, DeviceError> {
            if self.lose_swap_chain_create {
                return Err(DeviceError::DeviceLost);
            }
            self.swap_chains_created += 1;
            Ok(Handle::new(&self.live, size))
        }

        fn resize_swap_chain(
            &mut self,
            _: &Handle,
            swap_chain: &mut Handle,
            size: PixelSize,
            _: bool,
        ) -> Result<(), DeviceError> {
            if std::mem::take(&mut self.lose_next_resize) {
                return Err(DeviceError::DeviceLost);
            }
            self.resizes += 1;
            swap_chain.size = size;
            Ok(())
        }

        fn create_color_target(&mut self, _: &Handle, _: &Handle, _: Eye, size: PixelSize) -> Result<Handle, DeviceError> {
            Ok(Handle::new(&self.live, size))
        }

        fn create_depth_target(&mut self, _: &Handle, size: PixelSize) -> Result<Handle, DeviceError> {
            if self.fail_depth {
                return Err(DeviceError::resource(ResourceStage::WindowSize, "depth allocation"));
            }
            Ok(Handle::new(&self.live, size))
        }

        fn color_target_size(target: &Handle) -> PixelSize {
            target.size
        }

        fn depth_target_size(target: &Handle) -> PixelSize {
            target.size
        }

        fn present(&mut self, _: &Handle, _: &mut Handle, _: &[Handle]) -> Result<PresentOutcome, DeviceError> {
            if std::mem::take(&mut self.lose_next_present) {
                return Err(DeviceError::DeviceLost);
            }
            self.presents += 1;
            Ok(PresentOutcome::Presented)
        }

        fn trim(&mut self, _: &Handle) {
            self.trims += 1;
        }
    }

    // ── recording hooks ───────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingHooks {
        calls: Vec<&'static str>,
        last_size: Option<PixelSize>,
        last_stereo: Option<bool>,
        device_resources_alive: bool,
    }

    impl RendererHooks<MockBackend> for RecordingHooks {
        fn create_device_independent_resources(&mut self) -> Result<(), DeviceError> {
            self.calls.push("independent");
            Ok(())
        }

        fn create_device_resources(&mut self, _: &Handle, _: FeatureLevel) -> Result<(), DeviceError> {
            assert!(!self.device_resources_alive, "previous generation not released");
            self.device_resources_alive = true;
            self.calls.push("device");
            Ok(())
        }

        fn release_device_resources(&mut self) {
            self.device_resources_alive = false;
            self.calls.push("release");
        }

        fn create_window_size_dependent_resources(
            &mut self,
            viewport: &ViewportState,
            stereo_enabled: bool,
        ) -> Result<(), DeviceError> {
            assert!(viewport.size_change_in_progress());
            self.calls.push("window");
            self.last_size = Some(viewport.render_target_size());
            self.last_stereo = Some(stereo_enabled);
            Ok(())
        }
    }

    fn manager(stereo: bool) -> (DeviceLifecycleManager<MockBackend>, RecordingHooks) {
        let backend = MockBackend { stereo, ..Default::default() };
        let mut mgr = DeviceLifecycleManager::new(backend);
        let mut hooks = RecordingHooks::default();
        mgr.initialize(LogicalSize::new(1920.0, 1080.0), 96.0, &mut hooks)
            .expect("initialize");
        (mgr, hooks)
    }

    fn assert_targets_match_viewport(mgr: &DeviceLifecycleManager<MockBackend>) {
        let size = mgr.viewport().render_target_size();
        let res = mgr.resources().expect("resources");
        assert!(!res.eye_targets().is_empty());
        for t in res.eye_targets() {
            assert_eq!(t.size, size);
        }
        assert_eq!(res.depth_target().expect("depth").size, size);
        assert_eq!(res.swap_chain().expect("swap chain").size, size);
    }

    // ── initialization ────────────────────────────────────────────────────

    #[test]
    fn initialize_runs_stages_in_order() {
        let (mgr, hooks) = manager(false);
        assert_eq!(hooks.calls, ["independent", "device", "window"]);
        assert_eq!(mgr.state(), LifecycleState::WindowSizeResourcesReady);
        assert_eq!(mgr.device_generation(), 1);
        assert!(!mgr.viewport().size_change_in_progress());
        assert_targets_match_viewport(&mgr);
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let (mut mgr, mut hooks) = manager(false);
        let err = mgr.initialize(LogicalSize::new(10.0, 10.0), 96.0, &mut hooks).unwrap_err();
        assert!(matches!(err, DeviceError::UnexpectedState(_)));
    }

    #[test]
    fn mono_display_gets_one_eye_target() {
        let (mgr, hooks) = manager(false);
        let res = mgr.resources().unwrap();
        assert_eq!(res.eye_targets().len(), 1);
        assert!(res.eye_target(Eye::Right).is_none());
        assert_eq!(hooks.last_stereo, Some(false));
    }

    #[test]
    fn stereo_display_gets_two_eye_targets() {
        let (mgr, hooks) = manager(true);
        let res = mgr.resources().unwrap();
        assert_eq!(res.eye_targets().len(), 2);
        assert!(res.eye_target(Eye::Right).is_some());
        assert!(mgr.stereo_enabled());
        assert_eq!(hooks.last_stereo, Some(true));
    }

    #[test]
    fn device_creation_failure_is_fatal_and_not_retried() {
        let backend = MockBackend { fail_device: true, ..Default::default() };
        let mut mgr = DeviceLifecycleManager::new(backend);
        let mut hooks = RecordingHooks::default();

        let err = mgr
            .initialize(LogicalSize::new(800.0, 600.0), 96.0, &mut hooks)
            .unwrap_err();

        assert!(matches!(err, DeviceError::DeviceCreationFailed(_)));
        assert!(!err.is_recoverable());
        assert_eq!(mgr.state(), LifecycleState::DeviceIndependentResourcesReady);
        assert_eq!(mgr.backend().devices_created, 0);
        assert!(mgr.resources().is_none());
    }

    #[test]
    fn resource_failure_aborts_stage() {
        let backend = MockBackend { fail_depth: true, ..Default::default() };
        let mut mgr = DeviceLifecycleManager::new(backend);
        let mut hooks = RecordingHooks::default();

        let err = mgr
            .initialize(LogicalSize::new(800.0, 600.0), 96.0, &mut hooks)
            .unwrap_err();

        assert_eq!(
            err,
            DeviceError::ResourceCreationFailed {
                stage: ResourceStage::WindowSize,
                reason: "depth allocation".into(),
            }
        );
        assert_eq!(mgr.state(), LifecycleState::DeviceResourcesReady);
        assert!(!mgr.viewport().size_change_in_progress());
        assert!(!hooks.calls.contains(&"window"));
    }

    #[test]
    fn failed_resize_blocks_present_until_rebuilt() {
        let (mut mgr, mut hooks) = manager(true);
        mgr.backend_mut().fail_depth = true;

        let err = mgr
            .update_for_window_size_change(LogicalSize::new(1280.0, 720.0), &mut hooks)
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::ResourceCreationFailed { stage: ResourceStage::WindowSize, .. }
        ));
        assert_eq!(mgr.state(), LifecycleState::DeviceResourcesReady);
        assert!(matches!(mgr.present(&mut hooks), Err(DeviceError::UnexpectedState(_))));
        assert_eq!(mgr.backend().presents, 0);

        mgr.backend_mut().fail_depth = false;
        mgr.create_window_size_dependent_resources(&mut hooks).unwrap();
        assert_eq!(mgr.state(), LifecycleState::WindowSizeResourcesReady);
        assert_targets_match_viewport(&mgr);
        assert_eq!(mgr.present(&mut hooks).unwrap(), PresentStatus::Presented);
    }

    // ── window size ───────────────────────────────────────────────────────

    #[test]
    fn render_targets_are_clamped_to_device_limit() {
        let (mut mgr, mut hooks) = manager(false);
        mgr.backend_mut().max_dimension = Some(2048);

        mgr.update_for_window_size_change(LogicalSize::new(4000.0, 1000.0), &mut hooks)
            .unwrap();

        assert_eq!(mgr.viewport().render_target_size(), PixelSize::new(2048, 1000));
        assert_eq!(hooks.last_size, Some(PixelSize::new(2048, 1000)));
        assert_targets_match_viewport(&mgr);
    }

    #[test]
    fn window_size_creation_is_idempotent() {
        let (mut mgr, mut hooks) = manager(true);
        let live_before = mgr.backend().live.get();
        let size_before = mgr.viewport().render_target_size();

        mgr.create_window_size_dependent_resources(&mut hooks).unwrap();
        mgr.create_window_size_dependent_resources(&mut hooks).unwrap();

        assert_eq!(mgr.backend().live.get(), live_before);
        assert_eq!(mgr.viewport().render_target_size(), size_before);
        assert_eq!(mgr.backend().swap_chains_created, 1);
        assert_eq!(mgr.resources().unwrap().eye_targets().len(), 2);
        assert_targets_match_viewport(&mgr);
    }

    #[test]
    fn resize_rebuilds_targets_at_new_size() {
        let (mut mgr, mut hooks) = manager(true);
        mgr.update_for_window_size_change(LogicalSize::new(1280.0, 720.0), &mut hooks)
            .unwrap();

        assert_eq!(mgr.viewport().render_target_size(), PixelSize::new(1280, 720));
        assert_eq!(hooks.last_size, Some(PixelSize::new(1280, 720)));
        assert_eq!(mgr.backend().resizes, 1);
        assert_targets_match_viewport(&mgr);
    }

    #[test]
    fn unchanged_bounds_do_nothing() {
        let (mut mgr, mut hooks) = manager(false);
        let calls = hooks.calls.len();
        mgr.update_for_window_size_change(LogicalSize::new(1920.0, 1080.0), &mut hooks)
            .unwrap();
        assert_eq!(hooks.calls.len(), calls);
        assert_eq!(mgr.backend().resizes, 0);
    }

    #[test]
    fn dpi_change_rescales_render_targets() {
        let (mut mgr, mut hooks) = manager(false);
        mgr.set_dpi(192.0, &mut hooks).unwrap();

        assert_eq!(mgr.viewport().render_target_size(), PixelSize::new(3840, 2160));
        assert_targets_match_viewport(&mgr);

        let resizes = mgr.backend().resizes;
        mgr.set_dpi(192.0, &mut hooks).unwrap();
        assert_eq!(mgr.backend().resizes, resizes);
    }

    #[test]
    fn resize_before_initialize_only_records_bounds() {
        let mut mgr = DeviceLifecycleManager::new(MockBackend::default());
        let mut hooks = RecordingHooks::default();
        mgr.update_for_window_size_change(LogicalSize::new(640.0, 480.0), &mut hooks)
            .unwrap();
        assert!(hooks.calls.is_empty());
        assert_eq!(mgr.state(), LifecycleState::Uninitialized);
    }

    // ── device loss ───────────────────────────────────────────────────────

    #[test]
    fn device_loss_at_present_rebuilds_everything_but_independent() {
        let (mut mgr, mut hooks) = manager(true);
        mgr.update_for_window_size_change(LogicalSize::new(1024.0, 768.0), &mut hooks)
            .unwrap();
        hooks.calls.clear();
        let live_before = mgr.backend().live.get();

        mgr.backend_mut().lose_next_present = true;
        let status = mgr.present(&mut hooks).unwrap();

        assert_eq!(status, PresentStatus::DeviceRecovered);
        assert_eq!(hooks.calls, ["release", "device", "window"]);
        assert_eq!(mgr.backend().independent_created, 1);
        assert_eq!(mgr.backend().devices_created, 2);
        assert_eq!(mgr.device_generation(), 2);
        assert_eq!(mgr.state(), LifecycleState::WindowSizeResourcesReady);
        assert_eq!(mgr.viewport().render_target_size(), PixelSize::new(1024, 768));
        assert_targets_match_viewport(&mgr);
        // The old generation is gone, not leaked next to the new one.
        assert_eq!(mgr.backend().live.get(), live_before);

        assert_eq!(mgr.present(&mut hooks).unwrap(), PresentStatus::Presented);
        assert_eq!(mgr.backend().presents, 1);
    }

    #[test]
    fn device_loss_during_resize_recovers() {
        let (mut mgr, mut hooks) = manager(false);
        mgr.backend_mut().lose_next_resize = true;

        mgr.update_for_window_size_change(LogicalSize::new(800.0, 600.0), &mut hooks)
            .unwrap();

        assert_eq!(mgr.device_generation(), 2);
        assert_eq!(mgr.state(), LifecycleState::WindowSizeResourcesReady);
        assert_eq!(mgr.viewport().render_target_size(), PixelSize::new(800, 600));
        assert_targets_match_viewport(&mgr);
    }

    #[test]
    fn repeated_loss_during_recovery_is_fatal() {
        let (mut mgr, mut hooks) = manager(false);
        mgr.backend_mut().lose_next_present = true;
        mgr.backend_mut().lose_swap_chain_create = true;

        let err = mgr.present(&mut hooks).unwrap_err();

        assert_eq!(err, DeviceError::DeviceLost);
        assert_eq!(mgr.device_generation(), 2);
        assert_ne!(mgr.state(), LifecycleState::WindowSizeResourcesReady);
    }

    #[test]
    fn recovery_after_failed_recovery_flag_is_cleared() {
        let (mut mgr, mut hooks) = manager(false);
        mgr.backend_mut().lose_next_present = true;
        mgr.backend_mut().lose_swap_chain_create = true;
        assert!(mgr.present(&mut hooks).is_err());

        mgr.backend_mut().lose_swap_chain_create = false;
        mgr.create_device_resources(&mut hooks).unwrap();
        mgr.create_window_size_dependent_resources(&mut hooks).unwrap();

        mgr.backend_mut().lose_next_present = true;
        assert_eq!(mgr.present(&mut hooks).unwrap(), PresentStatus::DeviceRecovered);
        assert_targets_match_viewport(&mgr);
    }

    #[test]
    fn present_before_initialize_is_unexpected() {
        let mut mgr = DeviceLifecycleManager::new(MockBackend::default());
        let mut hooks = RecordingHooks::default();
        let err = mgr.present(&mut hooks).unwrap_err();
        assert!(matches!(err, DeviceError::UnexpectedState(_)));
    }

    // ── display change / trim ─────────────────────────────────────────────

    #[test]
    fn display_change_reevaluates_stereo() {
        let (mut mgr, mut hooks) = manager(false);
        assert!(!mgr.on_display_changed(&mut hooks).unwrap());

        mgr.backend_mut().stereo = true;
        assert!(mgr.on_display_changed(&mut hooks).unwrap());
        assert!(mgr.stereo_enabled());
        assert_eq!(mgr.resources().unwrap().eye_targets().len(), 2);
        assert_eq!(hooks.last_stereo, Some(true));

        mgr.backend_mut().stereo = false;
        assert!(mgr.on_display_changed(&mut hooks).unwrap());
        assert_eq!(mgr.resources().unwrap().eye_targets().len(), 1);
    }

    #[test]
    fn trim_keeps_resources_alive() {
        let (mut mgr, mut hooks) = manager(true);
        let live = mgr.backend().live.get();
        mgr.trim();
        assert_eq!(mgr.backend().trims, 1);
        assert_eq!(mgr.backend().live.get(), live);
        assert_eq!(mgr.state(), LifecycleState::WindowSizeResourcesReady);
        assert_eq!(mgr.present(&mut hooks).unwrap(), PresentStatus::Presented);
    }
}
