use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use winit::window::Window;

use crate::stereo::Eye;

use super::surface::{
    action_result, choose_alpha_mode, choose_present_mode, choose_surface_format,
    classify_surface_error, SurfaceErrorAction,
};
use super::{
    DeviceError, FeatureLevel, GpuBackend, GpuInit, PixelSize, PresentOutcome, ResourceStage,
};

/// Format of the shared depth buffer.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Device, queue and the adapter they came from.
pub struct WgpuDevice {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    /// Set from the device-lost callback; checked before every present.
    lost: Arc<AtomicBool>,
}

impl WgpuDevice {
    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Format of the surface and of every eye target.
    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    #[inline]
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }
}

/// Surface configuration plus the pass that composites eye targets into it.
pub struct WgpuSwapChain {
    config: wgpu::SurfaceConfiguration,
    stereo: bool,
    compositor: Compositor,
}

impl WgpuSwapChain {
    #[inline]
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.config.width, self.config.height)
    }

    #[inline]
    pub fn is_stereo(&self) -> bool {
        self.stereo
    }
}

/// Offscreen color target for one eye.
pub struct EyeTarget {
    eye: Eye,
    size: PixelSize,
    view: wgpu::TextureView,
    /// Binds `view` as the compositor's source.
    composite_bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

impl EyeTarget {
    #[inline]
    pub fn eye(&self) -> Eye {
        self.eye
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn size(&self) -> PixelSize {
        self.size
    }
}

/// Depth buffer shared by both eyes; cleared per eye.
pub struct DepthTarget {
    size: PixelSize,
    view: wgpu::TextureView,
    _texture: wgpu::Texture,
}

impl DepthTarget {
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn size(&self) -> PixelSize {
        self.size
    }
}

struct Compositor {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

/// `GpuBackend` on top of wgpu and a winit window.
///
/// The instance and surface are device-independent: they outlive device loss
/// and are reconfigured against each new device.
pub struct WgpuBackend<'w> {
    window: &'w Window,
    init: GpuInit,
    instance: Option<wgpu::Instance>,
    surface: Option<wgpu::Surface<'w>>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(window: &'w Window, init: GpuInit) -> Self {
        Self {
            window,
            init,
            instance: None,
            surface: None,
        }
    }

    #[inline]
    pub fn window(&self) -> &'w Window {
        self.window
    }

    fn surface(&self) -> Result<&wgpu::Surface<'w>, DeviceError> {
        self.surface.as_ref().ok_or_else(|| {
            DeviceError::UnexpectedState("surface used before device-independent resources".into())
        })
    }

    fn configure(&self, device: &WgpuDevice, config: &wgpu::SurfaceConfiguration) -> Result<(), DeviceError> {
        if device.is_lost() {
            return Err(DeviceError::DeviceLost);
        }
        let surface = self.surface()?;
        capture_gpu_errors(&device.device, "surface configuration", || {
            surface.configure(&device.device, config)
        })
        .map_err(|e| if device.is_lost() { DeviceError::DeviceLost } else { e })
    }
}

impl<'w> GpuBackend for WgpuBackend<'w> {
    type Device = WgpuDevice;
    type SwapChain = WgpuSwapChain;
    type ColorTarget = EyeTarget;
    type DepthTarget = DepthTarget;

    fn create_device_independent_resources(&mut self) -> Result<(), DeviceError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(self.window)
            .map_err(|e| DeviceError::resource(ResourceStage::DeviceIndependent, e.to_string()))?;

        self.instance = Some(instance);
        self.surface = Some(surface);
        Ok(())
    }

    fn create_device(&mut self) -> Result<(WgpuDevice, FeatureLevel), DeviceError> {
        let instance = self.instance.as_ref().ok_or_else(|| {
            DeviceError::UnexpectedState("device requested before the wgpu instance exists".into())
        })?;
        let surface = self.surface()?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| DeviceError::DeviceCreationFailed(format!("no suitable GPU adapter: {e}")))?;

        let feature_level = if adapter.get_downlevel_capabilities().is_webgpu_compliant() {
            FeatureLevel::Core
        } else {
            FeatureLevel::Downlevel
        };

        let required_limits = self
            .init
            .required_limits
            .clone()
            .using_resolution(adapter.limits());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("stereo-engine device"),
            required_features: self.init.required_features,
            required_limits,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| DeviceError::DeviceCreationFailed(e.to_string()))?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::warn!("wgpu device lost ({reason:?}): {message}");
            flag.store(true, Ordering::Release);
        });
        // Creation paths use error scopes; anything else is logged instead of panicking.
        device.on_uncaptured_error(Arc::new(|error: wgpu::Error| {
            log::error!("uncaptured wgpu error: {error}");
        }));

        let caps = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&caps, self.init.prefer_srgb).ok_or_else(|| {
            DeviceError::DeviceCreationFailed("surface reports no supported formats".into())
        })?;

        let info = adapter.get_info();
        log::debug!(
            "adapter: {} ({:?}, {:?}), surface format {:?}",
            info.name,
            info.device_type,
            info.backend,
            surface_format
        );

        Ok((
            WgpuDevice {
                adapter,
                device,
                queue,
                surface_format,
                lost,
            },
            feature_level,
        ))
    }

    /// Checks the configured output against the monitor the window is on now.
    fn stereo_supported(&self, _device: &WgpuDevice) -> bool {
        let monitor = self.window.current_monitor().and_then(|m| m.name());
        self.init.stereo_on(monitor.as_deref())
    }

    fn max_target_dimension(&self, device: &WgpuDevice) -> u32 {
        device.device.limits().max_texture_dimension_2d
    }

    fn create_swap_chain(
        &mut self,
        device: &WgpuDevice,
        size: PixelSize,
        stereo: bool,
    ) -> Result<WgpuSwapChain, DeviceError> {
        let caps = self.surface()?.get_capabilities(&device.adapter);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: device.surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: choose_present_mode(&caps, self.init.present_mode),
            alpha_mode: choose_alpha_mode(&caps, self.init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: self.init.desired_maximum_frame_latency,
        };
        self.configure(device, &config)?;
        let compositor = capture_gpu_errors(&device.device, "eye compositor", || {
            Compositor::new(&device.device, device.surface_format)
        })?;

        Ok(WgpuSwapChain {
            config,
            stereo,
            compositor,
        })
    }

    fn resize_swap_chain(
        &mut self,
        device: &WgpuDevice,
        swap_chain: &mut WgpuSwapChain,
        size: PixelSize,
        stereo: bool,
    ) -> Result<(), DeviceError> {
        swap_chain.config.width = size.width.max(1);
        swap_chain.config.height = size.height.max(1);
        swap_chain.stereo = stereo;
        self.configure(device, &swap_chain.config)
    }

    fn create_color_target(
        &mut self,
        device: &WgpuDevice,
        swap_chain: &WgpuSwapChain,
        eye: Eye,
        size: PixelSize,
    ) -> Result<EyeTarget, DeviceError> {
        let (texture, view, composite_bind_group) = capture_gpu_errors(&device.device, "eye target", || {
            let texture = device.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(match eye {
                    Eye::Left => "left eye target",
                    Eye::Right => "right eye target",
                }),
                size: extent(size),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: device.surface_format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = swap_chain.compositor.bind(&device.device, &view);
            (texture, view, bind_group)
        })?;

        Ok(EyeTarget {
            eye,
            size,
            view,
            composite_bind_group,
            _texture: texture,
        })
    }

    fn create_depth_target(&mut self, device: &WgpuDevice, size: PixelSize) -> Result<DepthTarget, DeviceError> {
        let (texture, view) = capture_gpu_errors(&device.device, "depth target", || {
            let texture = device.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("shared depth target"),
                size: extent(size),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        })?;

        Ok(DepthTarget {
            size,
            view,
            _texture: texture,
        })
    }

    fn color_target_size(target: &EyeTarget) -> PixelSize {
        target.size
    }

    fn depth_target_size(target: &DepthTarget) -> PixelSize {
        target.size
    }

    fn present(
        &mut self,
        device: &WgpuDevice,
        swap_chain: &mut WgpuSwapChain,
        eye_targets: &[EyeTarget],
    ) -> Result<PresentOutcome, DeviceError> {
        if device.is_lost() {
            return Err(DeviceError::DeviceLost);
        }

        let surface = self.surface()?;
        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                let action = classify_surface_error(&err);
                log::debug!("surface acquire failed: {err} ({action:?})");
                if device.is_lost() {
                    return Err(DeviceError::DeviceLost);
                }
                if action == SurfaceErrorAction::Reconfigure {
                    surface.configure(&device.device, &swap_chain.config);
                }
                return action_result(action, &err);
            }
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("stereo composite encoder"),
        });

        swap_chain.compositor.draw(&mut encoder, &view, swap_chain.size(), eye_targets);

        device.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        if device.is_lost() {
            return Err(DeviceError::DeviceLost);
        }
        Ok(PresentOutcome::Presented)
    }

    fn trim(&mut self, device: &WgpuDevice) {
        if let Err(e) = device.device.poll(wgpu::PollType::Poll) {
            log::debug!("poll during trim failed: {e}");
        }
    }
}

/// Runs `create` with validation and out-of-memory errors captured, so a failed
/// allocation comes back as `ResourceCreationFailed` instead of reaching the
/// uncaptured-error handler.
fn capture_gpu_errors<T>(device: &wgpu::Device, what: &str, create: impl FnOnce() -> T) -> Result<T, DeviceError> {
    let out_of_memory = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    // Scopes pop innermost first.
    let validation_error = pollster::block_on(validation.pop());
    let memory_error = pollster::block_on(out_of_memory.pop());
    scope_result(what, validation_error.or(memory_error)).map(|()| value)
}

fn scope_result(what: &str, error: Option<wgpu::Error>) -> Result<(), DeviceError> {
    match error {
        None => Ok(()),
        Some(e) => Err(DeviceError::resource(ResourceStage::WindowSize, format!("{what}: {e}"))),
    }
}

impl Compositor {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("eye composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("composite.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("eye composite bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("eye composite layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("eye composite pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("eye composite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
        }
    }

    fn bind(&self, device: &wgpu::Device, view: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("eye composite bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Draws each eye into its slot: the whole surface for one eye, side-by-side halves for two.
    fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        surface_size: PixelSize,
        eye_targets: &[EyeTarget],
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("eye composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if eye_targets.is_empty() {
            return;
        }

        rpass.set_pipeline(&self.pipeline);

        for (slot, rect) in composite_slots(surface_size, eye_targets.len()).into_iter().enumerate() {
            let Some(target) = eye_targets.get(slot) else { break };
            rpass.set_viewport(rect[0], rect[1], rect[2], rect[3], 0.0, 1.0);
            rpass.set_bind_group(0, &target.composite_bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }
    }
}

/// Viewport `[x, y, w, h]` of each eye on the surface.
fn composite_slots(size: PixelSize, eye_count: usize) -> Vec<[f32; 4]> {
    let (w, h) = (size.width.max(1) as f32, size.height.max(1) as f32);
    if eye_count <= 1 {
        return vec![[0.0, 0.0, w, h]];
    }
    let half = (w / 2.0).floor().max(1.0);
    vec![[0.0, 0.0, half, h], [half, 0.0, (w - half).max(1.0), h]]
}

fn extent(size: PixelSize) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    }
}
