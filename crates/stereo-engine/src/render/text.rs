use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle};

use crate::coords::{Color, Vec2};
use crate::render::{RenderCtx, RenderTarget};
use crate::text::{FontId, FontSystem};

const ATLAS_SIZE: u32 = 2048;
const GLYPH_PADDING: u32 = 1; // pixels between glyphs in the atlas
const MIN_INSTANCE_CAPACITY: usize = 64;

/// One string to draw, in logical pixels (top-left origin).
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextRun<'a> {
    pub text: &'a str,
    pub font: FontId,
    pub size: f32,
    pub origin: Vec2,
    /// Wrap width; `None` never wraps.
    pub max_width: Option<f32>,
    pub color: Color,
}

/// Glyph-atlas text renderer bound to one device.
///
/// Created with the device resources and dropped with them. Glyphs are
/// rasterized at physical pixel size on first use into a 2048 × 2048 R8Unorm
/// atlas and stay cached until the renderer is dropped.
///
/// Each `render` call rewrites the shared instance buffer, so its commands
/// must be submitted before the next call.
pub(crate) struct TextRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    viewport_ubo: wgpu::Buffer,
    atlas: GlyphAtlas,
    instances: InstanceBuffer,
    layout: Layout<()>,
}

impl TextRenderer {
    pub(crate) fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay text shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/text.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay text bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ViewportUniform>() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay text pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay text pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GlyphInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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

        let atlas = GlyphAtlas::new(device);
        let atlas_view = atlas.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("overlay text sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("overlay text viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay text bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: viewport_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Self {
            pipeline,
            bind_group,
            viewport_ubo,
            atlas,
            instances: InstanceBuffer::default(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        }
    }

    /// Draws `runs` over the current contents of `target.color_view`.
    pub(crate) fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        runs: &[TextRun<'_>],
        fonts: &FontSystem,
    ) {
        if runs.is_empty() || !ctx.viewport.is_valid() {
            return;
        }

        let scale = ctx.scale_factor.max(0.01);
        let mut instances: Vec<GlyphInstance> = Vec::new();

        for run in runs {
            let Some(font) = fonts.get(run.font) else {
                log::warn!("overlay text: unknown {:?}, run skipped", run.font);
                continue;
            };

            self.layout.reset(&LayoutSettings {
                x: run.origin.x * scale,
                y: run.origin.y * scale,
                max_width: run.max_width.map(|w| w * scale),
                ..LayoutSettings::default()
            });
            self.layout.append(&[font], &TextStyle::new(run.text, run.size * scale, 0));

            let color = run.color.to_array();
            for glyph in self.layout.glyphs() {
                if !glyph.char_data.rasterize() || glyph.width == 0 || glyph.height == 0 {
                    continue;
                }
                let Some(region) = self.atlas.region(ctx.queue, font, glyph.key) else {
                    continue;
                };
                instances.push(GlyphInstance {
                    dst_min: [glyph.x, glyph.y],
                    dst_max: [glyph.x + glyph.width as f32, glyph.y + glyph.height as f32],
                    uv_min: region.uv_min,
                    uv_max: region.uv_max,
                    color,
                });
            }
        }

        if instances.is_empty() {
            return;
        }

        let uniform = ViewportUniform {
            size: [ctx.viewport.width, ctx.viewport.height],
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(&self.viewport_ubo, 0, bytemuck::bytes_of(&uniform));
        let instance_vbo = self.instances.upload(ctx.device, ctx.queue, &instances);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("overlay text pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, instance_vbo.slice(..));
        rpass.draw(0..6, 0..instances.len() as u32);
    }
}

// ── atlas ──────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq)]
struct AtlasRegion {
    uv_min: [f32; 2],
    uv_max: [f32; 2],
}

struct GlyphAtlas {
    texture: wgpu::Texture,
    shelf: Shelf,
    cache: HashMap<GlyphRasterConfig, AtlasRegion>,
    full: bool,
}

impl GlyphAtlas {
    fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("overlay glyph atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        Self {
            texture,
            shelf: Shelf::default(),
            cache: HashMap::new(),
            full: false,
        }
    }

    /// Atlas coordinates of `key`, rasterizing and uploading it on first use.
    /// `None` for empty glyphs and once the atlas has run out of room.
    fn region(&mut self, queue: &wgpu::Queue, font: &fontdue::Font, key: GlyphRasterConfig) -> Option<AtlasRegion> {
        if let Some(region) = self.cache.get(&key) {
            return Some(*region);
        }
        if self.full {
            return None;
        }

        let (metrics, bitmap) = font.rasterize_config(key);
        let (w, h) = (metrics.width as u32, metrics.height as u32);
        if w == 0 || h == 0 {
            return None;
        }

        let Some((x, y)) = self.shelf.allocate(w, h) else {
            log::warn!("glyph atlas is full ({ATLAS_SIZE}x{ATLAS_SIZE}); further glyphs are dropped");
            self.full = true;
            return None;
        };

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            &bitmap,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );

        let region = atlas_region(x, y, w, h);
        self.cache.insert(key, region);
        Some(region)
    }
}

fn atlas_region(x: u32, y: u32, w: u32, h: u32) -> AtlasRegion {
    let size = ATLAS_SIZE as f32;
    AtlasRegion {
        uv_min: [x as f32 / size, y as f32 / size],
        uv_max: [(x + w) as f32 / size, (y + h) as f32 / size],
    }
}

/// Row-by-row packer. Glyphs fill a row left to right; a glyph that does not
/// fit starts a new row below the tallest glyph so far.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Shelf {
    x: u32,
    y: u32,
    row_height: u32,
}

impl Default for Shelf {
    fn default() -> Self {
        Self {
            x: GLYPH_PADDING,
            y: GLYPH_PADDING,
            row_height: 0,
        }
    }
}

impl Shelf {
    /// Reserves a `w` × `h` cell and returns its top-left corner.
    fn allocate(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if self.x + w + GLYPH_PADDING > ATLAS_SIZE {
            self.y += self.row_height + GLYPH_PADDING;
            self.x = GLYPH_PADDING;
            self.row_height = 0;
        }
        if self.y + h + GLYPH_PADDING > ATLAS_SIZE || self.x + w + GLYPH_PADDING > ATLAS_SIZE {
            return None;
        }

        let corner = (self.x, self.y);
        self.x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some(corner)
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 2],
    _pad: [f32; 2],
}

/// Per-glyph instance (48 bytes). Quad corners come from the vertex index.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GlyphInstance {
    dst_min: [f32; 2],
    dst_max: [f32; 2],
    uv_min: [f32; 2],
    uv_max: [f32; 2],
    color: [f32; 4],
}

impl GlyphInstance {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32x2,
        4 => Float32x4
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlyphInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Instance buffer that grows to the next power of two and is reused otherwise.
#[derive(Default)]
struct InstanceBuffer {
    buffer: Option<wgpu::Buffer>,
}

impl InstanceBuffer {
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[GlyphInstance]) -> &wgpu::Buffer {
        let bytes: &[u8] = bytemuck::cast_slice(instances);

        let buffer = match self.buffer.take() {
            Some(buffer) if buffer.size() >= bytes.len() as u64 => buffer,
            _ => {
                let capacity = instances.len().next_power_of_two().max(MIN_INSTANCE_CAPACITY);
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("overlay text instances"),
                    size: (capacity * std::mem::size_of::<GlyphInstance>()) as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            }
        };

        queue.write_buffer(&buffer, 0, bytes);
        self.buffer.insert(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_layouts_match_shader() {
        assert_eq!(std::mem::size_of::<GlyphInstance>(), 48);
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 16);
    }

    #[test]
    fn shelf_fills_row_then_wraps() {
        let mut shelf = Shelf::default();
        assert_eq!(shelf.allocate(10, 30), Some((1, 1)));
        assert_eq!(shelf.allocate(10, 12), Some((12, 1)));

        shelf.x = ATLAS_SIZE - 10;
        assert_eq!(shelf.allocate(20, 20), Some((GLYPH_PADDING, 1 + 30 + GLYPH_PADDING)));
        assert_eq!(shelf.row_height, 20);
    }

    #[test]
    fn shelf_reports_full_atlas() {
        let mut shelf = Shelf { x: 1, y: ATLAS_SIZE - 5, row_height: 0 };
        assert_eq!(shelf.allocate(10, 10), None);

        let mut shelf = Shelf::default();
        assert_eq!(shelf.allocate(ATLAS_SIZE, 10), None);
    }

    #[test]
    fn region_uvs_cover_the_cell() {
        let r = atlas_region(0, 1024, 512, 256);
        assert_eq!(r.uv_min, [0.0, 0.5]);
        assert_eq!(r.uv_max, [0.25, 0.625]);
    }
}
