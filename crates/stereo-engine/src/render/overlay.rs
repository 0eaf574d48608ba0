use std::path::PathBuf;

use crate::coords::{Color, Vec2};
use crate::text::{find_system_font, FontId, FontSystem};

use super::text::{TextRenderer, TextRun};
use super::{HintText, RenderCtx, RenderTarget};

pub const CAPTION: &str = "Stereoscopic 3D sample";

const CAPTION_SIZE: f32 = 36.0;
const HINT_SIZE: f32 = 40.0;
const PADDING: f32 = 3.0;
const TEXT_VERTICAL_OFFSET: f32 = 5.0;

/// 2D content drawn into each eye target after the scene.
pub trait Overlay {
    /// Re-evaluates layout for a window `window_width` logical pixels wide.
    fn update_for_window_size_change(&mut self, window_width: f32);

    fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>);
}

/// Caption in the top-left corner plus the exaggeration hint.
///
/// Fonts are CPU-side and survive device loss; the glyph renderer is rebuilt
/// with each device. Without a usable font the overlay draws nothing.
pub struct TextOverlay {
    fonts: FontSystem,
    font: Option<FontId>,
    font_path: Option<PathBuf>,
    caption: String,
    overlay_width: f32,
    draw_caption: bool,
    hint: Option<HintText>,
    renderer: Option<TextRenderer>,
}

impl TextOverlay {
    /// `font_path` overrides the system font search.
    pub fn new(caption: impl Into<String>, font_path: Option<PathBuf>) -> Self {
        Self {
            fonts: FontSystem::new(),
            font: None,
            font_path,
            caption: caption.into(),
            overlay_width: 0.0,
            draw_caption: false,
            hint: None,
            renderer: None,
        }
    }

    /// Loads the overlay font. Failure is logged, not returned.
    pub fn load_fonts(&mut self) {
        if self.font.is_some() {
            return;
        }

        let path = self.font_path.clone().or_else(find_system_font);
        let Some(path) = path else {
            log::warn!("no overlay font found; caption and hint text are disabled");
            return;
        };

        match self.fonts.load_font_file(&path) {
            Ok(id) => {
                log::debug!("overlay font: {}", path.display());
                self.font = Some(id);
                let text_width = self.fonts.measure_text(&self.caption, id, CAPTION_SIZE, None).x;
                self.overlay_width = PADDING * 3.0 + text_width;
            }
            Err(e) => log::warn!("{e}; caption and hint text are disabled"),
        }
    }

    /// Builds the glyph renderer for targets of `format`. Skipped without a font.
    pub fn create_device_resources(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.font.is_some() {
            self.renderer = Some(TextRenderer::new(device, format));
        }
    }

    pub fn release_device_resources(&mut self) {
        self.renderer = None;
    }

    pub fn set_hint(&mut self, hint: HintText) {
        self.hint = Some(hint);
    }

    #[inline]
    pub fn caption_visible(&self) -> bool {
        self.font.is_some() && self.draw_caption
    }

    /// Logical width the caption needs, padding included.
    #[inline]
    pub fn overlay_width(&self) -> f32 {
        self.overlay_width
    }
}

impl Overlay for TextOverlay {
    fn update_for_window_size_change(&mut self, window_width: f32) {
        self.draw_caption = caption_fits(window_width, self.overlay_width);
    }

    fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let Some(font) = self.font else { return; };
        let Some(renderer) = self.renderer.as_mut() else { return; };

        let mut runs = Vec::with_capacity(2);
        if self.draw_caption {
            runs.push(TextRun {
                text: &self.caption,
                font,
                size: CAPTION_SIZE,
                origin: Vec2::new(2.0 * PADDING, TEXT_VERTICAL_OFFSET),
                max_width: None,
                color: Color::white(),
            });
        }
        if let Some(hint) = self.hint.as_ref().filter(|h| !h.rect.is_empty()) {
            runs.push(TextRun {
                text: hint.message,
                font,
                size: HINT_SIZE,
                origin: hint.rect.origin,
                max_width: Some(hint.rect.size.x.max(1.0)),
                color: Color::from_straight(1.0, 1.0, 1.0, 0.5),
            });
        }

        renderer.render(ctx, target, &runs, &self.fonts);
    }
}

/// The caption is hidden when the window is narrower than it.
#[inline]
fn caption_fits(window_width: f32, overlay_width: f32) -> bool {
    window_width >= overlay_width
}
