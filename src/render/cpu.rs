use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::{
        decode::{PreparedImage, load_background},
        fonts::{FontResolver, LoadedFont, TextBrushRgba8, TextLayoutEngine},
    },
    foundation::{
        core::Resolution,
        error::{LeapsError, LeapsResult},
    },
    render::FrameRGBA,
    slide::model::{Background, SlideDescriptor, TextPosition},
};

/// Draws slides into fixed-resolution frames on the CPU.
///
/// The background always covers the whole frame, so every produced pixel is opaque.
pub struct SlideRenderer {
    fonts: FontResolver,
    text: TextLayoutEngine,
    default_font: Option<PathBuf>,
    font_data: HashMap<String, vello_cpu::peniko::FontData>,
}

impl SlideRenderer {
    /// Renderer using `default_font` for slides that do not name their own font.
    pub fn new(default_font: Option<PathBuf>) -> Self {
        Self::with_resolver(FontResolver::new(), default_font)
    }

    pub fn with_resolver(fonts: FontResolver, default_font: Option<PathBuf>) -> Self {
        Self {
            fonts,
            text: TextLayoutEngine::new(),
            default_font,
            font_data: HashMap::new(),
        }
    }

    #[tracing::instrument(skip(self, slide), fields(kind = ?slide.kind))]
    pub fn render(
        &mut self,
        slide: &SlideDescriptor,
        resolution: Resolution,
    ) -> LeapsResult<FrameRGBA> {
        resolution.validate()?;
        let (w, h) = surface_size(resolution)?;

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        draw_background(&mut ctx, &slide.background, resolution)?;

        if slide.has_visible_text() {
            self.draw_text(&mut ctx, slide, resolution)?;
        } else {
            tracing::debug!("slide has no visible text, drawing background only");
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: resolution.width,
            height: resolution.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        slide: &SlideDescriptor,
        resolution: Resolution,
    ) -> LeapsResult<()> {
        let requested = slide.font.as_deref().or(self.default_font.as_deref());
        let font = self.fonts.resolve(requested)?;
        let layout = self.text.layout_plain(
            &slide.text,
            &font,
            slide.text_size,
            TextBrushRgba8::from(slide.text_color),
        )?;

        let font_data = self.font_data_for(&font);
        let ink = match slide.text_position {
            TextPosition::Centered => measure_ink(&layout, &font_data, slide.text_size)
                .unwrap_or_else(|| InkBounds::from_extent(layout.width(), layout.height())),
            TextPosition::Explicit { .. } => InkBounds::from_extent(layout.width(), layout.height()),
        };
        let (x, y) = text_origin(slide.text_position, resolution, ink);
        tracing::debug!(
            x,
            y,
            ?ink,
            font = %font.key,
            fallback = font.is_fallback,
            "placing slide text"
        );

        draw_glyph_runs(ctx, &layout, &font_data, (x as f64, y as f64));
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    fn font_data_for(&mut self, font: &LoadedFont) -> vello_cpu::peniko::FontData {
        self.font_data
            .entry(font.key.clone())
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
                    font.index,
                )
            })
            .clone()
    }
}

/// Pixel box covered by drawn glyphs, relative to the layout origin. `right` and `bottom` are
/// exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InkBounds {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl InkBounds {
    /// The whole layout box, rounded up to whole pixels.
    pub fn from_extent(width: f32, height: f32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width.max(0.0).ceil() as i64,
            bottom: height.max(0.0).ceil() as i64,
        }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }
}

/// Layout origin for `position`.
///
/// Centered text puts the ink box in the middle of the canvas, with any odd pixel going to the
/// right or bottom margin. Explicit coordinates pass through untouched, even off-canvas.
pub fn text_origin(position: TextPosition, canvas: Resolution, ink: InkBounds) -> (i64, i64) {
    match position {
        TextPosition::Explicit { x, y } => (x, y),
        TextPosition::Centered => (
            (i64::from(canvas.width) - ink.width()).div_euclid(2) - ink.left,
            (i64::from(canvas.height) - ink.height()).div_euclid(2) - ink.top,
        ),
    }
}

/// Draw every glyph run of `layout` with its top-left corner at `origin`.
fn draw_glyph_runs(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    font_data: &vello_cpu::peniko::FontData,
    origin: (f64, f64),
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate(origin));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font_data)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

/// Render `layout` alone and return the box of pixels it covers.
///
/// Glyphs are drawn at a whole-pixel offset, so the measured box matches what the same layout
/// produces at any other whole-pixel origin. `None` when nothing is inked or the scratch surface
/// would be too large.
fn measure_ink(
    layout: &parley::Layout<TextBrushRgba8>,
    font_data: &vello_cpu::peniko::FontData,
    text_size: f32,
) -> Option<InkBounds> {
    // Room for overhangs outside the layout box.
    let pad = text_size.max(1.0).ceil() as i64;
    let extent = InkBounds::from_extent(layout.width(), layout.height());
    let w: u16 = (extent.right + 2 * pad).try_into().ok()?;
    let h: u16 = (extent.bottom + 2 * pad).try_into().ok()?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    draw_glyph_runs(&mut ctx, layout, font_data, (pad as f64, pad as f64));
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);

    let width = usize::from(w);
    let mut ink: Option<InkBounds> = None;
    for (i, px) in pixmap.data_as_u8_slice().chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let x = (i % width) as i64 - pad;
        let y = (i / width) as i64 - pad;
        ink = Some(match ink {
            None => InkBounds {
                left: x,
                top: y,
                right: x + 1,
                bottom: y + 1,
            },
            Some(b) => InkBounds {
                left: b.left.min(x),
                top: b.top.min(y),
                right: b.right.max(x + 1),
                bottom: b.bottom.max(y + 1),
            },
        });
    }
    ink
}

fn surface_size(resolution: Resolution) -> LeapsResult<(u16, u16)> {
    let w: u16 = resolution
        .width
        .try_into()
        .map_err(|_| LeapsError::render("frame width exceeds u16"))?;
    let h: u16 = resolution
        .height
        .try_into()
        .map_err(|_| LeapsError::render("frame height exceeds u16"))?;
    Ok((w, h))
}

fn draw_background(
    ctx: &mut vello_cpu::RenderContext,
    background: &Background,
    resolution: Resolution,
) -> LeapsResult<()> {
    let full = vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(resolution.width),
        f64::from(resolution.height),
    );
    match background {
        Background::Color { color } => {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, 255,
            ));
        }
        Background::Image { path } => {
            let paint = background_image_paint(path, resolution)?;
            ctx.set_paint(paint);
        }
    }
    ctx.fill_rect(&full);
    Ok(())
}

fn background_image_paint(path: &Path, resolution: Resolution) -> LeapsResult<vello_cpu::Image> {
    let prepared = load_background(path, resolution)?;
    let pixmap = prepared_to_pixmap(&prepared)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn prepared_to_pixmap(prepared: &PreparedImage) -> LeapsResult<vello_cpu::Pixmap> {
    let w: u16 = prepared
        .width
        .try_into()
        .map_err(|_| LeapsError::render("image width exceeds u16"))?;
    let h: u16 = prepared
        .height
        .try_into()
        .map_err(|_| LeapsError::render("image height exceeds u16"))?;
    if prepared.rgba8.len() != prepared.width as usize * prepared.height as usize * 4 {
        return Err(LeapsError::render("prepared image byte length mismatch"));
    }

    // Backgrounds are opaque, so straight and premultiplied bytes coincide.
    let pixels = prepared
        .rgba8
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, false))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
