// src/renderer.rs

//! Renders a character sequence onto a `FrameSurface`, one glyph cell at a
//! time.
//!
//! For every printable character the shared `GlyphRaster` is cleared, the
//! glyph's compressed data is decoded into it, and the raster is blitted to
//! the surface as gray pixels at the pen position. The pen then advances by
//! one cell width whether or not the character had a glyph. A `'\n'` moves
//! the pen back to the line start and down one cell height.

use crate::color::Rgb;
use crate::compositor::{GlyphRaster, McuCompositor};
use crate::decoder::BlockDecoder;
use crate::glyph::FontTable;
use crate::surface::FrameSurface;
use log::{debug, trace, warn};

/// Line-break marker in the input text.
pub const LINE_BREAK: char = '\n';

/// Pen position in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    pub x: u32,
    pub y: u32,
}

impl Cursor {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// What a call to `TextRenderer::render` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSummary {
    /// Pen position after the last character.
    pub cursor: Cursor,
    /// Glyphs decoded and blitted.
    pub drawn: usize,
    /// Characters with no glyph in the font.
    pub missing: usize,
    /// Glyphs whose data failed to decode.
    pub failed: usize,
    pub line_breaks: usize,
}

pub struct TextRenderer<'f, D> {
    font: &'f FontTable<'f>,
    compositor: McuCompositor<D>,
    raster: GlyphRaster,
}

impl<'f, D: BlockDecoder> TextRenderer<'f, D> {
    /// Creates a renderer for `font`. The glyph raster is allocated once,
    /// sized to the font cell, and reused for every character.
    pub fn new(font: &'f FontTable<'f>, decoder: D) -> Self {
        let cell = font.cell();
        debug!(
            "TextRenderer: font '{}', cell {}x{}, {} glyphs",
            font.name(),
            cell.width,
            cell.height,
            font.glyph_count()
        );
        Self {
            font,
            compositor: McuCompositor::new(decoder),
            raster: GlyphRaster::new(cell.width, cell.height),
        }
    }

    pub fn font(&self) -> &FontTable<'f> {
        self.font
    }

    /// Renders `text` left to right, top to bottom, starting with the pen at
    /// `start`. Pixels that fall off the surface are dropped.
    pub fn render(&mut self, text: &str, start: Cursor, surface: &mut FrameSurface) -> RenderSummary {
        let cell = self.font.cell();
        let mut summary = RenderSummary::default();
        let mut cursor = start;

        for c in text.chars() {
            if c == LINE_BREAK {
                cursor.x = start.x;
                cursor.y = cursor.y.saturating_add(cell.height);
                summary.line_breaks += 1;
                continue;
            }

            self.raster.clear();
            match self.font.glyph(c) {
                Some(glyph) => {
                    match self.compositor.decode_and_composite(glyph.data, &mut self.raster) {
                        Ok(report) => {
                            trace!("TextRenderer: {:?} at {:?}: {:?}", c, cursor, report);
                            summary.drawn += 1;
                        }
                        Err(e) => {
                            warn!(
                                "TextRenderer: glyph {:?} ({} bytes) failed to decode: {}",
                                c,
                                glyph.len(),
                                e
                            );
                            summary.failed += 1;
                        }
                    }
                    display_glyph(surface, &self.raster, cursor);
                }
                None => {
                    trace!("TextRenderer: no glyph for {:?}", c);
                    summary.missing += 1;
                }
            }

            cursor.x = cursor.x.saturating_add(cell.width);
        }

        summary.cursor = cursor;
        summary
    }
}

/// Copies `raster` onto `surface` with its top-left corner at `at`, mapping
/// each luma byte `v` to the gray pixel `(v, v, v)`.
pub fn display_glyph(surface: &mut FrameSurface, raster: &GlyphRaster, at: Cursor) {
    for (x, y, v) in raster.pixels() {
        let (Some(sx), Some(sy)) = (at.x.checked_add(x), at.y.checked_add(y)) else {
            continue;
        };
        surface.set_pixel(sx, sy, Rgb::gray(v));
    }
}

#[cfg(test)]
mod tests;
