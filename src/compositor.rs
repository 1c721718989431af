// src/compositor.rs

//! Decodes a compressed glyph and composites its MCU blocks into a flat
//! single-channel `GlyphRaster`.
//!
//! ```text
//! glyph bytes → BlockStream → BlockDecoder → McuBlock* → McuCompositor → GlyphRaster
//! ```
//!
//! The decoded image is centred horizontally in the raster and clipped
//! against both the decoded image size (partial edge MCUs) and the raster
//! bounds. The decoded size is not checked against the font cell: a glyph
//! of the wrong size comes out mis-centred or clipped, never out of bounds.

use crate::decoder::{BlockDecoder, BlockStream, DecodeError, GLYPH_CHANNEL, SUB_BLOCK};
use log::{debug, trace, warn};

/// Scratch buffer holding one decoded glyph, one luma byte per pixel,
/// row-major with no padding.
///
/// A single raster is reused for every glyph. The compositor only ever writes
/// to it; callers must `clear` it before each decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl GlyphRaster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Iterates `(x, y, value)` over every pixel in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, u8)> + '_ {
        let width = self.width.max(1);
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i as u32 % width, i as u32 / width, v))
    }

    fn put(&mut self, x: i64, y: i64, value: u8) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.pixels[y as usize * self.width as usize + x as usize] = value;
        true
    }
}

/// Outcome of compositing one glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeReport {
    pub decoded_width: u32,
    pub decoded_height: u32,
    /// Number of MCU blocks consumed.
    pub mcus: u32,
    /// Number of raster bytes written.
    pub pixels_written: usize,
    /// Horizontal centring offset applied to every column.
    pub x_offset: i64,
}

/// Drives a `BlockDecoder` and writes its output into a `GlyphRaster`.
#[derive(Debug, Clone, Default)]
pub struct McuCompositor<D> {
    decoder: D,
}

impl<D: BlockDecoder> McuCompositor<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Decodes `data` and writes its pixels into `raster`, centred
    /// horizontally on `raster.width()`.
    ///
    /// The raster must have been cleared by the caller; this only writes.
    /// If the codec cannot start (bad or truncated header) nothing is written
    /// and the error is returned. Running out of MCUs ends the decode
    /// normally; a stream that is cut short mid-image is indistinguishable
    /// from a complete one at this layer.
    pub fn decode_and_composite(
        &self,
        data: &[u8],
        raster: &mut GlyphRaster,
    ) -> Result<CompositeReport, DecodeError> {
        let mut stream = BlockStream::new(data);
        let (info, blocks) = self.decoder.begin(&mut stream)?;

        let output_width = raster.width() as i64;
        let decoded_width = info.width as i64;
        let decoded_height = info.height as i64;
        let block_width = info.mcu_width as i64;
        let block_height = info.mcu_height as i64;
        let x_offset = (output_width - decoded_width) / 2;

        debug!(
            "McuCompositor: decoded {}x{} into {}x{} raster, MCU {}x{}, x_offset {}",
            info.width,
            info.height,
            raster.width(),
            raster.height(),
            info.mcu_width,
            info.mcu_height,
            x_offset
        );
        if info.width != raster.width() || info.height != raster.height() {
            warn!(
                "McuCompositor: decoded size {}x{} differs from glyph cell {}x{}",
                info.width,
                info.height,
                raster.width(),
                raster.height()
            );
        }

        let mut report = CompositeReport {
            decoded_width: info.width,
            decoded_height: info.height,
            x_offset,
            ..CompositeReport::default()
        };

        let (mut mcu_x, mut mcu_y) = (0i64, 0i64);
        for block in blocks {
            if block.col as i64 != mcu_x || block.row as i64 != mcu_y {
                trace!(
                    "McuCompositor: codec labelled block ({}, {}), placing at ({}, {})",
                    block.col,
                    block.row,
                    mcu_x,
                    mcu_y
                );
            }

            let target_x = mcu_x * block_width;
            let target_y = mcu_y * block_height;

            for y in (0..info.mcu_height).step_by(SUB_BLOCK as usize) {
                let rows = (decoded_height - (target_y + y as i64)).min(SUB_BLOCK as i64);
                if rows <= 0 {
                    continue;
                }
                for x in (0..info.mcu_width).step_by(SUB_BLOCK as usize) {
                    let cols = (decoded_width - (target_x + x as i64)).min(SUB_BLOCK as i64);
                    if cols <= 0 {
                        continue;
                    }
                    let Some(src) = block.sub_block(GLYPH_CHANNEL, x, y) else {
                        continue;
                    };
                    for by in 0..rows {
                        let row = &src[(by * SUB_BLOCK as i64) as usize..];
                        for bx in 0..cols {
                            let dest_x = x_offset + target_x + x as i64 + bx;
                            let dest_y = target_y + y as i64 + by;
                            if raster.put(dest_x, dest_y, row[bx as usize]) {
                                report.pixels_written += 1;
                            }
                        }
                    }
                }
            }

            report.mcus += 1;
            trace!("McuCompositor: MCU ({}, {}) composited", mcu_x, mcu_y);

            mcu_x += 1;
            if mcu_x == info.mcus_per_row as i64 {
                mcu_x = 0;
                mcu_y += 1;
            }
        }

        Ok(report)
    }
}
