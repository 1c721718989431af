// src/decoder/jpeg.rs

//! JPEG codec adapter backed by the `image` crate.
//!
//! The input is pulled through the `BlockStream` in small chunks, the whole
//! image is decoded up front, and the pixels are then handed out MCU by MCU in
//! the packed layout described in `crate::decoder`.

use super::{
    BlockDecoder, BlockStream, Channel, DecodeError, ImageInfo, McuBlock, SUB_BLOCK,
};
use image::{ColorType, ImageFormat, RgbImage};
use log::{debug, trace};

/// Largest single pull from the input stream.
pub const MAX_PULL: usize = 256;

/// MCU edge used for single-component (grayscale) images.
const GRAY_MCU: u32 = 8;
/// MCU edge used for colour images (4:2:0 subsampling).
const COLOR_MCU: u32 = 16;
/// Largest MCU edge the packed buffers can hold.
const MAX_MCU: u32 = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct JpegBlockDecoder;

impl JpegBlockDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl BlockDecoder for JpegBlockDecoder {
    type Blocks = JpegBlocks;

    fn begin(&self, stream: &mut BlockStream<'_>) -> Result<(ImageInfo, JpegBlocks), DecodeError> {
        let bytes = pull_all(stream);
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let image = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let mcu = match image.color() {
            ColorType::L8 | ColorType::L16 => GRAY_MCU,
            _ => COLOR_MCU,
        };
        let pixels = image.to_rgb8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(DecodeError::Unsupported("zero-sized image".to_string()));
        }

        let info = ImageInfo::new(pixels.width(), pixels.height(), mcu, mcu);
        debug!(
            "JpegBlockDecoder: {} bytes -> {}x{} ({:?}), {}x{} MCUs of {}x{}",
            bytes.len(),
            info.width,
            info.height,
            image.color(),
            info.mcus_per_row,
            info.mcus_per_col,
            info.mcu_width,
            info.mcu_height
        );

        Ok((
            info,
            JpegBlocks {
                pixels,
                info,
                next: 0,
            },
        ))
    }
}

/// Reads the stream to its end, one bounded pull at a time. A zero-length
/// pull ends the input.
fn pull_all(stream: &mut BlockStream<'_>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(stream.remaining());
    let mut chunk = [0u8; MAX_PULL];
    loop {
        let n = stream.next(&mut chunk);
        if n == 0 {
            break;
        }
        trace!("JpegBlockDecoder: pulled {} bytes at {}", n, stream.position() - n);
        bytes.extend_from_slice(&chunk[..n]);
    }
    bytes
}

/// Iterator over the MCUs of a decoded JPEG, in row-major grid order.
#[derive(Debug)]
pub struct JpegBlocks {
    pixels: RgbImage,
    info: ImageInfo,
    next: u32,
}

impl JpegBlocks {
    fn pack(&self, col: u32, row: u32) -> McuBlock {
        let info = &self.info;
        debug_assert!(info.mcu_width <= MAX_MCU && info.mcu_height <= MAX_MCU);
        let mut block = McuBlock::new(col, row, info.mcu_width, info.mcu_height);
        let origin_x = col * info.mcu_width;
        let origin_y = row * info.mcu_height;

        for sy in (0..info.mcu_height).step_by(SUB_BLOCK as usize) {
            for sx in (0..info.mcu_width).step_by(SUB_BLOCK as usize) {
                for by in 0..SUB_BLOCK {
                    for bx in 0..SUB_BLOCK {
                        // Past the image edge, replicate the last pixel.
                        let px = (origin_x + sx + bx).min(info.width - 1);
                        let py = (origin_y + sy + by).min(info.height - 1);
                        let rgb = self.pixels.get_pixel(px, py).0;
                        let idx = (by * SUB_BLOCK + bx) as usize;
                        for (channel, value) in
                            [(Channel::Red, rgb[0]), (Channel::Green, rgb[1]), (Channel::Blue, rgb[2])]
                        {
                            if let Some(sub) = block.sub_block_mut(channel, sx, sy) {
                                sub[idx] = value;
                            }
                        }
                    }
                }
            }
        }
        block
    }
}

impl Iterator for JpegBlocks {
    type Item = McuBlock;

    fn next(&mut self) -> Option<McuBlock> {
        if self.next >= self.info.mcu_count() {
            return None;
        }
        let col = self.next % self.info.mcus_per_row;
        let row = self.next / self.info.mcus_per_row;
        self.next += 1;
        Some(self.pack(col, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.info.mcu_count().saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}
