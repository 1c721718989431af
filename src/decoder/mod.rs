// src/decoder/mod.rs

//! Seam between the glyph pipeline and the compressed-image codec.
//!
//! The codec is driven pull-style: it reads its input from a `BlockStream`
//! and hands back the decoded image as a lazy, finite sequence of MCU blocks.
//! The compositor consumes one block at a time and may stop early simply by
//! not asking for the next one.
//!
//! ## MCU buffer layout
//!
//! Each `McuBlock` carries one 256-byte buffer per channel. A block of up to
//! 16×16 pixels is stored as 8×8 sub-blocks, each 64 bytes row-major. The
//! sub-block at pixel offset `(x, y)` inside the MCU starts at byte
//! `x * 8 + y * 16`. This packing is a fixed contract with the codec adapter
//! (it matches the layout of small embedded JPEG decoders), not something the
//! consumer derives; a different codec must be re-validated against it.

pub mod jpeg;
pub mod stream;

use std::fmt;

pub use jpeg::JpegBlockDecoder;
pub use stream::BlockStream;

/// Bytes per channel buffer in an MCU.
pub const MCU_BUFFER_LEN: usize = 256;
/// Edge length of a sub-block inside an MCU.
pub const SUB_BLOCK: u32 = 8;
/// Bytes in one sub-block.
pub const SUB_BLOCK_LEN: usize = (SUB_BLOCK * SUB_BLOCK) as usize;

/// Header information reported once the codec has parsed its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub mcu_width: u32,
    pub mcu_height: u32,
    pub mcus_per_row: u32,
    pub mcus_per_col: u32,
}

impl ImageInfo {
    /// Computes the MCU grid needed to cover a `width`×`height` image.
    pub fn new(width: u32, height: u32, mcu_width: u32, mcu_height: u32) -> Self {
        Self {
            width,
            height,
            mcu_width,
            mcu_height,
            mcus_per_row: width.div_ceil(mcu_width),
            mcus_per_col: height.div_ceil(mcu_height),
        }
    }

    pub fn mcu_count(&self) -> u32 {
        self.mcus_per_row * self.mcus_per_col
    }
}

/// A colour channel of an MCU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

/// Channel that carries the luma of grayscale-encoded glyphs. The codec
/// adapter reports grayscale through all three channels; green is the one
/// glyphs are composited from.
pub const GLYPH_CHANNEL: Channel = Channel::Green;

/// One decoded minimum coded unit.
#[derive(Clone)]
pub struct McuBlock {
    /// Grid column of this block within the image.
    pub col: u32,
    /// Grid row of this block within the image.
    pub row: u32,
    pub width: u32,
    pub height: u32,
    pub red: [u8; MCU_BUFFER_LEN],
    pub green: [u8; MCU_BUFFER_LEN],
    pub blue: [u8; MCU_BUFFER_LEN],
}

impl McuBlock {
    pub fn new(col: u32, row: u32, width: u32, height: u32) -> Self {
        Self {
            col,
            row,
            width,
            height,
            red: [0; MCU_BUFFER_LEN],
            green: [0; MCU_BUFFER_LEN],
            blue: [0; MCU_BUFFER_LEN],
        }
    }

    pub fn channel(&self, channel: Channel) -> &[u8; MCU_BUFFER_LEN] {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut [u8; MCU_BUFFER_LEN] {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }

    /// Returns the 64 row-major bytes of the sub-block at local offset
    /// `(x, y)`, or `None` if the offset is not on the 8-pixel grid or falls
    /// outside this MCU.
    pub fn sub_block(&self, channel: Channel, x: u32, y: u32) -> Option<&[u8]> {
        let start = sub_block_offset(x, y, self.width, self.height)?;
        self.channel(channel).get(start..start + SUB_BLOCK_LEN)
    }

    pub fn sub_block_mut(&mut self, channel: Channel, x: u32, y: u32) -> Option<&mut [u8]> {
        let start = sub_block_offset(x, y, self.width, self.height)?;
        self.channel_mut(channel)
            .get_mut(start..start + SUB_BLOCK_LEN)
    }
}

impl fmt::Debug for McuBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McuBlock")
            .field("col", &self.col)
            .field("row", &self.row)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Byte offset of the sub-block at `(x, y)` in the packed channel buffer.
fn sub_block_offset(x: u32, y: u32, width: u32, height: u32) -> Option<usize> {
    if x % SUB_BLOCK != 0 || y % SUB_BLOCK != 0 || x >= width || y >= height {
        return None;
    }
    Some((x * 8 + y * 16) as usize)
}

/// Failure to start decoding a glyph image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The blob contained no bytes.
    Empty,
    /// The header or entropy data could not be parsed.
    Malformed(String),
    /// Well-formed input using a feature the adapter cannot represent.
    Unsupported(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "no image data"),
            DecodeError::Malformed(msg) => write!(f, "malformed image data: {}", msg),
            DecodeError::Unsupported(msg) => write!(f, "unsupported image: {}", msg),
        }
    }
}

impl std::error::Error for DecodeError {}

/// A codec that decodes a compressed image into MCU blocks.
pub trait BlockDecoder {
    /// Lazy sequence of decoded blocks in row-major grid order.
    type Blocks: Iterator<Item = McuBlock>;

    /// Reads the image header (and whatever else the codec needs) from
    /// `stream`. Failure means no pixel may be produced for this image.
    fn begin(&self, stream: &mut BlockStream<'_>) -> Result<(ImageInfo, Self::Blocks), DecodeError>;
}
