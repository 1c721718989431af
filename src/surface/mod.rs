// src/surface/mod.rs

//! Framebuffer surface: the destination for rendered glyphs.
//!
//! ## Lifecycle
//! 1. `SurfaceHandle::new(source)` - records where the pixels live, acquires nothing.
//! 2. `SurfaceHandle::init()` - opens/maps the device or allocates memory. On
//!    failure the handle is consumed, which is the only valid next step anyway.
//! 3. Pixel reads and writes on the returned `FrameSurface`.
//! 4. `FrameSurface::deinit()` (or `Drop`) - releases the backing and hands
//!    the handle back.
//!
//! The core pixel format is RGB24: row-major, 3 bytes per pixel, no row
//! padding, so `offset(x, y) = (y * width + x) * 3`. Device backings describe
//! their actual format through `PixelLayout`.

pub mod fbdev;
pub mod memory;

use crate::color::Rgb;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;

/// Byte layout of pixels in a surface's backing memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub bytes_per_pixel: usize,
    /// Bytes from the start of one row to the start of the next.
    pub stride: usize,
    pub red_offset: usize,
    pub green_offset: usize,
    pub blue_offset: usize,
}

impl PixelLayout {
    /// Packed R, G, B bytes with no row padding.
    pub const fn rgb24(width: u32) -> Self {
        Self {
            bytes_per_pixel: 3,
            stride: width as usize * 3,
            red_offset: 0,
            green_offset: 1,
            blue_offset: 2,
        }
    }

    pub fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * self.bytes_per_pixel
    }
}

/// Memory a surface draws into.
pub trait PixelMemory {
    fn bytes(&self) -> &[u8];
    fn bytes_mut(&mut self) -> &mut [u8];
}

/// Where a surface gets its pixels from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceSource {
    /// A Linux framebuffer device such as `/dev/fb0`.
    Device(PathBuf),
    /// Heap memory, for headless rendering.
    Memory { width: u32, height: u32 },
}

/// An unacquired surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceHandle {
    source: SurfaceSource,
}

impl SurfaceHandle {
    pub fn new(source: SurfaceSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &SurfaceSource {
        &self.source
    }

    /// Acquires the backing memory.
    pub fn init(self) -> Result<FrameSurface> {
        let (memory, width, height, layout): (Box<dyn PixelMemory>, u32, u32, PixelLayout) =
            match &self.source {
                SurfaceSource::Device(path) => {
                    let device = fbdev::FbDevice::open(path)
                        .with_context(|| format!("Can't open framebuffer {}", path.display()))?;
                    let (width, height, layout) =
                        (device.width(), device.height(), device.layout());
                    (Box::new(device) as Box<dyn PixelMemory>, width, height, layout)
                }
                SurfaceSource::Memory { width, height } => (
                    Box::new(memory::MemoryPixels::new(*width, *height)) as Box<dyn PixelMemory>,
                    *width,
                    *height,
                    PixelLayout::rgb24(*width),
                ),
            };

        info!(
            "Surface initialized: {:?}, {}x{}, {:?}",
            self.source, width, height, layout
        );
        Ok(FrameSurface {
            handle: self,
            memory,
            width,
            height,
            layout,
        })
    }
}

/// An acquired surface. Dropping it releases the backing memory.
pub struct FrameSurface {
    handle: SurfaceHandle,
    memory: Box<dyn PixelMemory>,
    width: u32,
    height: u32,
    layout: PixelLayout,
}

impl FrameSurface {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Writes one pixel. Coordinates outside the surface are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let base = self.layout.offset(x, y);
        let layout = self.layout;
        let bytes = self.memory.bytes_mut();
        bytes[base + layout.red_offset] = color.r;
        bytes[base + layout.green_offset] = color.g;
        bytes[base + layout.blue_offset] = color.b;
    }

    /// Reads one pixel, or `None` outside the surface.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let base = self.layout.offset(x, y);
        let bytes = self.memory.bytes();
        Some(Rgb::new(
            bytes[base + self.layout.red_offset],
            bytes[base + self.layout.green_offset],
            bytes[base + self.layout.blue_offset],
        ))
    }

    pub fn fill(&mut self, color: Rgb) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Raw backing bytes, in `layout()` format.
    pub fn as_bytes(&self) -> &[u8] {
        self.memory.bytes()
    }

    /// Writes the visible area as a binary PPM (P6) image.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)
            .context("Failed to write PPM header")?;
        let mut row = Vec::with_capacity(self.width as usize * 3);
        for y in 0..self.height {
            row.clear();
            for x in 0..self.width {
                if let Some(px) = self.get_pixel(x, y) {
                    row.extend_from_slice(&px.to_bytes());
                }
            }
            out.write_all(&row).context("Failed to write PPM pixels")?;
        }
        out.flush().context("Failed to flush PPM output")?;
        Ok(())
    }

    /// Releases the backing memory and returns the handle, which may be
    /// initialized again or dropped.
    pub fn deinit(self) -> SurfaceHandle {
        debug!("Surface deinit: {:?}", self.handle.source);
        let FrameSurface { handle, memory, .. } = self;
        drop(memory);
        handle
    }
}
