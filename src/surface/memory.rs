// src/surface/memory.rs

//! Heap-backed pixel memory for headless rendering and tests.

use super::PixelMemory;

pub struct MemoryPixels {
    buffer: Box<[u8]>,
}

impl MemoryPixels {
    /// Allocates a zeroed RGB24 buffer of `width * height * 3` bytes.
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize * 3;
        Self {
            buffer: vec![0u8; size].into_boxed_slice(),
        }
    }
}

impl PixelMemory for MemoryPixels {
    fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }
}
