// src/decoder/stream.rs

use std::io;

/// Cursor over one in-memory compressed blob.
///
/// The decoder pulls bytes through `next`; a short read (including zero at
/// the end of the blob) means "no more input" and is never an error.
#[derive(Debug, Clone)]
pub struct BlockStream<'a> {
    data: &'a [u8],
    position: usize,
    remaining: usize,
}

impl<'a> BlockStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            remaining: data.len(),
        }
    }

    /// Copies up to `buf.len()` bytes into `buf` and returns how many were
    /// copied, `min(buf.len(), remaining)`.
    pub fn next(&mut self, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.remaining);
        buf[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        self.remaining -= count;
        debug_assert_eq!(self.position + self.remaining, self.data.len());
        count
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Total length of the underlying blob.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

impl io::Read for BlockStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.next(buf))
    }
}
