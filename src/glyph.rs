// src/glyph.rs

//! Defines the `Glyph` record and the `FontTable` that maps printable ASCII
//! characters to their compressed glyph images.
//!
//! Fonts are monospaced: every glyph decodes into the same `CellSize`. The
//! table holds one optional slot per character in `[0x20, 0x7E]`; an empty
//! slot means the character has no visible glyph (commonly the space).

use anyhow::{bail, Result};
use log::warn;

/// First character code with a slot in the table (space).
pub const FIRST_GLYPH: u32 = 0x20;
/// Last character code with a slot in the table (tilde).
pub const LAST_GLYPH: u32 = 0x7E;
/// Number of slots in every `FontTable`.
pub const GLYPH_SLOTS: usize = (LAST_GLYPH - FIRST_GLYPH + 1) as usize;

/// Size of one glyph cell in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl CellSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of luma bytes needed to hold one decoded glyph.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Compressed image data for a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph<'a> {
    pub code: char,
    pub data: &'a [u8],
}

impl Glyph<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Lookup from character code to compressed glyph data.
#[derive(Debug, Clone)]
pub struct FontTable<'a> {
    name: String,
    cell: CellSize,
    slots: [Option<&'a [u8]>; GLYPH_SLOTS],
}

mod builtin {
    include!(concat!(env!("OUT_DIR"), "/builtin_font.rs"));
}

impl<'a> FontTable<'a> {
    /// A table with no glyphs at all.
    pub fn empty(name: impl Into<String>, cell: CellSize) -> Self {
        Self {
            name: name.into(),
            cell,
            slots: [None; GLYPH_SLOTS],
        }
    }

    /// Builds a table from a slice of exactly `GLYPH_SLOTS` entries, indexed by
    /// `code - 0x20`.
    pub fn from_slots(
        name: impl Into<String>,
        cell: CellSize,
        slots: &[Option<&'a [u8]>],
    ) -> Result<Self> {
        if slots.len() != GLYPH_SLOTS {
            bail!(
                "font table needs {} glyph slots, got {}",
                GLYPH_SLOTS,
                slots.len()
            );
        }
        let mut table = Self::empty(name, cell);
        table.slots.copy_from_slice(slots);
        Ok(table)
    }

    /// Sets the glyph data for `c`. Codes outside the printable ASCII range
    /// have no slot and are dropped.
    pub fn with_glyph(mut self, c: char, data: &'a [u8]) -> Self {
        match slot_index(c) {
            Some(idx) => self.slots[idx] = Some(data),
            None => warn!(
                "FontTable '{}': no slot for {:?} (U+{:04X}), glyph dropped",
                self.name, c, c as u32
            ),
        }
        self
    }

    /// Returns the compressed glyph for `c`, or `None` if the character is
    /// outside `[0x20, 0x7E]` or has no data.
    pub fn glyph(&self, c: char) -> Option<Glyph<'a>> {
        let data = self.slots[slot_index(c)?]?;
        if data.is_empty() {
            return None;
        }
        Some(Glyph { code: c, data })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self) -> CellSize {
        self.cell
    }

    /// Number of characters that have glyph data.
    pub fn glyph_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.is_some_and(|d| !d.is_empty()))
            .count()
    }
}

impl FontTable<'static> {
    /// The font embedded by the build script.
    pub fn builtin() -> Self {
        let mut table = Self::empty(
            builtin::NAME,
            CellSize::new(builtin::CELL_WIDTH, builtin::CELL_HEIGHT),
        );
        table.slots = builtin::SLOTS;
        table
    }
}

fn slot_index(c: char) -> Option<usize> {
    let code = c as u32;
    if (FIRST_GLYPH..=LAST_GLYPH).contains(&code) {
        Some((code - FIRST_GLYPH) as usize)
    } else {
        None
    }
}
