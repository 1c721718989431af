//! glyphfb library crate.
//!
//! Renders monospaced text onto a framebuffer by decoding per-glyph
//! compressed grayscale images and compositing them into the surface.
//!
//! ```text
//! char → FontTable → bytes → BlockStream → BlockDecoder → McuBlock*
//!      → McuCompositor → GlyphRaster → FrameSurface
//! ```

pub mod color;
pub mod compositor;
pub mod config;
pub mod decoder;
pub mod glyph;
pub mod renderer;
pub mod surface;
