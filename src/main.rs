// src/main.rs

use glyphfb::{
    color::BLACK,
    config::Config,
    decoder::JpegBlockDecoder,
    glyph::FontTable,
    renderer::{Cursor, TextRenderer},
    surface::SurfaceHandle,
};

use anyhow::{anyhow, Context};
use log::{info, warn};
use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;

/// Turns the optional first argument into the text to draw. Shells make a
/// real newline awkward to pass, so the two-character escape also works.
fn text_override(arg: Option<OsString>) -> anyhow::Result<Option<String>> {
    let Some(arg) = arg else {
        return Ok(None);
    };
    let text = arg
        .into_string()
        .map_err(|raw| anyhow!("Text argument is not valid Unicode: {:?}", raw))?;
    Ok(Some(text.replace("\\n", "\n")))
}

/// Main entry point for the `glyphfb` demo.
fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting glyphfb...");

    let config = Config::global()?;

    let text = text_override(std::env::args_os().nth(1))?
        .unwrap_or_else(|| config.text.content.clone());
    let start = Cursor::new(config.text.origin_x, config.text.origin_y);

    let font = FontTable::builtin();
    info!(
        "Font '{}': {}x{} cells, {} glyphs",
        font.name(),
        font.cell().width,
        font.cell().height,
        font.glyph_count()
    );
    if font.glyph_count() == 0 {
        warn!("Builtin font has no glyphs; set GLYPHFB_FONT_DIR at build time.");
    }

    let handle = SurfaceHandle::new(config.surface.source());
    let mut surface = handle.init().context("Can't open framebuffer")?;

    if config.surface.clear_first {
        surface.fill(BLACK);
    }

    let mut renderer = TextRenderer::new(&font, JpegBlockDecoder::new());
    let summary = renderer.render(&text, start, &mut surface);
    info!(
        "Rendered {} glyphs ({} missing, {} failed to decode), pen ended at {:?}",
        summary.drawn, summary.missing, summary.failed, summary.cursor
    );

    if let Some(path) = &config.surface.dump_ppm {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        surface
            .write_ppm(BufWriter::new(file))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Surface written to {}", path.display());
    }

    drop(surface.deinit());
    info!("glyphfb exited successfully.");
    Ok(())
}
