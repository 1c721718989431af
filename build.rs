// build.rs

//! Embeds the builtin font into the binary.
//!
//! The font directory is produced by the font build tooling: a `font.json`
//! carrying `name`, `width` and `height`, plus one compressed image per glyph
//! named by its two-digit hex character code (`41.jpg` for 'A'). Every file is
//! pulled in with `include_bytes!`, so nothing is parsed at run time.
//!
//! The tree ships a small font in `fonts/default`. If the directory is missing
//! we still emit a (glyph-less) table so the crate builds; the renderer then
//! just advances the cursor over every character.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const FONT_DIR_ENV: &str = "GLYPHFB_FONT_DIR";
const DEFAULT_FONT_DIR: &str = "fonts/default";
const FIRST_CODE: u32 = 0x20;
const LAST_CODE: u32 = 0x7E;
const FALLBACK_WIDTH: u64 = 32;
const FALLBACK_HEIGHT: u64 = 64;

struct FontMeta {
    name: String,
    width: u64,
    height: u64,
}

fn main() {
    println!("cargo:rerun-if-env-changed={}", FONT_DIR_ENV);

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let font_dir = match env::var(FONT_DIR_ENV) {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => manifest_dir.join(DEFAULT_FONT_DIR),
    };
    println!("cargo:rerun-if-changed={}", font_dir.display());

    let meta = read_meta(&font_dir);
    let mut slots = String::new();
    let mut found = 0;
    for code in FIRST_CODE..=LAST_CODE {
        let path = font_dir.join(format!("{:02x}.jpg", code));
        if path.is_file() {
            println!("cargo:rerun-if-changed={}", path.display());
            writeln!(
                slots,
                "    Some(include_bytes!({:?}) as &[u8]),",
                path.canonicalize().unwrap().display().to_string()
            )
            .unwrap();
            found += 1;
        } else {
            slots.push_str("    None,\n");
        }
    }

    if found == 0 {
        println!(
            "cargo:warning=no glyphs found in {}; builtin font will be empty",
            font_dir.display()
        );
    }

    let generated = format!(
        "pub const NAME: &str = {:?};\n\
         pub const CELL_WIDTH: u32 = {};\n\
         pub const CELL_HEIGHT: u32 = {};\n\
         pub static SLOTS: [Option<&'static [u8]>; {}] = [\n{}];\n",
        meta.name,
        meta.width,
        meta.height,
        LAST_CODE - FIRST_CODE + 1,
        slots
    );

    let out = PathBuf::from(env::var("OUT_DIR").unwrap()).join("builtin_font.rs");
    fs::write(&out, generated).unwrap();
}

fn read_meta(font_dir: &Path) -> FontMeta {
    let fallback = FontMeta {
        name: "empty".to_string(),
        width: FALLBACK_WIDTH,
        height: FALLBACK_HEIGHT,
    };

    let meta_path = font_dir.join("font.json");
    let Ok(text) = fs::read_to_string(&meta_path) else {
        return fallback;
    };
    println!("cargo:rerun-if-changed={}", meta_path.display());

    let value: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => panic!("{} is not valid JSON: {}", meta_path.display(), e),
    };

    FontMeta {
        name: value["name"].as_str().unwrap_or("unnamed").to_string(),
        width: value["width"].as_u64().unwrap_or(FALLBACK_WIDTH),
        height: value["height"].as_u64().unwrap_or(FALLBACK_HEIGHT),
    }
}
