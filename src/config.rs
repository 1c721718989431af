// src/config.rs

//! Configuration for the `glyphfb` demo driver.
//!
//! The configuration is read from a JSON file named by the `GLYPHFB_CONFIG`
//! environment variable. Every field has a default, so a partial file (or no
//! file at all) is fine. The defaults reproduce the original demo: draw the
//! sample text on `/dev/fb0` starting at (50, 200).

use crate::surface::SurfaceSource;
use anyhow::{anyhow, Context, Result};
use log::info;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the path of the configuration file.
pub const CONFIG_ENV: &str = "GLYPHFB_CONFIG";

/// Global configuration, loaded on first access. The load result is kept so
/// that a malformed file stays an error for every caller; see `Config::global`.
pub static CONFIG: Lazy<Result<Config, String>> =
    Lazy::new(|| Config::load_from_env().map_err(|e| format!("{:#}", e)));

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)] // Apply default values for the entire struct if a field is missing.
pub struct Config {
    /// Where pixels are drawn.
    pub surface: SurfaceConfig,
    /// What is drawn and where it starts.
    pub text: TextConfig,
}

impl Config {
    /// Loads the file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "No configuration at {}, using defaults.",
                path.display()
            );
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Configuration loaded from {}.", path.display());
        Ok(config)
    }

    /// Loads the file named by `GLYPHFB_CONFIG`, or the defaults if unset.
    pub fn load_from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Config::default()),
        }
    }

    /// The global configuration, or the error that loading it produced.
    pub fn global() -> Result<&'static Config> {
        Lazy::force(&CONFIG)
            .as_ref()
            .map_err(|e| anyhow!("{}", e))
            .context("Failed to load configuration")
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// --- Surface Configuration ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Linux framebuffer device.
    #[default]
    Device,
    /// In-memory surface, optionally dumped as PPM.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub backend: Backend,
    /// Framebuffer device path, for the `device` backend.
    pub device: PathBuf,
    /// Surface width in pixels, for the `memory` backend.
    pub width: u32,
    /// Surface height in pixels, for the `memory` backend.
    pub height: u32,
    /// If set, the surface is written here as a PPM image after rendering.
    pub dump_ppm: Option<PathBuf>,
    /// Fill the surface with black before rendering.
    pub clear_first: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            backend: Backend::Device,
            device: PathBuf::from("/dev/fb0"),
            width: 800,
            height: 480,
            dump_ppm: None,
            clear_first: false,
        }
    }
}

impl SurfaceConfig {
    pub fn source(&self) -> SurfaceSource {
        match self.backend {
            Backend::Device => SurfaceSource::Device(self.device.clone()),
            Backend::Memory => SurfaceSource::Memory {
                width: self.width,
                height: self.height,
            },
        }
    }
}

// --- Text Configuration ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub content: String,
    /// Pen x at the start of every line.
    pub origin_x: u32,
    /// Pen y for the first line.
    pub origin_y: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        TextConfig {
            content: "Hello, World!\nThis is a test !@#$%^&*({}[\\|".to_string(),
            origin_x: 50,
            origin_y: 200,
        }
    }
}
