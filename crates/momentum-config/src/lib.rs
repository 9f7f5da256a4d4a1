//! Configuration management for momentum.
//!
//! Loads configuration from TOML files. Every section falls back to its
//! defaults, so a partial file only needs the keys it changes.

use std::fs;
use std::path::{Path, PathBuf};

use momentum_core::Period;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub viewport: ViewportConfig,
    pub refresh: RefreshConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations.
    ///
    /// Searches in order:
    /// 1. `./momentum.toml`
    /// 2. `~/.config/momentum/config.toml`
    ///
    /// Returns default config if no file found.
    pub fn load_default() -> Self {
        Self::find().map(|(_, config)| config).unwrap_or_default()
    }

    /// The first readable config in the default locations, with its path.
    pub fn find() -> Option<(PathBuf, Self)> {
        Self::search_paths()
            .into_iter()
            .find_map(|path| Self::load(&path).ok().map(|config| (path, config)))
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_path()];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("momentum").join("config.toml"));
        }
        paths
    }

    /// Save configuration to a file path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("momentum.toml")
    }
}

/// General application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Period code selected on startup.
    pub default_period: String,
    /// Snapshot file to load on startup.
    pub data_path: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_period: "1m".to_string(),
            data_path: None,
        }
    }
}

impl GeneralConfig {
    /// The configured startup period, falling back to one minute for
    /// unknown codes.
    pub fn period(&self) -> Period {
        Period::from_code(&self.default_period).unwrap_or(Period::Min1)
    }
}

/// Zoom, pan and rendering limits shared by both charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub default_visible_count: usize,
    pub min_count: usize,
    pub max_count: usize,
    /// Hard cap on candles handed to the renderer, applied after windowing.
    pub render_cap: usize,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    /// Pixel width that spans the whole visible range when panning.
    pub pan_pixel_span: f64,
    /// Lower bound on pan sensitivity at deep zoom.
    pub min_candles_per_pixel: f64,
    /// Candles moved per keyboard navigation step.
    pub navigation_step: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            default_visible_count: 50,
            min_count: 10,
            max_count: 1000,
            render_cap: 800,
            zoom_in_factor: 0.7,
            zoom_out_factor: 1.4,
            pan_pixel_span: 800.0,
            min_candles_per_pixel: 0.02,
            navigation_step: 5,
        }
    }
}

/// Refresh tick configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub tick_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { tick_ms: 500 }
    }
}

/// Candle cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry count above which stale buckets are swept.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 512 }
    }
}
