//! Panorama processing configuration.
//!
//! Collects the implicit conventions of the layout tools (panorama size, rasterization
//! density, stencil size, overlay colour and texture size) into one serde struct that can be
//! loaded from and saved to YAML.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::overlay::RasterConfig;
use crate::projection::{Resolution, DEFAULT_PANORAMA_HEIGHT, DEFAULT_PANORAMA_WIDTH};
use crate::texture::DEFAULT_TEXTURE_RESOLUTION;

/// Largest accepted stencil radius.
pub const MAX_STENCIL_RADIUS: u32 = 16;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    #[error("Invalid configuration: {0}")]
    InvalidParams(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::YamlError(err.to_string())
    }
}

/// Settings shared by the overlay and texture tools.
///
/// Missing YAML fields take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaConfig {
    /// Panorama width in pixels.
    pub width: u32,
    /// Panorama height in pixels.
    pub height: u32,
    /// Samples per boundary segment; `None` uses `max(width, height)`.
    pub samples_per_segment: Option<usize>,
    /// Half-length of the overlay cross stencil.
    pub stencil_radius: u32,
    /// Overlay colour as RGB.
    pub boundary_color: [u8; 3],
    /// Edge length of resampled texture patches.
    pub texture_resolution: u32,
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_PANORAMA_WIDTH,
            height: DEFAULT_PANORAMA_HEIGHT,
            samples_per_segment: None,
            stencil_radius: 1,
            boundary_color: [0, 0, 255],
            texture_resolution: DEFAULT_TEXTURE_RESOLUTION,
        }
    }
}

impl PanoramaConfig {
    /// Loads and validates a configuration file.
    pub fn load_from_yaml(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: PanoramaConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration, creating the parent directory if needed.
    pub fn save_to_yaml(&self, path: &str) -> Result<(), ConfigError> {
        let yaml_string = serde_yaml::to_string(self)?;
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, yaml_string)?;
        info!("Saved panorama configuration to {path}");
        Ok(())
    }

    /// Rejects zero image sizes and oversized stencils.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidParams(format!(
                "Panorama size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.stencil_radius > MAX_STENCIL_RADIUS {
            return Err(ConfigError::InvalidParams(format!(
                "Stencil radius {} exceeds {}",
                self.stencil_radius, MAX_STENCIL_RADIUS
            )));
        }
        if self.samples_per_segment == Some(0) {
            return Err(ConfigError::InvalidParams(
                "samples_per_segment must be positive".to_string(),
            ));
        }
        if self.texture_resolution == 0 {
            return Err(ConfigError::InvalidParams(
                "texture_resolution must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn raster_config(&self) -> RasterConfig {
        RasterConfig {
            samples_per_segment: self.samples_per_segment,
            stencil_radius: self.stencil_radius,
        }
    }
}
