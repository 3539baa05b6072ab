use std::fs;
use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tween::Ease;

/// Errors raised while reading a [`SceneConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Tunables for the hover plane. Every field falls back to the values the
/// effect was designed with, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub plane: PlaneConfig,
    pub assets: AssetConfig,
    pub hover: HoverConfig,
    /// Upper bound applied to the device pixel ratio.
    pub max_pixel_ratio: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            plane: PlaneConfig::default(),
            assets: AssetConfig::default(),
            hover: HoverConfig::default(),
            max_pixel_ratio: 2.0,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but cannot drive the scene.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let duration = self.hover.duration;
        if !(0.0..=HoverConfig::MAX_DURATION).contains(&duration) {
            return Err(ConfigError::Invalid {
                field: "hover.duration",
                message: format!(
                    "{duration} is outside 0..={} seconds",
                    HoverConfig::MAX_DURATION
                ),
            });
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 12.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneConfig {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            width: 8.0,
            height: 8.0,
            width_segments: 100,
            height_segments: 1,
        }
    }
}

/// Image sources for the three texture uniforms. Plain paths are read from
/// disk, `http(s)://` sources are fetched over the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub logo_primary: String,
    pub logo_secondary: String,
    pub displacement: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            logo_primary: "images/textures/LNC-purple.png".to_string(),
            logo_secondary: "images/textures/LNC-pink.png".to_string(),
            displacement: "https://images.unsplash.com/photo-1517431397609-ab159afd52ed?ixlib=rb-1.2.1&q=85&fm=jpg&crop=entropy&cs=srgb&ixid=eyJhcHBfaWQiOjE0NTg5fQ".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    /// Transition length in seconds.
    pub duration: f32,
    pub ease: Ease,
}

impl HoverConfig {
    /// Longest accepted transition, in seconds.
    pub const MAX_DURATION: f32 = 3600.0;

    /// Transition length, clamped into `0..=MAX_DURATION`. NaN reads as zero.
    pub fn transition(&self) -> Duration {
        Duration::try_from_secs_f32(self.duration.clamp(0.0, Self::MAX_DURATION))
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            duration: 0.5,
            ease: Ease::default(),
        }
    }
}
