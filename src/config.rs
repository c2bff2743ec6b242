//! Viewer configuration
//!
//! A single [`ViewerConfig`] drives every viewer variant: terrain only,
//! terrain with a static asset, and terrain with an animated asset. The
//! config is plain JSON; every field has a default so an empty object `{}`
//! produces the stock scene.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub terrain: TerrainConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub lighting: LightingConfig,
    /// Optional asset placed on the terrain
    pub asset: Option<AssetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Terrain Viewer".to_string(),
            width: 1200,
            height: 800,
            vsync: true,
        }
    }
}

/// Terrain mesh, textures and displacement uniform
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Grayscale heightmap. `None` renders a flat plane.
    pub heightmap: Option<PathBuf>,
    /// Surface color map
    pub color_map: PathBuf,
    /// Elevation multiplier in mesh units
    pub displacement_scale: f32,
    /// Edge length of the square base mesh in mesh units
    pub size: f32,
    /// Quads along each edge of the base mesh
    pub segments: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            heightmap: Some(PathBuf::from("assets/heightmap.png")),
            color_map: PathBuf::from("assets/color_map.png"),
            displacement_scale: 60.0,
            size: 1024.0,
            segments: 256,
        }
    }
}

impl TerrainConfig {
    /// Uniform scale applied to the terrain mesh so its footprint is one world unit
    pub fn world_scale(&self) -> f32 {
        1.0 / self.size
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.5, 0.5, 0.5],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 45.0,
            near: 0.01,
            far: 1000.0,
        }
    }
}

/// Orbit controller bounds and speeds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    /// Polar angle bounds in radians, measured from the +Z axis
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub auto_rotate: bool,
    /// Matches the usual orbit-control convention: 2.0 is one turn per 30 s
    pub auto_rotate_speed: f32,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: Some(1.0),
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            auto_rotate: true,
            auto_rotate_speed: 0.7,
            enable_pan: true,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            pan_speed: 0.01,
        }
    }
}

/// Lighting used by asset meshes. The terrain shader is unlit.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub sun_direction: [f32; 3],
    pub sun_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.6,
            sun_direction: [-0.4, -0.3, -1.0],
            sun_intensity: 0.6,
        }
    }
}

/// Optional scene asset and its placement relative to the terrain
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub path: PathBuf,
    /// World-space XY position on the terrain footprint
    pub position: [f32; 2],
    /// Uniform scale applied to the asset root
    pub scale: f32,
    pub yaw_degrees: f32,
    /// Rest the asset on the displaced terrain surface instead of z = 0
    pub snap_to_terrain: bool,
    pub height_offset: f32,
    /// Start looped playback of the first clip on mount
    pub autoplay: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            position: [0.0, 0.0],
            scale: 0.05,
            yaw_degrees: 0.0,
            snap_to_terrain: true,
            height_offset: 0.0,
            autoplay: true,
        }
    }
}

impl ViewerConfig {
    /// Reads and validates a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a JSON config string
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let terrain = &self.terrain;
        if !terrain.displacement_scale.is_finite() {
            return Err(ConfigError::InvalidScale(terrain.displacement_scale));
        }
        if terrain.segments == 0 || !(terrain.size > 0.0) {
            return Err(ConfigError::InvalidTerrainGrid);
        }

        let controls = &self.controls;
        if let (Some(min), Some(max)) = (controls.min_distance, controls.max_distance) {
            if min > max {
                return Err(ConfigError::InvalidDistanceBounds { min, max });
            }
        }
        let (min, max) = (controls.min_polar_angle, controls.max_polar_angle);
        if !(0.0..=PI).contains(&min) || !(0.0..=PI).contains(&max) || min > max {
            return Err(ConfigError::InvalidPolarRange { min, max });
        }

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(ConfigError::InvalidClipPlanes {
                near: camera.near,
                far: camera.far,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ViewerConfig::from_json_str("{}").unwrap();
        assert_eq!(config.terrain.displacement_scale, 60.0);
        assert_eq!(config.terrain.segments, 256);
        assert_eq!(config.controls.max_distance, Some(1.0));
        assert!(config.controls.auto_rotate);
        assert_eq!(config.camera.near, 0.01);
        assert_eq!(config.camera.far, 1000.0);
        assert!(config.asset.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ViewerConfig::from_json_str(
            r#"{
                "terrain": { "displacement_scale": 12.5 },
                "asset": { "path": "models/bird.glb", "scale": 0.1 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.terrain.displacement_scale, 12.5);
        assert_eq!(config.terrain.size, 1024.0);
        let asset = config.asset.unwrap();
        assert_eq!(asset.path, PathBuf::from("models/bird.glb"));
        assert_eq!(asset.scale, 0.1);
        assert!(asset.autoplay);
    }

    #[test]
    fn flat_terrain_without_heightmap() {
        let config = ViewerConfig::from_json_str(r#"{ "terrain": { "heightmap": null } }"#).unwrap();
        assert!(config.terrain.heightmap.is_none());
    }

    #[test]
    fn rejects_inverted_distance_bounds() {
        let err = ViewerConfig::from_json_str(
            r#"{ "controls": { "min_distance": 2.0, "max_distance": 1.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDistanceBounds { .. }));
    }

    #[test]
    fn rejects_polar_range_outside_half_turn() {
        let err = ViewerConfig::from_json_str(r#"{ "controls": { "max_polar_angle": 4.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPolarRange { .. }));
    }

    #[test]
    fn rejects_non_finite_scale() {
        let mut config = ViewerConfig::default();
        config.terrain.displacement_scale = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidScale(_))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ViewerConfig::from_json_str("{ terrain: }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn demo_config_parses() {
        let config = ViewerConfig::from_json_str(include_str!("../demos/viewer.json")).unwrap();
        assert_eq!(config.camera.eye, [0.5, 0.5, 0.5]);
        let asset = config.asset.unwrap();
        assert!(asset.snap_to_terrain);
        assert_eq!(asset.position, [0.1, -0.1]);
    }

    #[test]
    fn world_scale_maps_footprint_to_unit() {
        let terrain = TerrainConfig::default();
        assert_eq!(terrain.size * terrain.world_scale(), 1.0);
    }
}
