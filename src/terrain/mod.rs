//! # Terrain
//!
//! Heightmap-displaced terrain: the base mesh, its two textures and the
//! displacement scale uniform, plus CPU references of both shader stages.
//!
//! The GPU path lives in `gfx/rendering/terrain.wgsl`; the functions here
//! compute exactly what that shader computes so the behavior can be tested
//! without a device.

pub mod color_map;
pub mod displacement;
pub mod heightmap;
pub mod sampling;
pub mod shading;
pub mod texture_image;

pub use color_map::ColorMap;
pub use displacement::{DisplacedVertex, DisplacementStage};
pub use heightmap::Heightmap;
pub use shading::{shade_fragment, Facing};
pub use texture_image::TextureImage;

use cgmath::Matrix4;

use crate::config::TerrainConfig;
use crate::error::TextureError;
use crate::gfx::geometry::{generate_plane, GeometryData};

/// Terrain scene description consumed by the renderer
#[derive(Debug, Clone)]
pub struct Terrain {
    pub geometry: GeometryData,
    pub heightmap: Option<Heightmap>,
    pub color_map: ColorMap,
    displacement_scale: f32,
    /// Mesh units to world units
    world_scale: f32,
}

impl Terrain {
    pub fn new(heightmap: Option<Heightmap>, color_map: ColorMap, config: &TerrainConfig) -> Self {
        if heightmap.is_none() {
            log::warn!("No heightmap configured; terrain renders flat");
        }
        Self {
            geometry: generate_plane(config.size, config.size, config.segments, config.segments),
            heightmap,
            color_map,
            displacement_scale: config.displacement_scale,
            world_scale: config.world_scale(),
        }
    }

    /// Decodes both textures named by `config`. Either load failing fails the whole terrain.
    pub fn load(config: &TerrainConfig) -> Result<Self, TextureError> {
        let heightmap = config
            .heightmap
            .as_deref()
            .map(Heightmap::load)
            .transpose()?;
        let color_map = ColorMap::load(&config.color_map)?;
        Ok(Self::new(heightmap, color_map, config))
    }

    pub fn displacement_scale(&self) -> f32 {
        self.displacement_scale
    }

    /// Non-finite values are ignored
    pub fn set_displacement_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.displacement_scale = scale;
        } else {
            log::warn!("Ignoring non-finite displacement scale {scale}");
        }
    }

    pub fn displacement_stage(&self) -> DisplacementStage<'_> {
        DisplacementStage::new(self.heightmap.as_ref(), self.displacement_scale)
    }

    /// Mesh-to-world transform: the footprint is scaled to one world unit
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_scale(self.world_scale)
    }

    /// Texture coordinate under a world-space XY position
    pub fn world_to_uv(&self, x: f32, y: f32) -> [f32; 2] {
        [x + 0.5, 0.5 - y]
    }

    /// World-space height of the displaced surface at a world XY position
    pub fn surface_height(&self, x: f32, y: f32) -> f32 {
        self.displacement_stage().offset_at(self.world_to_uv(x, y)) * self.world_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(scale: f32) -> TerrainConfig {
        TerrainConfig {
            heightmap: None,
            color_map: "unused.png".into(),
            displacement_scale: scale,
            size: 1024.0,
            segments: 8,
        }
    }

    #[test]
    fn uniform_terrain_surface_height_in_world_units() {
        let terrain = Terrain::new(
            Some(Heightmap::uniform(0.5)),
            ColorMap::solid([10, 20, 30]),
            &config(60.0),
        );
        assert!((terrain.surface_height(0.1, -0.3) - 30.0 / 1024.0).abs() < 1e-7);
    }

    #[test]
    fn world_to_uv_matches_mesh_uvs() {
        let terrain = Terrain::new(None, ColorMap::solid([0, 0, 0]), &config(1.0));
        let model = terrain.model_matrix();
        for (p, uv) in terrain.geometry.vertices.iter().zip(&terrain.geometry.tex_coords) {
            let world = model * cgmath::Vector4::new(p[0], p[1], p[2], 1.0);
            let mapped = terrain.world_to_uv(world.x, world.y);
            assert!((mapped[0] - uv[0]).abs() < 1e-5 && (mapped[1] - uv[1]).abs() < 1e-5);
        }
    }

    #[test]
    fn surface_queries_leave_the_color_map_encoded() {
        let terrain = Terrain::new(
            Some(Heightmap::uniform(0.25)),
            ColorMap::solid([200, 100, 50]),
            &config(60.0),
        );
        terrain.surface_height(0.0, 0.0);
        assert!(!terrain.color_map.is_decoded());
    }

    #[test]
    fn flat_without_heightmap() {
        let terrain = Terrain::new(None, ColorMap::solid([0, 0, 0]), &config(60.0));
        assert_eq!(terrain.surface_height(0.2, 0.2), 0.0);
    }

    #[test]
    fn rejects_non_finite_scale_updates() {
        let mut terrain = Terrain::new(None, ColorMap::solid([0, 0, 0]), &config(60.0));
        terrain.set_displacement_scale(f32::INFINITY);
        assert_eq!(terrain.displacement_scale(), 60.0);
        terrain.set_displacement_scale(12.0);
        assert_eq!(terrain.displacement_scale(), 12.0);
    }

    #[test]
    fn load_reports_missing_color_map() {
        assert!(matches!(
            Terrain::load(&config(60.0)),
            Err(TextureError::Decode { .. })
        ));
    }
}
