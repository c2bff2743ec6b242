//! Vertex displacement stage
//!
//! CPU reference of `vs_main` in `terrain.wgsl`. Each vertex moves along its
//! normal by `scale * heightmap.sample(uv)`; the texture coordinate passes
//! through untouched. Without a heightmap the offset is zero, which leaves
//! the flat base mesh.

use cgmath::{InnerSpace, Vector3};

use super::heightmap::Heightmap;
use crate::gfx::geometry::GeometryData;

/// Output of the vertex stage for one vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacedVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

/// The displacement uniforms bound for one draw
#[derive(Debug, Clone, Copy)]
pub struct DisplacementStage<'a> {
    heightmap: Option<&'a Heightmap>,
    scale: f32,
}

impl<'a> DisplacementStage<'a> {
    pub fn new(heightmap: Option<&'a Heightmap>, scale: f32) -> Self {
        Self { heightmap, scale }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Offset along the normal at `uv`
    pub fn offset_at(&self, uv: [f32; 2]) -> f32 {
        match self.heightmap {
            Some(heightmap) => self.scale * heightmap.sample(uv),
            None => 0.0,
        }
    }

    pub fn displace_vertex(
        &self,
        position: [f32; 3],
        normal: [f32; 3],
        tex_coords: [f32; 2],
    ) -> DisplacedVertex {
        let base = Vector3::from(position);
        let normal = Vector3::from(normal);

        let offset = self.offset_at(tex_coords);
        let direction = if normal.magnitude2() > 0.0 {
            normal.normalize()
        } else {
            Vector3::new(0.0, 0.0, 0.0)
        };

        DisplacedVertex {
            position: (base + direction * offset).into(),
            tex_coords,
        }
    }

    /// Runs the stage over every vertex of a mesh
    pub fn displace_geometry(&self, geometry: &GeometryData) -> Vec<DisplacedVertex> {
        geometry
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let normal = geometry.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]);
                let uv = geometry.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]);
                self.displace_vertex(position, normal, uv)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_plane;
    use crate::terrain::texture_image::TextureImage;

    fn noisy_heightmap() -> Heightmap {
        let values = (0..64).map(|i| ((i * 37) % 64) as f32 / 63.0).collect();
        Heightmap::from_linear(8, 8, values).unwrap()
    }

    #[test]
    fn mid_gray_at_scale_60_lifts_every_vertex_30_units() {
        let heightmap = Heightmap::uniform(0.5);
        let stage = DisplacementStage::new(Some(&heightmap), 60.0);
        let plane = generate_plane(1024.0, 1024.0, 16, 16);

        for (base, out) in plane.vertices.iter().zip(stage.displace_geometry(&plane)) {
            assert_eq!(out.position[0], base[0]);
            assert_eq!(out.position[1], base[1]);
            assert_eq!(out.position[2], 30.0);
        }
    }

    #[test]
    fn constant_heightmap_yields_planar_translated_mesh() {
        let heightmap = Heightmap::uniform(0.8);
        let stage = DisplacementStage::new(Some(&heightmap), 25.0);
        let plane = generate_plane(10.0, 10.0, 9, 9);
        let expected = 25.0 * 0.8;

        for (base, out) in plane.vertices.iter().zip(stage.displace_geometry(&plane)) {
            assert_eq!([out.position[0], out.position[1]], [base[0], base[1]]);
            assert!((out.position[2] - base[2] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_scale_is_identity_for_any_heightmap() {
        let heightmap = noisy_heightmap();
        let stage = DisplacementStage::new(Some(&heightmap), 0.0);
        let plane = generate_plane(1024.0, 1024.0, 32, 32);

        let displaced = stage.displace_geometry(&plane);
        for (i, out) in displaced.iter().enumerate() {
            assert_eq!(out.position, plane.vertices[i]);
            assert_eq!(out.tex_coords, plane.tex_coords[i]);
        }
    }

    #[test]
    fn doubling_scale_doubles_displacement() {
        let heightmap = noisy_heightmap();
        let plane = generate_plane(100.0, 100.0, 20, 20);
        let single = DisplacementStage::new(Some(&heightmap), 7.5).displace_geometry(&plane);
        let double = DisplacementStage::new(Some(&heightmap), 15.0).displace_geometry(&plane);

        for ((base, a), b) in plane.vertices.iter().zip(&single).zip(&double) {
            let da = a.position[2] - base[2];
            let db = b.position[2] - base[2];
            assert!((db - 2.0 * da).abs() < 1e-4, "{db} != 2 * {da}");
        }
    }

    #[test]
    fn missing_heightmap_fails_closed_to_flat_plane() {
        let stage = DisplacementStage::new(None, 60.0);
        let plane = generate_plane(8.0, 8.0, 4, 4);
        for (base, out) in plane.vertices.iter().zip(stage.displace_geometry(&plane)) {
            assert_eq!(&out.position, base);
        }
    }

    #[test]
    fn displacement_follows_the_normal() {
        let heightmap = Heightmap::uniform(1.0);
        let stage = DisplacementStage::new(Some(&heightmap), 2.0);
        let out = stage.displace_vertex([1.0, 1.0, 1.0], [3.0, 0.0, 0.0], [0.5, 0.5]);
        assert!((out.position[0] - 3.0).abs() < 1e-6);
        assert_eq!(out.position[1], 1.0);
        assert_eq!(out.position[2], 1.0);
    }

    #[test]
    fn degenerate_normal_gives_no_offset() {
        let heightmap = Heightmap::uniform(1.0);
        let stage = DisplacementStage::new(Some(&heightmap), 5.0);
        let out = stage.displace_vertex([0.0, 2.0, 0.0], [0.0, 0.0, 0.0], [0.1, 0.1]);
        assert_eq!(out.position, [0.0, 2.0, 0.0]);
    }

    #[test]
    fn sample_uses_wrapped_uv() {
        let image = TextureImage::from_gray("ramp", 4, 1, &[0, 85, 170, 255]).unwrap();
        let heightmap = Heightmap::from_image(image);
        let stage = DisplacementStage::new(Some(&heightmap), 10.0);
        let inside = stage.offset_at([0.375, 0.5]);
        let outside = stage.offset_at([0.375 + 3.0, 0.5 - 2.0]);
        assert!((inside - outside).abs() < 1e-5);
    }
}
