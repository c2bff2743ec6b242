//! # Primitive Shape Generation
//!
//! The terrain base mesh is a subdivided plane in the XY plane of the Z-up
//! world, generated once and displaced only by the vertex shader.

use super::GeometryData;

/// Generate a plane in the XY plane (horizontal in Z-up coordinate system)
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
///
/// Returns a plane centered at the origin with normal pointing up (positive Z).
/// `u` runs along +X; `v` runs along -Y because image rows are stored top-down,
/// which keeps the top row of a texture at the +Y edge.
pub fn generate_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    let vertex_count = ((w_segs + 1) * (h_segs + 1)) as usize;
    data.vertices.reserve(vertex_count);
    data.normals.reserve(vertex_count);
    data.tex_coords.reserve(vertex_count);

    for y in 0..=h_segs {
        let t = y as f32 / h_segs as f32;
        let pos_y = (t - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            data.tex_coords.push([u, 1.0 - t]);
        }
    }

    // Counter-clockwise winding when viewed from above
    data.indices.reserve((w_segs * h_segs * 6) as usize);
    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}
