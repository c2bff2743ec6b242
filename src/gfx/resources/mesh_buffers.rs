use wgpu::util::DeviceExt;

use crate::gfx::geometry::GeometryData;

/// Vertex and index buffers uploaded from [`GeometryData`]
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffers {
    /// Returns `None` for empty geometry, which has nothing to draw
    pub fn from_geometry(device: &wgpu::Device, geometry: &GeometryData, label: &str) -> Option<Self> {
        let (vertices, indices) = geometry.to_scene_format();
        if vertices.is_empty() || indices.is_empty() {
            log::warn!("Skipping upload of empty mesh '{label}'");
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }
}
