//! Render pass extensions for mesh drawing

use wgpu::*;

use crate::gfx::resources::MeshBuffers;

/// Extension trait for RenderPass to draw uploaded meshes
pub trait RenderPassExt {
    fn draw_mesh(&mut self, mesh: &MeshBuffers);
}

impl RenderPassExt for RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &MeshBuffers) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
