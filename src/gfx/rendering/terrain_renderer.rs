//! GPU side of the terrain: mesh buffers, both textures and the
//! `TerrainParams` uniform, bound at group 1 of the terrain pipeline.

use crate::{
    error::TextureError,
    gfx::{
        camera::camera_utils::convert_matrix4_to_array,
        resources::{MeshBuffers, TextureResource},
    },
    terrain::{Terrain, TextureImage},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::render_pass_ext::RenderPassExt;

/// MUST match `TerrainParams` in `terrain.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainUniform {
    pub model: [[f32; 4]; 4],
    pub displacement_scale: f32,
    _padding: [f32; 3],
}
// Total: 64 + 4 + 12 = 80 bytes

impl TerrainUniform {
    pub fn new(terrain: &Terrain) -> Self {
        Self {
            model: convert_matrix4_to_array(terrain.model_matrix()),
            displacement_scale: terrain.displacement_scale(),
            _padding: [0.0; 3],
        }
    }
}

/// Texture bound in place of a missing heightmap: black, so every vertex
/// keeps its base position.
pub fn flat_heightmap_image() -> TextureImage {
    TextureImage::solid("Flat Heightmap", 1, 1, [0, 0, 0, 255])
}

/// Bind group layout for group 1: params, heightmap, color map, sampler
pub fn terrain_layout_builder() -> BindGroupLayoutBuilder {
    BindGroupLayoutBuilder::new()
        .next_binding_vertex(binding_types::uniform()) // TerrainParams
        .next_binding_vertex(binding_types::texture_2d()) // heightmap
        .next_binding_fragment(binding_types::texture_2d()) // color map
        .next_binding_rendering(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
}

pub struct TerrainRenderer {
    mesh: Option<MeshBuffers>,
    uniform: UniformBuffer<TerrainUniform>,
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
    _heightmap: TextureResource,
    _color_map: TextureResource,
}

impl TerrainRenderer {
    /// Uploads the terrain mesh and both textures
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        terrain: &Terrain,
    ) -> Result<Self, TextureError> {
        let heightmap = match &terrain.heightmap {
            Some(heightmap) => TextureResource::from_image(device, queue, heightmap.image())?,
            None => {
                log::warn!("No heightmap loaded; binding a flat fallback texture");
                TextureResource::from_image(device, queue, &flat_heightmap_image())?
            }
        };
        let color_map = TextureResource::from_image(device, queue, terrain.color_map.image())?;

        let mesh = MeshBuffers::from_geometry(device, &terrain.geometry, "Terrain");
        let uniform = UniformBuffer::new_with_data(device, &TerrainUniform::new(terrain));

        let bind_group_layout = terrain_layout_builder().create(device, "Terrain Bind Group Layout");

        // One sampler serves both textures so they wrap identically
        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(uniform.binding_resource())
            .texture(&heightmap.view)
            .texture(&color_map.view)
            .sampler(&color_map.sampler)
            .create(device, "Terrain Bind Group");

        Ok(Self {
            mesh,
            uniform,
            bind_group_layout,
            bind_group,
            _heightmap: heightmap,
            _color_map: color_map,
        })
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// Writes the current displacement scale and model matrix
    pub fn update(&mut self, queue: &wgpu::Queue, terrain: &Terrain) {
        self.uniform.update_content(queue, TerrainUniform::new(terrain));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if let Some(mesh) = &self.mesh {
            render_pass.set_bind_group(1, &self.bind_group, &[]);
            render_pass.draw_mesh(mesh);
        }
    }
}
