//! Global uniform bindings for camera and lighting data
//!
//! Bound at group 0 by every pipeline: the camera matrices used by both the
//! terrain and the asset shaders, plus the ambient and sun terms the asset
//! shader lights with.

use cgmath::{InnerSpace, Vector3};

use crate::{
    config::LightingConfig,
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],  // Camera position (homogeneous coordinates)
    view_proj: [[f32; 4]; 4], // Camera view-projection matrix
    ambient: [f32; 4],        // rgb * intensity, w unused
    sun_direction: [f32; 4],  // Direction the light travels, xyz normalized, w = intensity
}
// Total: 16 + 64 + 16 + 16 = 112 bytes

impl GlobalUBOContent {
    pub fn new(camera: CameraUniform, lighting: &LightingConfig) -> Self {
        let [r, g, b] = lighting.ambient_color;
        let k = lighting.ambient_intensity;
        let sun = Vector3::from(lighting.sun_direction);
        let sun = if sun.magnitude2() > f32::EPSILON {
            sun.normalize()
        } else {
            -Vector3::unit_z()
        };
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            ambient: [r * k, g * k, b * k, 0.0],
            sun_direction: [sun.x, sun.y, sun.z, lighting.sun_intensity],
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Writes the per-frame camera and lighting data
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    lighting: &LightingConfig,
) {
    ubo.update_content(queue, GlobalUBOContent::new(camera, lighting));
}

/// Bind group layout and bind group for the global uniforms (group 0)
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform()) // Globals (camera + light)
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    /// Used when creating render pipelines that need access to global uniforms.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
