//! GPU side of a mounted asset
//!
//! Every (node, primitive) pair becomes one draw with its own small uniform
//! buffer; the world matrices are rewritten each frame from the scene's
//! sampled pose.

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    gfx::{
        camera::camera_utils::convert_matrix4_to_array,
        resources::MeshBuffers,
        scene::{asset::LoadedAsset, MountedAsset},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::render_pass_ext::RenderPassExt;

/// MUST match `AssetParams` in `asset.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AssetUniform {
    pub model: [[f32; 4]; 4],
    pub base_color: [f32; 4],
}

impl AssetUniform {
    pub fn new(model: Matrix4<f32>, base_color: [f32; 4]) -> Self {
        Self {
            model: convert_matrix4_to_array(model),
            base_color,
        }
    }
}

/// One draw: which node's transform, which mesh primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawSlot {
    pub node: usize,
    pub mesh: usize,
    pub primitive: usize,
}

/// Draws in node order. Nodes outside the scene tree and references to
/// meshes that do not exist are skipped.
pub fn draw_slots(asset: &LoadedAsset) -> Vec<DrawSlot> {
    let reachable = asset.reachable_nodes();
    asset
        .nodes
        .iter()
        .enumerate()
        .filter(|(node, _)| reachable[*node])
        .filter_map(|(node, n)| n.mesh.map(|mesh| (node, mesh)))
        .filter_map(|(node, mesh)| asset.meshes.get(mesh).map(|m| (node, mesh, m)))
        .flat_map(|(node, mesh, m)| {
            (0..m.primitives.len()).map(move |primitive| DrawSlot {
                node,
                mesh,
                primitive,
            })
        })
        .collect()
}

pub fn asset_layout_builder() -> BindGroupLayoutBuilder {
    BindGroupLayoutBuilder::new().next_binding_rendering(binding_types::uniform())
}

struct AssetDraw {
    slot: DrawSlot,
    base_color: [f32; 4],
    uniform: UniformBuffer<AssetUniform>,
    bind_group: wgpu::BindGroup,
}

pub struct AssetRenderer {
    bind_group_layout: BindGroupLayoutWithDesc,
    /// Uploaded primitives, indexed `[mesh][primitive]`
    meshes: Vec<Vec<Option<MeshBuffers>>>,
    draws: Vec<AssetDraw>,
}

impl AssetRenderer {
    /// Creates the layout only; nothing is drawn until [`Self::upload`]
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            bind_group_layout: asset_layout_builder().create(device, "Asset Bind Group Layout"),
            meshes: Vec::new(),
            draws: Vec::new(),
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// Replaces the uploaded asset (`None` clears it)
    pub fn upload(&mut self, device: &wgpu::Device, mounted: Option<&MountedAsset>) {
        self.meshes.clear();
        self.draws.clear();
        let Some(mounted) = mounted else {
            log::debug!("Cleared asset GPU resources");
            return;
        };
        let asset = mounted.asset();

        self.meshes = asset
            .meshes
            .iter()
            .map(|mesh| {
                mesh.primitives
                    .iter()
                    .enumerate()
                    .map(|(i, primitive)| {
                        MeshBuffers::from_geometry(
                            device,
                            &primitive.geometry,
                            &format!("{} #{i}", mesh.name),
                        )
                    })
                    .collect()
            })
            .collect();

        let world = mounted.world_transforms();
        for slot in draw_slots(asset) {
            let base_color = asset.meshes[slot.mesh].primitives[slot.primitive].base_color;
            let model = world.get(slot.node).copied().unwrap_or_else(Matrix4::identity);
            let uniform = UniformBuffer::new_with_data(device, &AssetUniform::new(model, base_color));
            let bind_group = BindGroupBuilder::new(&self.bind_group_layout)
                .resource(uniform.binding_resource())
                .create(device, "Asset Draw Bind Group");
            self.draws.push(AssetDraw {
                slot,
                base_color,
                uniform,
                bind_group,
            });
        }

        log::info!(
            "Uploaded asset '{}': {} draws",
            asset.name,
            self.draws.len()
        );
    }

    /// Writes this frame's world matrices
    pub fn update(&mut self, queue: &wgpu::Queue, mounted: &MountedAsset) {
        let world = mounted.world_transforms();
        for draw in &mut self.draws {
            if let Some(model) = world.get(draw.slot.node) {
                draw.uniform
                    .update_content(queue, AssetUniform::new(*model, draw.base_color));
            }
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        for draw in &self.draws {
            let buffers = self
                .meshes
                .get(draw.slot.mesh)
                .and_then(|primitives| primitives.get(draw.slot.primitive))
                .and_then(Option::as_ref);
            if let Some(buffers) = buffers {
                render_pass.set_bind_group(1, &draw.bind_group, &[]);
                render_pass.draw_mesh(buffers);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::asset::tests::animated_triangle;
    use crate::gfx::scene::asset::AssetNode;
    use crate::gfx::scene::NodeTransform;

    #[test]
    fn uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<AssetUniform>(), 80);
    }

    #[test]
    fn one_slot_per_mesh_node() {
        let asset = animated_triangle();
        assert_eq!(
            draw_slots(&asset),
            vec![DrawSlot {
                node: 1,
                mesh: 0,
                primitive: 0
            }]
        );
    }

    #[test]
    fn dangling_mesh_references_are_skipped() {
        let mut asset = animated_triangle();
        asset.nodes.push(AssetNode {
            name: "ghost".into(),
            transform: NodeTransform::default(),
            mesh: Some(7),
            children: Vec::new(),
        });
        asset.nodes[1].children.push(2);
        assert_eq!(draw_slots(&asset).len(), 1);
    }

    #[test]
    fn mesh_nodes_outside_the_scene_tree_are_not_drawn() {
        let mut asset = animated_triangle();
        asset.nodes.push(AssetNode {
            name: "detached".into(),
            transform: NodeTransform::default(),
            mesh: Some(0),
            children: Vec::new(),
        });

        assert_eq!(asset.reachable_nodes(), vec![true, true, false]);
        let slots = draw_slots(&asset);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].node, 1);
    }
}
