//! Scene asset loading
//!
//! Parses a scene interchange file into a [`LoadedAsset`]: a node hierarchy,
//! the meshes it references, and any animation clips bound to it. glTF and
//! GLB go through the `gltf` crate; OBJ goes through `tobj` and never carries
//! clips.

use std::path::{Path, PathBuf};

use cgmath::{Matrix4, Quaternion, SquareMatrix, Vector3};

use super::animation::{AnimationClip, Channel, ChannelValues, Interpolation};
use crate::error::AssetError;
use crate::gfx::geometry::GeometryData;

/// Local translation / rotation / scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl NodeTransform {
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

#[derive(Debug, Clone)]
pub struct AssetNode {
    pub name: String,
    pub transform: NodeTransform,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct AssetPrimitive {
    pub geometry: GeometryData,
    pub base_color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct AssetMesh {
    pub name: String,
    pub primitives: Vec<AssetPrimitive>,
}

/// A parsed scene asset
#[derive(Debug, Clone, Default)]
pub struct LoadedAsset {
    pub name: String,
    pub nodes: Vec<AssetNode>,
    /// Nodes without a parent, in scene order
    pub roots: Vec<usize>,
    pub meshes: Vec<AssetMesh>,
    pub clips: Vec<AnimationClip>,
}

impl LoadedAsset {
    /// Rest pose: every node's own transform
    pub fn rest_pose(&self) -> Vec<NodeTransform> {
        self.nodes.iter().map(|node| node.transform).collect()
    }

    /// World matrices for a pose, with `root` applied above every root node.
    ///
    /// Nodes not reachable from a root keep the identity matrix.
    pub fn world_transforms(&self, pose: &[NodeTransform], root: Matrix4<f32>) -> Vec<Matrix4<f32>> {
        let mut world = vec![Matrix4::identity(); self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, Matrix4<f32>)> =
            self.roots.iter().rev().map(|&index| (index, root)).collect();

        while let Some((index, parent)) = stack.pop() {
            if index >= self.nodes.len() || visited[index] {
                continue;
            }
            visited[index] = true;

            let local = pose
                .get(index)
                .copied()
                .unwrap_or(self.nodes[index].transform)
                .matrix();
            world[index] = parent * local;

            for &child in self.nodes[index].children.iter().rev() {
                stack.push((child, world[index]));
            }
        }
        world
    }

    /// Flags the nodes that hang under a scene root; only those are drawn
    pub fn reachable_nodes(&self) -> Vec<bool> {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.roots.clone();
        while let Some(index) = stack.pop() {
            if index >= self.nodes.len() || reachable[index] {
                continue;
            }
            reachable[index] = true;
            stack.extend(self.nodes[index].children.iter().copied());
        }
        reachable
    }

    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.primitives.len()).sum()
    }
}

/// Loads a scene asset from a file
pub trait AssetLoader {
    fn load(&self, path: &Path) -> Result<LoadedAsset, AssetError>;
}

/// glTF 2.0 (`.gltf` with external or embedded buffers, or binary `.glb`)
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfLoader;

/// Wavefront OBJ with optional MTL, static only
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjLoader;

/// Picks a loader from the file extension and loads the asset
pub fn load_asset(path: &Path) -> Result<LoadedAsset, AssetError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let asset = match extension.as_deref() {
        Some("gltf") | Some("glb") => GltfLoader.load(path)?,
        Some("obj") => ObjLoader.load(path)?,
        _ => return Err(AssetError::UnsupportedFormat(path.to_path_buf())),
    };

    log::info!(
        "Loaded asset '{}': {} nodes, {} primitives, {} clips",
        asset.name,
        asset.nodes.len(),
        asset.primitive_count(),
        asset.clips.len()
    );
    Ok(asset)
}

fn asset_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("asset")
        .to_string()
}

impl AssetLoader for GltfLoader {
    fn load(&self, path: &Path) -> Result<LoadedAsset, AssetError> {
        let (document, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Gltf {
            path: path.to_path_buf(),
            source,
        })?;
        asset_from_document(asset_name(path), &document, &buffers)
    }
}

impl GltfLoader {
    /// Loads a self-contained glTF or GLB held in memory
    pub fn load_slice(&self, name: &str, bytes: &[u8]) -> Result<LoadedAsset, AssetError> {
        let (document, buffers, _images) =
            gltf::import_slice(bytes).map_err(|source| AssetError::Gltf {
                path: PathBuf::from(name),
                source,
            })?;
        asset_from_document(name.to_string(), &document, &buffers)
    }
}

fn asset_from_document(
    name: String,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<LoadedAsset, AssetError> {
    let buffer_data = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|d| d.0.as_slice());

    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        let mesh_name = mesh.name().map(str::to_string).unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping non-triangle primitive in mesh '{mesh_name}'");
                continue;
            }
            let reader = primitive.reader(buffer_data);

            let mut geometry = GeometryData::new();
            geometry.vertices = reader
                .read_positions()
                .ok_or_else(|| AssetError::MissingAttribute {
                    mesh: mesh_name.clone(),
                    attribute: "POSITION",
                })?
                .collect();
            geometry.indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..geometry.vertices.len() as u32).collect(),
            };
            geometry.tex_coords = match reader.read_tex_coords(0) {
                Some(uvs) => uvs.into_f32().collect(),
                None => vec![[0.0, 0.0]; geometry.vertices.len()],
            };
            match reader.read_normals() {
                Some(normals) => geometry.normals = normals.collect(),
                None => geometry.compute_vertex_normals(),
            }

            let base_color = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();
            primitives.push(AssetPrimitive {
                geometry,
                base_color,
            });
        }

        meshes.push(AssetMesh {
            name: mesh_name,
            primitives,
        });
    }

    if meshes.iter().all(|mesh| mesh.primitives.is_empty()) {
        return Err(AssetError::NoMeshes(name));
    }

    let nodes: Vec<AssetNode> = document
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            AssetNode {
                name: node.name().map(str::to_string).unwrap_or_else(|| format!("node_{}", node.index())),
                transform: NodeTransform {
                    translation: translation.into(),
                    rotation: quaternion_from_xyzw(rotation),
                    scale: scale.into(),
                },
                mesh: node.mesh().map(|mesh| mesh.index()),
                children: node.children().map(|child| child.index()).collect(),
            }
        })
        .collect();

    let roots = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|node| node.index()).collect(),
        None => parentless_nodes(&nodes),
    };

    let mut clips = Vec::new();
    for animation in document.animations() {
        let clip_name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("clip_{}", animation.index()));
        let mut channels = Vec::new();

        for channel in animation.channels() {
            let reader = channel.reader(buffer_data);
            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
                log::warn!("Skipping channel without keyframes in clip '{clip_name}'");
                continue;
            };
            let values = match outputs {
                gltf::animation::util::ReadOutputs::Translations(it) => {
                    ChannelValues::Translation(it.map(Vector3::from).collect())
                }
                gltf::animation::util::ReadOutputs::Rotations(it) => {
                    ChannelValues::Rotation(it.into_f32().map(quaternion_from_xyzw).collect())
                }
                gltf::animation::util::ReadOutputs::Scales(it) => {
                    ChannelValues::Scale(it.map(Vector3::from).collect())
                }
                gltf::animation::util::ReadOutputs::MorphTargetWeights(_) => {
                    log::debug!("Morph target channel in clip '{clip_name}' ignored");
                    continue;
                }
            };
            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Step => Interpolation::Step,
                gltf::animation::Interpolation::Linear => Interpolation::Linear,
                gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
            };

            channels.push(Channel::new(
                channel.target().node().index(),
                inputs.collect(),
                values,
                interpolation,
            ));
        }

        clips.push(AnimationClip::new(clip_name, channels));
    }

    Ok(LoadedAsset {
        name,
        nodes,
        roots,
        meshes,
        clips,
    })
}

fn quaternion_from_xyzw(q: [f32; 4]) -> Quaternion<f32> {
    Quaternion::new(q[3], q[0], q[1], q[2])
}

fn parentless_nodes(nodes: &[AssetNode]) -> Vec<usize> {
    let mut has_parent = vec![false; nodes.len()];
    for node in nodes {
        for &child in &node.children {
            if let Some(flag) = has_parent.get_mut(child) {
                *flag = true;
            }
        }
    }
    (0..nodes.len()).filter(|&i| !has_parent[i]).collect()
}

impl AssetLoader for ObjLoader {
    fn load(&self, path: &Path) -> Result<LoadedAsset, AssetError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| AssetError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|err| {
            log::info!("No usable MTL for {} ({err}), using default color", path.display());
            Vec::new()
        });

        let mut meshes = Vec::new();
        let mut nodes = Vec::new();
        for model in &models {
            let mesh = &model.mesh;
            if mesh.indices.is_empty() {
                continue;
            }

            let mut geometry = GeometryData::new();
            geometry.vertices = mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect();
            geometry.indices = mesh.indices.clone();
            geometry.tex_coords = if mesh.texcoords.len() / 2 == geometry.vertices.len() {
                // OBJ puts v = 0 at the bottom of the image
                mesh.texcoords.chunks_exact(2).map(|t| [t[0], 1.0 - t[1]]).collect()
            } else {
                vec![[0.0, 0.0]; geometry.vertices.len()]
            };
            if mesh.normals.len() == mesh.positions.len() {
                geometry.normals = mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect();
            } else {
                geometry.compute_vertex_normals();
            }

            let base_color = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|mtl| {
                    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
                    [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)]
                })
                .unwrap_or([0.8, 0.8, 0.8, 1.0]);

            nodes.push(AssetNode {
                name: model.name.clone(),
                transform: NodeTransform::default(),
                mesh: Some(meshes.len()),
                children: Vec::new(),
            });
            meshes.push(AssetMesh {
                name: model.name.clone(),
                primitives: vec![AssetPrimitive {
                    geometry,
                    base_color,
                }],
            });
        }

        let name = asset_name(path);
        if meshes.is_empty() {
            return Err(AssetError::NoMeshes(name));
        }

        Ok(LoadedAsset {
            name,
            roots: (0..nodes.len()).collect(),
            nodes,
            meshes,
            clips: Vec::new(),
        })
    }
}
