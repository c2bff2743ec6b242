//! Scene state: the terrain, the orbit camera, and at most one mounted asset
//! whose clip playback is owned by its [`MountedAsset`].

use cgmath::{Deg, Matrix4, Rad, Vector3};

use crate::{
    config::{AssetConfig, ViewerConfig},
    error::TextureError,
    gfx::camera::camera_utils::CameraManager,
    terrain::Terrain,
};

use super::{
    animation::AnimationMixer,
    asset::{LoadedAsset, NodeTransform},
};

/// Where a mounted asset sits relative to the terrain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetPlacement {
    /// World-space XY on the terrain footprint
    pub position: [f32; 2],
    pub scale: f32,
    pub yaw: Rad<f32>,
    pub snap_to_terrain: bool,
    pub height_offset: f32,
    pub autoplay: bool,
}

impl Default for AssetPlacement {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            scale: 1.0,
            yaw: Rad(0.0),
            snap_to_terrain: false,
            height_offset: 0.0,
            autoplay: true,
        }
    }
}

impl From<&AssetConfig> for AssetPlacement {
    fn from(config: &AssetConfig) -> Self {
        Self {
            position: config.position,
            scale: config.scale,
            yaw: Deg(config.yaw_degrees).into(),
            snap_to_terrain: config.snap_to_terrain,
            height_offset: config.height_offset,
            autoplay: config.autoplay,
        }
    }
}

impl AssetPlacement {
    /// Root matrix for the asset. Assets are authored Y-up and get rotated
    /// into the Z-up world before scaling and yaw.
    pub fn root_matrix(&self, terrain: &Terrain) -> Matrix4<f32> {
        let [x, y] = self.position;
        let ground = if self.snap_to_terrain {
            terrain.surface_height(x, y)
        } else {
            0.0
        };
        Matrix4::from_translation(Vector3::new(x, y, ground + self.height_offset))
            * Matrix4::from_angle_z(self.yaw)
            * Matrix4::from_scale(self.scale)
            * Matrix4::from_angle_x(Deg(90.0))
    }
}

/// An asset attached to the scene together with its playback state
///
/// Dropping a `MountedAsset` stops its clips and releases the cached
/// actions, so every removal path cleans up the same way.
#[derive(Debug)]
pub struct MountedAsset {
    asset: LoadedAsset,
    placement: AssetPlacement,
    root: Matrix4<f32>,
    mixer: AnimationMixer,
    world_transforms: Vec<Matrix4<f32>>,
    released: bool,
}

impl MountedAsset {
    fn new(asset: LoadedAsset, placement: AssetPlacement, terrain: &Terrain) -> Self {
        let root = placement.root_matrix(terrain);
        let mut mixer = AnimationMixer::new();
        if placement.autoplay && !asset.clips.is_empty() {
            mixer.play(0, &asset.clips);
        }
        let world_transforms = asset.world_transforms(&asset.rest_pose(), root);
        Self {
            asset,
            placement,
            root,
            mixer,
            world_transforms,
            released: false,
        }
    }

    pub fn asset(&self) -> &LoadedAsset {
        &self.asset
    }

    pub fn placement(&self) -> &AssetPlacement {
        &self.placement
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// World matrix per node for the current frame
    pub fn world_transforms(&self) -> &[Matrix4<f32>] {
        &self.world_transforms
    }

    /// (mesh index, world matrix) for every node in the scene tree that draws a mesh
    pub fn mesh_instances(&self) -> impl Iterator<Item = (usize, Matrix4<f32>)> + '_ {
        let reachable = self.asset.reachable_nodes();
        self.asset
            .nodes
            .iter()
            .zip(&self.world_transforms)
            .zip(reachable)
            .filter(|(_, reachable)| *reachable)
            .filter_map(|((node, world), _)| node.mesh.map(|mesh| (mesh, *world)))
    }

    fn advance(&mut self, dt: f32) {
        if self.asset.clips.is_empty() {
            return;
        }
        self.mixer.advance(dt);
        let pose: Vec<NodeTransform> = self.mixer.sample_pose(&self.asset);
        self.world_transforms = self.asset.world_transforms(&pose, self.root);
    }

    fn reposition(&mut self, terrain: &Terrain) {
        self.root = self.placement.root_matrix(terrain);
        let pose = self.mixer.sample_pose(&self.asset);
        self.world_transforms = self.asset.world_transforms(&pose, self.root);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.mixer.stop_all();
        self.mixer.uncache_all();
        log::info!("Released asset '{}'", self.asset.name);
    }
}

impl Drop for MountedAsset {
    fn drop(&mut self) {
        self.release();
    }
}

/// Terrain, camera and the optional animated asset
pub struct Scene {
    pub camera_manager: CameraManager,
    pub terrain: Terrain,
    asset: Option<MountedAsset>,
    asset_generation: u64,
}

impl Scene {
    /// Loads the terrain textures and builds the camera from the config
    pub fn new(config: &ViewerConfig, aspect: f32) -> Result<Self, TextureError> {
        let terrain = Terrain::load(&config.terrain)?;
        let camera_manager = CameraManager::from_config(&config.camera, &config.controls, aspect);
        Ok(Self::from_parts(terrain, camera_manager))
    }

    pub fn from_parts(terrain: Terrain, camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            terrain,
            asset: None,
            asset_generation: 0,
        }
    }

    /// Attaches an asset and plays its first clip looped when `placement.autoplay`
    /// is set. A previously mounted asset is released and handed back.
    pub fn mount_asset(
        &mut self,
        asset: LoadedAsset,
        placement: AssetPlacement,
    ) -> Option<LoadedAsset> {
        let previous = self.unmount_asset();
        log::info!(
            "Mounting asset '{}' ({} nodes, {} primitives, {} clips)",
            asset.name,
            asset.nodes.len(),
            asset.primitive_count(),
            asset.clips.len()
        );
        self.asset = Some(MountedAsset::new(asset, placement, &self.terrain));
        self.asset_generation += 1;
        previous
    }

    /// Stops playback, releases cached clip state and returns the asset
    pub fn unmount_asset(&mut self) -> Option<LoadedAsset> {
        let mut mounted = self.asset.take()?;
        mounted.release();
        self.asset_generation += 1;
        Some(std::mem::take(&mut mounted.asset))
    }

    pub fn mounted_asset(&self) -> Option<&MountedAsset> {
        self.asset.as_ref()
    }

    /// Changes whenever an asset is mounted or unmounted
    pub fn asset_generation(&self) -> u64 {
        self.asset_generation
    }

    /// Playback time of the active clip, if an animated asset is mounted
    pub fn playback_time(&self) -> Option<f32> {
        self.asset.as_ref().and_then(|mounted| mounted.mixer.time())
    }

    /// Sets the displacement scale and re-seats a terrain-snapped asset
    pub fn set_displacement_scale(&mut self, scale: f32) {
        self.terrain.set_displacement_scale(scale);
        if let Some(mounted) = self.asset.as_mut() {
            mounted.reposition(&self.terrain);
        }
    }

    /// Per-frame tick: camera auto-rotation, clip time, then asset transforms
    pub fn advance(&mut self, dt: f32) {
        self.camera_manager.update(dt);
        if let Some(mounted) = self.asset.as_mut() {
            mounted.advance(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, ControlsConfig, TerrainConfig};
    use crate::gfx::scene::asset::{tests::animated_triangle, AssetNode};
    use crate::terrain::{ColorMap, Heightmap};
    use cgmath::{InnerSpace, Vector4};

    fn scene(heightmap: Option<Heightmap>) -> Scene {
        let config = TerrainConfig {
            heightmap: None,
            color_map: "unused.png".into(),
            displacement_scale: 60.0,
            size: 1024.0,
            segments: 4,
        };
        let terrain = Terrain::new(heightmap, ColorMap::solid([40, 90, 30]), &config);
        let camera = CameraManager::from_config(
            &CameraConfig::default(),
            &ControlsConfig::default(),
            1.0,
        );
        Scene::from_parts(terrain, camera)
    }

    #[test]
    fn mounted_clip_time_tracks_frame_delta() {
        let mut scene = scene(None);
        scene.mount_asset(animated_triangle(), AssetPlacement::default());
        assert_eq!(scene.playback_time(), Some(0.0));

        let dt = 1.0 / 60.0;
        scene.advance(dt);
        assert_eq!(scene.playback_time(), Some(dt));
    }

    #[test]
    fn unmount_releases_playback_state() {
        let mut scene = scene(None);
        scene.mount_asset(animated_triangle(), AssetPlacement::default());
        scene.advance(0.25);
        let generation = scene.asset_generation();

        let asset = scene.unmount_asset().expect("asset was mounted");
        assert_eq!(asset.clips.len(), 1);
        assert!(scene.mounted_asset().is_none());
        assert_eq!(scene.playback_time(), None);
        assert!(scene.asset_generation() > generation);

        scene.advance(0.25);
        assert_eq!(scene.playback_time(), None);

        scene.mount_asset(asset, AssetPlacement::default());
        assert_eq!(scene.playback_time(), Some(0.0));
    }

    #[test]
    fn remount_hands_back_previous_asset() {
        let mut scene = scene(None);
        assert!(scene
            .mount_asset(animated_triangle(), AssetPlacement::default())
            .is_none());
        let previous = scene.mount_asset(animated_triangle(), AssetPlacement::default());
        assert_eq!(previous.map(|a| a.nodes.len()), Some(2));
        assert_eq!(scene.mounted_asset().map(|m| m.mixer().cached_action_count()), Some(1));
    }

    #[test]
    fn autoplay_off_leaves_clip_idle() {
        let mut scene = scene(None);
        let placement = AssetPlacement {
            autoplay: false,
            ..AssetPlacement::default()
        };
        scene.mount_asset(animated_triangle(), placement);
        scene.advance(0.5);
        assert_eq!(scene.playback_time(), None);
    }

    #[test]
    fn advance_moves_animated_node() {
        let mut scene = scene(None);
        scene.mount_asset(animated_triangle(), AssetPlacement::default());
        let before = scene.mounted_asset().unwrap().world_transforms()[0];
        scene.advance(0.5);
        let after = scene.mounted_asset().unwrap().world_transforms()[0];
        assert!((after.w - before.w).magnitude() > 0.5);
    }

    #[test]
    fn snapped_placement_rests_on_surface() {
        let mut scene = scene(Some(Heightmap::uniform(0.5)));
        let placement = AssetPlacement {
            position: [0.1, 0.2],
            snap_to_terrain: true,
            ..AssetPlacement::default()
        };
        scene.mount_asset(animated_triangle(), placement);
        let root = placement.root_matrix(&scene.terrain);
        let origin = root * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.z - 30.0 / 1024.0).abs() < 1e-6);

        scene.set_displacement_scale(0.0);
        let mounted = scene.mounted_asset().unwrap();
        let instances: Vec<_> = mounted.mesh_instances().collect();
        assert_eq!(instances.len(), 1);
        let rig_origin = mounted.world_transforms()[0] * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(rig_origin.z.abs() < 1e-6);
    }

    #[test]
    fn detached_mesh_nodes_are_left_out_of_placement() {
        let mut asset = animated_triangle();
        asset.nodes.push(AssetNode {
            name: "detached".into(),
            transform: NodeTransform::default(),
            mesh: Some(0),
            children: Vec::new(),
        });

        let mut scene = scene(None);
        let placement = AssetPlacement {
            scale: 0.05,
            ..AssetPlacement::default()
        };
        scene.mount_asset(asset, placement);

        let mounted = scene.mounted_asset().unwrap();
        let instances: Vec<_> = mounted.mesh_instances().collect();
        assert_eq!(instances.len(), 1);
        for (_, world) in instances {
            let x_axis = world * Vector4::new(1.0, 0.0, 0.0, 0.0);
            assert!((x_axis.magnitude() - 0.05).abs() < 1e-6);
        }
    }

    #[test]
    fn y_up_assets_stand_upright() {
        let terrain_scene = scene(None);
        let root = AssetPlacement::default().root_matrix(&terrain_scene.terrain);
        let up = root * Vector4::new(0.0, 1.0, 0.0, 0.0);
        assert!((up.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn advance_rotates_camera() {
        let mut scene = scene(None);
        let yaw = scene.camera_manager.camera.yaw;
        scene.advance(1.0);
        assert!(scene.camera_manager.camera.yaw > yaw);
    }
}
