//! # Scene Module
//!
//! CPU-side scene state: the terrain, the orbit camera and an optional
//! mounted asset with its clip playback. Nothing here touches the GPU, so
//! the whole per-frame update can be driven from tests.
//!
//! ## Key Components
//!
//! - [`Scene`] - terrain, camera and the mounted asset, advanced once per frame
//! - [`LoadedAsset`] - node hierarchy, meshes and clips parsed from glTF or OBJ
//! - [`AnimationMixer`] - per-scene clip playback with explicit `advance(dt)`
//! - [`Vertex3D`] - vertex layout shared by terrain and asset meshes
//!
//! ## Usage
//!
//! ```no_run
//! use terrain_viewer::config::ViewerConfig;
//! use terrain_viewer::gfx::scene::{load_asset, AssetPlacement, Scene};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ViewerConfig::default();
//! let mut scene = Scene::new(&config, 1.5)?;
//! let asset = load_asset("assets/rover.glb".as_ref())?;
//! scene.mount_asset(asset, AssetPlacement::default());
//! scene.advance(1.0 / 60.0);
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod asset;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use animation::{AnimationClip, AnimationMixer, ClipAction};
pub use asset::{load_asset, AssetLoader, GltfLoader, LoadedAsset, NodeTransform, ObjLoader};
pub use scene::{AssetPlacement, MountedAsset, Scene};
pub use vertex::Vertex3D;
