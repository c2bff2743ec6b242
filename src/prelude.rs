//! # Terrain Viewer Prelude
//!
//! Commonly used types in one import:
//!
//! ```no_run
//! use terrain_viewer::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     TerrainViewerApp::new(ViewerConfig::default())?.run()
//! }
//! ```

// Application and configuration
pub use crate::app::TerrainViewerApp;
pub use crate::config::{AssetConfig, TerrainConfig, ViewerConfig};
pub use crate::error::ViewerError;

// Terrain
pub use crate::terrain::{ColorMap, DisplacementStage, Heightmap, Terrain};

// Scene, camera and assets
pub use crate::gfx::camera::{CameraManager, OrbitCamera};
pub use crate::gfx::scene::{load_asset, AnimationMixer, AssetPlacement, LoadedAsset, Scene};
