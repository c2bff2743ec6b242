//! Terrain Viewer
//!
//! Heightmap-displaced terrain rendered with wgpu and winit, with an optional
//! glTF or OBJ asset placed on the surface and its first animation clip
//! played on a loop.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod prelude;
pub mod terrain;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::TerrainViewerApp;
pub use config::ViewerConfig;
pub use error::ViewerError;
