//! Core rendering functionality
//!
//! Handles render pipelines, GPU resource management, and frame rendering.

pub mod asset_renderer;
pub mod pipeline_manager;
pub mod render_engine;
pub mod render_pass_ext;
pub mod terrain_renderer;

// Re-export main types
pub use asset_renderer::AssetRenderer;
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
pub use terrain_renderer::{TerrainRenderer, TerrainUniform};
