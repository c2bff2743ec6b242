//! # Graphics Module
//!
//! Camera, scene and rendering for the terrain viewer.
//!
//! - **Camera System** ([`camera`]) - Z-up orbit camera with bounds, auto-rotate and ground-plane panning
//! - **Geometry** ([`geometry`]) - CPU mesh data and the subdivided terrain plane
//! - **Scene Management** ([`scene`]) - terrain, mounted asset and clip playback
//! - **Resource Management** ([`resources`]) - textures, mesh buffers and global uniforms
//! - **Rendering Pipeline** ([`rendering`]) - terrain and asset pipelines, frame rendering
//!
//! The [`RenderEngine`] draws a [`Scene`] each frame; the scene itself never
//! touches the GPU.
//!
//! [`Scene`]: scene::Scene

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
