//! Error types for the terrain viewer
//!
//! Every failure the viewer can report is an asset-resolution failure
//! (image decode, scene asset parse, configuration) or a GPU setup failure.
//! Loads are atomic: a load either produces a complete value or one of
//! these errors, never a partially initialized resource.

use std::path::PathBuf;

/// Image loading and texture construction failures
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image '{0}' has zero width or height")]
    Empty(String),

    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("texture '{label}' is {width}x{height}, device limit is {limit}")]
    TooLarge {
        label: String,
        width: u32,
        height: u32,
        limit: u32,
    },
}

/// Scene asset loading failures
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load glTF asset '{path}': {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to load OBJ asset '{path}': {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("unsupported asset format '{0}' (expected .gltf, .glb or .obj)")]
    UnsupportedFormat(PathBuf),

    #[error("asset '{0}' contains no renderable meshes")]
    NoMeshes(String),

    #[error("mesh '{mesh}' is missing required attribute {attribute}")]
    MissingAttribute { mesh: String, attribute: &'static str },
}

/// Configuration loading and validation failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("displacement scale must be finite, got {0}")]
    InvalidScale(f32),

    #[error("terrain needs at least one segment and a positive size")]
    InvalidTerrainGrid,

    #[error("min distance {min} exceeds max distance {max}")]
    InvalidDistanceBounds { min: f32, max: f32 },

    #[error("polar range [{min}, {max}] must lie within [0, pi] with min <= max")]
    InvalidPolarRange { min: f32, max: f32 },

    #[error("camera clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    InvalidClipPlanes { near: f32, far: f32 },
}

/// GPU initialization and frame submission failures
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("shader '{name}' failed to compile: {message}")]
    Shader { name: String, message: String },

    #[error("pipeline '{name}' could not be created: {message}")]
    Pipeline { name: String, message: String },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Top-level error for the viewer application
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
