//! WGPU-based rendering engine for the terrain viewer
//!
//! Owns the surface, device and pipelines, and draws a [`Scene`] in one
//! pass: the displaced terrain first, then the mounted asset, over a solid
//! black clear.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::{
    config::{LightingConfig, ViewerConfig},
    error::{RenderError, ViewerError},
    gfx::{
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
            texture_resource::TextureResource,
        },
        scene::scene::Scene,
    },
};

use super::{
    asset_renderer::AssetRenderer,
    pipeline_manager::{PipelineConfig, PipelineManager},
    terrain_renderer::TerrainRenderer,
};

pub const TERRAIN_PIPELINE: &str = "Terrain";
pub const ASSET_PIPELINE: &str = "Asset";

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Prefers an sRGB format so linear shader output is encoded on write
pub fn select_surface_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first().copied())
}

pub fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Opaque, depth-tested terrain draw with both faces rasterized
pub fn terrain_pipeline_config(
    color_format: TextureFormat,
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
) -> PipelineConfig {
    PipelineConfig::default_with_shader("terrain")
        .with_label("TERRAIN")
        .with_cull_mode(None)
        .with_depth_format(TextureResource::DEPTH_FORMAT)
        .with_color_format(color_format)
        .with_bind_group_layouts(bind_group_layouts)
}

/// Asset meshes may be open shells, so they are double-sided too
pub fn asset_pipeline_config(
    color_format: TextureFormat,
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
) -> PipelineConfig {
    PipelineConfig::default_with_shader("asset")
        .with_label("ASSET")
        .with_cull_mode(None)
        .with_depth_format(TextureResource::DEPTH_FORMAT)
        .with_color_format(color_format)
        .with_bind_group_layouts(bind_group_layouts)
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    terrain: TerrainRenderer,
    asset: AssetRenderer,
    asset_generation: Option<u64>,
    lighting: LightingConfig,
}

impl RenderEngine {
    /// Creates a render engine for the given window and uploads the scene
    ///
    /// # Errors
    /// Surface, adapter or device creation failures, shader compilation
    /// failures and texture uploads larger than the device allows.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        scene: &Scene,
        viewer_config: &ViewerConfig,
    ) -> Result<RenderEngine, ViewerError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(RenderError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(RenderError::from)?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(RenderError::from)?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = select_surface_format(&surface_capabilities.formats)
            .ok_or_else(|| RenderError::Pipeline {
                name: "surface".to_string(),
                message: "surface reports no supported formats".to_string(),
            })?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(viewer_config.window.vsync),
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let terrain = TerrainRenderer::new(&device, &queue, &scene.terrain)?;
        let asset = AssetRenderer::new(&device);

        let device_handle: Arc<wgpu::Device> = Arc::new(device);
        let queue_handle: Arc<wgpu::Queue> = Arc::new(queue);
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("terrain", include_str!("terrain.wgsl"))?;
        pipeline_manager.load_shader("asset", include_str!("asset.wgsl"))?;

        pipeline_manager.register_pipeline(
            TERRAIN_PIPELINE,
            terrain_pipeline_config(
                format,
                vec![
                    global_bindings.bind_group_layout().clone(),
                    terrain.bind_group_layout().clone(),
                ],
            ),
        );
        pipeline_manager.register_pipeline(
            ASSET_PIPELINE,
            asset_pipeline_config(
                format,
                vec![
                    global_bindings.bind_group_layout().clone(),
                    asset.bind_group_layout().clone(),
                ],
            ),
        );

        pipeline_manager.create_all_pipelines()?;

        let mut engine = RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            pipeline_manager,
            global_ubo,
            global_bindings,
            terrain,
            asset,
            asset_generation: None,
            lighting: viewer_config.lighting.clone(),
        };
        engine.update(scene);
        Ok(engine)
    }

    /// Re-uploads the asset when the scene mounted or unmounted one
    fn sync_asset(&mut self, scene: &Scene) {
        let generation = scene.asset_generation();
        if self.asset_generation != Some(generation) {
            self.asset.upload(&self.device, scene.mounted_asset());
            self.asset_generation = Some(generation);
        }
    }

    /// Writes this frame's uniforms: camera, lighting, terrain and asset pose
    pub fn update(&mut self, scene: &Scene) {
        self.sync_asset(scene);
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            scene.camera_manager.camera.uniform,
            &self.lighting,
        );
        self.terrain.update(&self.queue, &scene.terrain);
        if let Some(mounted) = scene.mounted_asset() {
            self.asset.update(&self.queue, mounted);
        }
    }

    /// Draws one frame
    ///
    /// # Errors
    /// [`RenderError::Surface`] when the swapchain texture cannot be
    /// acquired; the caller decides whether to reconfigure or exit.
    pub fn render_frame(&mut self, scene: &Scene) -> Result<(), RenderError> {
        self.sync_asset(scene);

        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(TERRAIN_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                self.terrain.draw(&mut render_pass);
            }

            if !self.asset.is_empty() {
                if let Some(pipeline) = self.pipeline_manager.get_pipeline(ASSET_PIPELINE) {
                    render_pass.set_pipeline(pipeline);
                    self.asset.draw(&mut render_pass);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;

        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Reconfigures the surface at its current size
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_srgb_surface_format() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb];
        assert_eq!(
            select_surface_format(&formats),
            Some(TextureFormat::Bgra8UnormSrgb)
        );
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [TextureFormat::Rgba16Float, TextureFormat::Bgra8Unorm];
        assert_eq!(
            select_surface_format(&formats),
            Some(TextureFormat::Rgba16Float)
        );
        assert_eq!(select_surface_format(&[]), None);
    }

    #[test]
    fn terrain_pipeline_is_double_sided_and_depth_tested() {
        let config = terrain_pipeline_config(TextureFormat::Bgra8UnormSrgb, Vec::new());
        assert_eq!(config.shader, "terrain");
        assert_eq!(config.cull_mode, None);
        assert_eq!(config.depth_format, Some(TextureResource::DEPTH_FORMAT));

        let target = config.color_targets[0].as_ref().unwrap();
        assert_eq!(target.format, TextureFormat::Bgra8UnormSrgb);
        assert_eq!(target.blend, Some(wgpu::BlendState::REPLACE));
    }

    #[test]
    fn asset_pipeline_shares_the_terrain_target_state() {
        let terrain = terrain_pipeline_config(TextureFormat::Rgba8UnormSrgb, Vec::new());
        let asset = asset_pipeline_config(TextureFormat::Rgba8UnormSrgb, Vec::new());
        assert_eq!(asset.shader, "asset");
        assert_eq!(asset.cull_mode, terrain.cull_mode);
        assert_eq!(asset.depth_format, terrain.depth_format);
        assert_eq!(asset.color_targets, terrain.color_targets);
    }

    #[test]
    fn clear_color_is_opaque_black() {
        assert_eq!(CLEAR_COLOR, wgpu::Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 });
    }

    #[test]
    fn vsync_maps_to_present_mode() {
        assert_eq!(present_mode(true), wgpu::PresentMode::AutoVsync);
        assert_eq!(present_mode(false), wgpu::PresentMode::AutoNoVsync);
    }
}
