use std::{sync::Arc, time::Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::{
    config::ViewerConfig,
    error::{RenderError, ViewerError},
    gfx::{
        RenderEngine,
        scene::{load_asset, AssetPlacement, LoadedAsset, Scene},
    },
};

/// Longest frame step fed to the scene; stalls (window drags, breakpoints)
/// do not fast-forward playback.
const MAX_FRAME_DELTA: f32 = 0.25;

/// Windowed terrain viewer
///
/// Everything the viewer shows is loaded in [`TerrainViewerApp::new`]: the
/// terrain textures and the optional asset. Any load failure aborts before a
/// window is opened.
pub struct TerrainViewerApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Scene,
    /// Asset held while unmounted, so it can be mounted again
    parked_asset: Option<(LoadedAsset, AssetPlacement)>,
    last_frame: Option<Instant>,
    error: Option<ViewerError>,
}

impl TerrainViewerApp {
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        config.validate()?;
        let event_loop = EventLoop::new()?;

        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let mut scene = Scene::new(&config, aspect)?;

        if let Some(asset_config) = &config.asset {
            let asset = load_asset(&asset_config.path)?;
            scene.mount_asset(asset, AssetPlacement::from(asset_config));
        }

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                scene,
                parked_asset: None,
                last_frame: None,
                error: None,
            },
        })
    }

    /// Runs the event loop until the window closes
    pub fn run(mut self) -> Result<(), ViewerError> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewerError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window = event_loop.create_window(
            WindowAttributes::default()
                .with_title(self.config.window.title.clone())
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.config.window.width,
                    self.config.window.height,
                )),
        )?;
        let window_handle = Arc::new(window);
        self.window = Some(window_handle.clone());

        let (width, height) = window_handle.inner_size().into();
        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);
        self.scene.camera_manager.camera.update_view_proj();

        let renderer = pollster::block_on(RenderEngine::new(
            window_handle,
            width,
            height,
            &self.scene,
            &self.config,
        ))?;
        self.render_engine = Some(renderer);
        Ok(())
    }

    /// U unmounts the asset, or mounts it again when unmounted
    fn toggle_asset(&mut self) {
        match self.parked_asset.take() {
            Some((asset, placement)) => {
                self.scene.mount_asset(asset, placement);
            }
            None => {
                let placement = self
                    .scene
                    .mounted_asset()
                    .map(|mounted| *mounted.placement());
                if let (Some(placement), Some(asset)) = (placement, self.scene.unmount_asset()) {
                    self.parked_asset = Some((asset, placement));
                }
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state == ElementState::Pressed && !event.repeat {
            match event.physical_key {
                PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                PhysicalKey::Code(KeyCode::KeyU) => self.toggle_asset(),
                _ => (),
            }
        }
        self.scene.camera_manager.process_keyboard_event(event);
    }

    fn frame_delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_frame = Some(now);
        dt.min(MAX_FRAME_DELTA)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.frame_delta();
        self.scene.advance(dt);

        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };
        render_engine.update(&self.scene);

        match render_engine.render_frame(&self.scene) {
            Ok(()) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface lost or outdated; reconfiguring");
                render_engine.reconfigure();
            }
            Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface timed out; skipping frame");
            }
            Err(error) => self.fail(event_loop, error.into()),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(error) = self.create_renderer(event_loop) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event_loop, &event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        self.scene.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
