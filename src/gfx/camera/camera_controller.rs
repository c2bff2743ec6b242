use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::orbit_camera::OrbitCamera;
use crate::config::ControlsConfig;

/// Mouse and keyboard orbit controls
///
/// Drag rotates around the target, shift-drag pans across the ground plane
/// (when enabled), the wheel dollies in and out.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub enable_pan: bool,
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            enable_pan: true,
            is_shift_held: false,
            is_mouse_pressed: false,
        }
    }

    pub fn from_config(controls: &ControlsConfig) -> Self {
        Self {
            pan_speed: controls.pan_speed,
            enable_pan: controls.enable_pan,
            ..Self::new(controls.rotate_speed, controls.zoom_speed)
        }
    }

    pub fn process_events(
        &mut self,
        event: &DeviceEvent,
        window: &Window,
        camera: &mut OrbitCamera,
    ) {
        if self.apply_device_event(event, camera) {
            window.request_redraw();
        }
    }

    /// Applies one device event; returns true when the camera moved
    fn apply_device_event(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) -> bool {
        match event {
            DeviceEvent::Button {
                button: 0, // Left Mouse Button
                state,
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
                false
            }
            DeviceEvent::MouseWheel { delta, .. } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32 / 50.0
                    }
                };
                self.zoom(scroll_amount, camera);
                true
            }
            DeviceEvent::MouseMotion { delta } => {
                if !self.is_mouse_pressed {
                    return false;
                }
                self.drag((delta.0 as f32, delta.1 as f32), camera);
                true
            }
            _ => false,
        }
    }

    /// Positive amounts move away from the target
    pub fn zoom(&self, amount: f32, camera: &mut OrbitCamera) {
        camera.dolly((1.0 + self.zoom_speed).powf(amount));
    }

    pub fn drag(&self, delta: (f32, f32), camera: &mut OrbitCamera) {
        if self.is_panning() {
            camera.pan((-delta.0 * self.pan_speed, delta.1 * self.pan_speed));
        } else {
            camera.add_yaw(-delta.0 * self.rotate_speed);
            camera.add_pitch(delta.1 * self.rotate_speed);
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        match event {
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
                state,
                ..
            } => {
                self.set_shift_held(*state == ElementState::Pressed);
            }
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyC),
                state: ElementState::Pressed,
                ..
            } => {
                // Shift+C
                if self.is_shift_held {
                    log::info!("Resetting camera to default position");
                    camera.reset_to_default();
                }
            }
            _ => (),
        }
    }

    fn set_shift_held(&mut self, held: bool) {
        if self.is_shift_held != held {
            log::debug!("Shift state changed: {held}");
        }
        self.is_shift_held = held;
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.enable_pan && self.is_mouse_pressed && self.is_shift_held
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_mouse_pressed && !self.is_panning()
    }
}
