use cgmath::{Matrix4, SquareMatrix};
use winit::{
    event::{DeviceEvent, KeyEvent},
    window::Window,
};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};
use crate::config::{CameraConfig, ControlsConfig};

#[derive(Debug, Clone)]
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn from_config(camera: &CameraConfig, controls: &ControlsConfig, aspect: f32) -> Self {
        Self::new(
            OrbitCamera::from_config(camera, controls, aspect),
            CameraController::from_config(controls),
        )
    }

    pub fn process_event(&mut self, event: &DeviceEvent, window: &Window) {
        self.controller
            .process_events(event, window, &mut self.camera);
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller
            .process_keyed_events(event, &mut self.camera);
    }

    /// Per-frame tick: auto-rotation, then the uniform refresh
    pub fn update(&mut self, dt: f32) {
        self.camera.auto_rotate(dt);
        self.camera.update_view_proj();
    }

    /// Get the view projection matrix from the camera
    pub fn get_view_proj_matrix(&self) -> cgmath::Matrix4<f32> {
        self.camera.build_view_projection_matrix()
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_applies_auto_rotation_and_refreshes_uniform() {
        let mut manager = CameraManager::from_config(
            &CameraConfig::default(),
            &ControlsConfig::default(),
            1.5,
        );
        let yaw = manager.camera.yaw;
        manager.update(1.0);
        assert!(manager.camera.yaw > yaw);
        assert_eq!(
            manager.camera.uniform.view_proj,
            convert_matrix4_to_array(manager.get_view_proj_matrix())
        );
        assert_eq!(manager.camera.uniform.view_position[3], 1.0);
    }

    #[test]
    fn matrix_conversion_is_column_major() {
        let m = Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(convert_matrix4_to_array(m)[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
