use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use cgmath::*;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::config::{CameraConfig, ControlsConfig};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the eye off the poles, where the Z-up look-at basis degenerates
const POLE_EPSILON: f32 = 1e-3;

/// Camera orbiting a target point in a Z-up world
///
/// `pitch` is the elevation above the ground plane and `yaw` the heading
/// around +Z, both in radians. Distance, pitch and (optionally) yaw are
/// clamped by [`OrbitCameraBounds`] on every change.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Auto-rotation speed; `None` disables it
    pub auto_rotate_speed: Option<f32>,
    pub uniform: CameraUniform,
    initial: (f32, f32, f32, Vector3<f32>),
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculated in `update()` nevertheless.
            target,
            up: Vector3::unit_z(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Rad(PI / 4.0),
            znear: 0.01,
            zfar: 1000.0,
            auto_rotate_speed: None,
            uniform: CameraUniform::default(),
            initial: (distance, pitch, yaw, target),
        };
        camera.update();
        camera
    }

    /// Builds the spherical parameters from a Cartesian eye position
    pub fn from_eye(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude();
        let (pitch, yaw) = if distance > f32::EPSILON {
            (
                (offset.z / distance).clamp(-1.0, 1.0).asin(),
                offset.y.atan2(offset.x),
            )
        } else {
            (0.0, 0.0)
        };
        Self::new(distance.max(f32::EPSILON), pitch, yaw, target, aspect)
    }

    /// Camera with projection, bounds and auto-rotation taken from the config
    pub fn from_config(camera: &CameraConfig, controls: &ControlsConfig, aspect: f32) -> Self {
        let mut orbit = Self::from_eye(camera.eye.into(), camera.target.into(), aspect);
        orbit.fovy = Deg(camera.fov_degrees).into();
        orbit.znear = camera.near;
        orbit.zfar = camera.far;
        orbit.bounds = OrbitCameraBounds {
            min_distance: controls.min_distance,
            max_distance: controls.max_distance,
            ..OrbitCameraBounds::default()
        }
        .with_polar_range(controls.min_polar_angle, controls.max_polar_angle);
        orbit.auto_rotate_speed = controls.auto_rotate.then_some(controls.auto_rotate_speed);

        // Re-apply the bounds to the starting position
        orbit.set_distance(orbit.distance);
        orbit.set_pitch(orbit.pitch);
        orbit.initial = (orbit.distance, orbit.pitch, orbit.yaw, orbit.target);
        orbit
    }

    /// Returns to the position the camera was created with
    pub fn reset_to_default(&mut self) {
        let (distance, pitch, yaw, target) = self.initial;
        self.target = target;
        self.distance = distance;
        self.pitch = pitch;
        self.yaw = yaw;
        self.update();
    }

    pub fn set_distance(&mut self, distance: f32) {
        let min = self.bounds.min_distance.unwrap_or(f32::EPSILON);
        let max = self.bounds.max_distance.unwrap_or(f32::MAX).max(min);
        self.distance = distance.clamp(min, max);
        self.update();
    }

    /// Multiplies the distance (`factor < 1` zooms in)
    pub fn dolly(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.set_distance(self.distance * factor);
        }
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Spins the camera around the target; `2π/60 · speed` radians per second
    pub fn auto_rotate(&mut self, dt: f32) {
        if let Some(speed) = self.auto_rotate_speed {
            if dt.is_finite() && dt > 0.0 {
                self.add_yaw(2.0 * PI / 60.0 * speed * dt);
            }
        }
    }

    /// Pans the target across the ground plane
    ///
    /// delta.0 = sideways (camera right), delta.1 = forward along the view
    /// heading projected onto the ground. Movement never has a vertical
    /// component, so the camera cannot drift off the terrain by panning.
    pub fn pan(&mut self, delta: (f32, f32)) {
        let heading = Vector3::new(-self.yaw.cos(), -self.yaw.sin(), 0.0);
        let right = heading.cross(self.up).normalize();

        let pan_scale = self.distance;
        let movement = right * delta.0 * pan_scale + heading * delta.1 * pan_scale;

        self.target += movement;
        self.update();
    }

    /// Polar angle from +Z
    pub fn polar_angle(&self) -> f32 {
        FRAC_PI_2 - self.pitch
    }

    /// Updates the camera after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: Some(16.0),
            min_pitch: -FRAC_PI_2 + POLE_EPSILON,
            max_pitch: FRAC_PI_2 - POLE_EPSILON,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

impl OrbitCameraBounds {
    /// Sets the pitch range from a polar-angle range measured from +Z
    pub fn with_polar_range(mut self, min_polar: f32, max_polar: f32) -> Self {
        let limit = FRAC_PI_2 - POLE_EPSILON;
        self.max_pitch = (FRAC_PI_2 - min_polar).clamp(-limit, limit);
        self.min_pitch = (FRAC_PI_2 - max_polar).clamp(-limit, self.max_pitch);
        self
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.cos() * pitch.cos(),
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
    ) + target
}
