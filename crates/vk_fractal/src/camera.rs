//! # Fly Camera
//!
//! Free-flight camera for exploring distance fields. Orientation is a unit
//! quaternion so the camera can roll freely without gimbal lock; the shader
//! only needs the position and the orthonormal basis derived from it.
//!
//! ## Conventions
//! - Right-handed, Y-up world space
//! - The camera looks down its local -Z axis
//! - Pointer X yaws about the local up axis, pointer Y pitches about local right

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::config::CameraConfig;

/// Orthonormal camera axes in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// View direction
    pub forward: Vector3<f32>,
    /// Screen-right direction
    pub right: Vector3<f32>,
    /// Screen-up direction
    pub up: Vector3<f32>,
}

/// Keys held during a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementInput {
    /// W
    pub forward: bool,
    /// S
    pub backward: bool,
    /// A
    pub left: bool,
    /// D
    pub right: bool,
    /// Q
    pub roll_left: bool,
    /// E
    pub roll_right: bool,
}

impl MovementInput {
    /// True when no movement key is held
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Quaternion-oriented free-flight camera
#[derive(Debug, Clone)]
pub struct FlyCamera {
    /// World position
    pub position: Vector3<f32>,
    /// Authoritative orientation
    pub orientation: UnitQuaternion<f32>,
    /// Units per second
    pub move_speed: f32,
    /// Radians per pixel
    pub mouse_sensitivity: f32,
    /// Radians per second
    pub roll_speed: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl FlyCamera {
    /// Create a camera at the configured position looking down -Z
    pub fn from_config(config: &CameraConfig) -> Self {
        let [x, y, z] = config.position;
        Self {
            position: Vector3::new(x, y, z),
            orientation: UnitQuaternion::identity(),
            move_speed: config.move_speed,
            mouse_sensitivity: config.mouse_sensitivity,
            roll_speed: config.roll_speed_degrees.to_radians(),
        }
    }

    /// View direction
    pub fn forward(&self) -> Vector3<f32> {
        (self.orientation * -Vector3::z()).normalize()
    }

    /// Screen-right direction
    pub fn right(&self) -> Vector3<f32> {
        (self.orientation * Vector3::x()).normalize()
    }

    /// Screen-up direction
    pub fn up(&self) -> Vector3<f32> {
        (self.orientation * Vector3::y()).normalize()
    }

    /// Current basis
    pub fn basis(&self) -> CameraBasis {
        CameraBasis {
            forward: self.forward(),
            right: self.right(),
            up: self.up(),
        }
    }

    /// Rotate by a pointer delta in pixels
    pub fn process_pointer(&mut self, dx: f32, dy: f32) {
        let yaw = -dx * self.mouse_sensitivity;
        let pitch = dy * self.mouse_sensitivity;

        let q_yaw = UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.up()), yaw);
        let q_pitch = UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.right()), pitch);

        self.orientation = q_yaw * q_pitch * self.orientation;
        self.orientation.renormalize();
    }

    /// Translate and roll for the keys held over `dt` seconds
    pub fn process_keyboard(&mut self, input: &MovementInput, dt: f32) {
        let step = self.move_speed * dt;
        let forward = self.forward();
        let right = self.right();

        if input.forward {
            self.position += forward * step;
        }
        if input.backward {
            self.position -= forward * step;
        }
        if input.right {
            self.position += right * step;
        }
        if input.left {
            self.position -= right * step;
        }

        let mut roll = 0.0;
        if input.roll_left {
            roll += self.roll_speed * dt;
        }
        if input.roll_right {
            roll -= self.roll_speed * dt;
        }
        if roll != 0.0 {
            let q_roll = UnitQuaternion::from_axis_angle(&Unit::new_normalize(forward), roll);
            self.orientation = q_roll * self.orientation;
            self.orientation.renormalize();
        }
    }
}

/// Converts absolute cursor positions into look deltas
///
/// The first sample after (re)capturing the cursor only primes the reference
/// point so the view does not jump.
#[derive(Debug, Clone, Default)]
pub struct PointerLook {
    last: Option<(f64, f64)>,
}

impl PointerLook {
    /// Feed a cursor position, returning the delta since the previous one
    pub fn delta(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        let previous = self.last.replace((x, y))?;
        Some(((x - previous.0) as f32, (y - previous.1) as f32))
    }

    /// Forget the reference point
    pub fn reset(&mut self) {
        self.last = None;
    }
}
