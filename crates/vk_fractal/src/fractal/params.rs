//! GPU parameter block
//!
//! Mirrors the `Params` uniform block in `fullscreen.frag`. Every member is a
//! 16-byte vector so the host layout matches std140 without padding.

use nalgebra::Vector3;

use super::FractalField;
use crate::camera::CameraBasis;
use crate::config::FractalConfig;

/// Render, camera and fractal scalars consumed by the raymarching shader
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterBlock {
    /// Camera position (xyz)
    pub cam_pos: [f32; 4],
    /// Camera forward axis (xyz)
    pub cam_forward: [f32; 4],
    /// Camera right axis (xyz)
    pub cam_right: [f32; 4],
    /// Camera up axis (xyz)
    pub cam_up: [f32; 4],
    /// max distance, hit epsilon, normal epsilon, fov
    pub render: [f32; 4],
    /// max steps, field selector, iterations, debug flags
    pub render_int: [i32; 4],
    /// bailout, power
    pub fractal: [f32; 4],
    /// time, aspect
    pub misc: [f32; 4],
}

unsafe impl bytemuck::Pod for ParameterBlock {}
unsafe impl bytemuck::Zeroable for ParameterBlock {}

const _: () = assert!(std::mem::size_of::<ParameterBlock>() % 16 == 0);

impl Default for ParameterBlock {
    fn default() -> Self {
        Self::from_config(&FractalConfig::default())
    }
}

impl ParameterBlock {
    /// Size of the block in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Build the startup block from configuration, with the camera at (0, 0, 3)
    /// looking down -Z
    pub fn from_config(config: &FractalConfig) -> Self {
        Self {
            cam_pos: [0.0, 0.0, 3.0, 0.0],
            cam_forward: [0.0, 0.0, -1.0, 0.0],
            cam_right: [1.0, 0.0, 0.0, 0.0],
            cam_up: [0.0, 1.0, 0.0, 0.0],
            render: [
                config.max_distance,
                config.hit_epsilon,
                config.normal_epsilon,
                config.fov,
            ],
            render_int: [config.max_steps, config.field.selector(), config.iterations, 0],
            fractal: [config.bailout, config.power, 0.0, 0.0],
            misc: [0.0, 1.0, 0.0, 0.0],
        }
    }

    /// Raw bytes as uploaded to the GPU
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Rebuild a block from the first [`Self::SIZE`] bytes of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..Self::SIZE)
            .and_then(|head| bytemuck::try_pod_read_unaligned(head).ok())
    }

    /// Write camera position and basis
    pub fn set_camera(&mut self, position: &Vector3<f32>, basis: &CameraBasis) {
        self.cam_pos = extend(position);
        self.cam_forward = extend(&basis.forward);
        self.cam_right = extend(&basis.right);
        self.cam_up = extend(&basis.up);
    }

    /// Camera position
    pub fn camera_position(&self) -> Vector3<f32> {
        Vector3::new(self.cam_pos[0], self.cam_pos[1], self.cam_pos[2])
    }

    /// Active distance field
    pub fn field(&self) -> FractalField {
        FractalField::from_selector(self.render_int[1])
    }

    /// Select the distance field
    pub fn set_field(&mut self, field: FractalField) {
        self.render_int[1] = field.selector();
    }

    /// Raymarch step budget
    pub fn max_steps(&self) -> i32 {
        self.render_int[0]
    }

    /// Set the raymarch step budget
    pub fn set_max_steps(&mut self, steps: i32) {
        self.render_int[0] = steps;
    }

    /// Fractal iteration count
    pub fn iterations(&self) -> i32 {
        self.render_int[2]
    }

    /// Set the fractal iteration count
    pub fn set_iterations(&mut self, iterations: i32) {
        self.render_int[2] = iterations;
    }

    /// Miss distance
    pub fn max_distance(&self) -> f32 {
        self.render[0]
    }

    /// Set the miss distance
    pub fn set_max_distance(&mut self, distance: f32) {
        self.render[0] = distance;
    }

    /// Surface hit threshold
    pub fn hit_epsilon(&self) -> f32 {
        self.render[1]
    }

    /// Set the surface hit threshold
    pub fn set_hit_epsilon(&mut self, epsilon: f32) {
        self.render[1] = epsilon;
    }

    /// Normal estimation offset
    pub fn normal_epsilon(&self) -> f32 {
        self.render[2]
    }

    /// Set the normal estimation offset
    pub fn set_normal_epsilon(&mut self, epsilon: f32) {
        self.render[2] = epsilon;
    }

    /// Vertical field of view in radians
    pub fn fov(&self) -> f32 {
        self.render[3]
    }

    /// Escape radius
    pub fn bailout(&self) -> f32 {
        self.fractal[0]
    }

    /// Set the escape radius
    pub fn set_bailout(&mut self, bailout: f32) {
        self.fractal[0] = bailout;
    }

    /// Mandelbulb power
    pub fn power(&self) -> f32 {
        self.fractal[1]
    }

    /// Set the mandelbulb power
    pub fn set_power(&mut self, power: f32) {
        self.fractal[1] = power;
    }

    /// Seconds since startup
    pub fn time(&self) -> f32 {
        self.misc[0]
    }

    /// Set the animation time
    pub fn set_time(&mut self, seconds: f32) {
        self.misc[0] = seconds;
    }

    /// Viewport aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        self.misc[1]
    }

    /// Set the viewport aspect ratio
    pub fn set_aspect(&mut self, aspect: f32) {
        self.misc[1] = aspect;
    }
}

fn extend(v: &Vector3<f32>) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_layout_is_std140_friendly() {
        assert_eq!(ParameterBlock::SIZE, 128);
        assert_eq!(std::mem::align_of::<ParameterBlock>(), 16);

        let params = ParameterBlock::default();
        let base = std::ptr::addr_of!(params) as usize;
        assert_eq!(std::ptr::addr_of!(params.render_int) as usize - base, 80);
        assert_eq!(std::ptr::addr_of!(params.misc) as usize - base, 112);
    }

    #[test]
    fn test_defaults_match_startup_values() {
        let params = ParameterBlock::default();
        assert_eq!(params.field(), FractalField::Mandelbulb);
        assert_eq!(params.iterations(), 256);
        assert_eq!(params.max_steps(), 256);
        assert_relative_eq!(params.max_distance(), 50.0);
        assert_relative_eq!(params.hit_epsilon(), 1e-3);
        assert_relative_eq!(params.normal_epsilon(), 1e-3);
        assert_relative_eq!(params.bailout(), 32.0);
        assert_relative_eq!(params.power(), 8.0);
        assert_relative_eq!(params.fov(), 1.2);
        assert_relative_eq!(params.camera_position(), Vector3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_bytes_round_trip_is_identical() {
        let mut params = ParameterBlock::default();
        params.set_time(12.5);
        params.set_aspect(16.0 / 9.0);
        params.set_field(FractalField::Box);

        let restored = ParameterBlock::from_bytes(params.as_bytes()).unwrap();
        assert_eq!(restored.as_bytes(), params.as_bytes());
    }

    #[test]
    fn test_from_bytes_rejects_short_input() {
        let params = ParameterBlock::default();
        assert!(ParameterBlock::from_bytes(&params.as_bytes()[..64]).is_none());
    }

    #[test]
    fn test_from_bytes_reads_unaligned_prefix() {
        let params = ParameterBlock::default();
        let mut storage = vec![0u8; ParameterBlock::SIZE + 1];
        storage[1..].copy_from_slice(params.as_bytes());
        assert_eq!(ParameterBlock::from_bytes(&storage[1..]), Some(params));
    }
}
