//! Viewer configuration sections
//!
//! Every section has working defaults, so a config file only needs the values
//! it wants to change.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::fractal::{ControlPanel, FractalField};

/// Upper bound for the frame ring length
pub const MAX_FRAMES_IN_FLIGHT: usize = 8;

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Requested width in screen coordinates
    pub width: u32,
    /// Requested height in screen coordinates
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "vk-fractal".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Vulkan renderer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name reported to the Vulkan driver
    pub application_name: String,
    /// Number of frame slots in the ring
    pub frames_in_flight: usize,
    /// Validation layers; `None` enables them in debug builds only
    pub enable_validation: Option<bool>,
    /// Directory holding `fullscreen.vert.spv` and `fullscreen.frag.spv`
    pub shader_dir: Option<String>,
    /// Render pass clear colour
    pub clear_color: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            application_name: "vk-fractal".to_string(),
            frames_in_flight: 2,
            enable_validation: None,
            shader_dir: None,
            clear_color: [0.15, 0.15, 0.18, 1.0],
        }
    }
}

impl RendererConfig {
    /// Whether validation layers should be requested
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }
}

/// Fly camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial world position
    pub position: [f32; 3],
    /// Translation speed in units per second
    pub move_speed: f32,
    /// Radians of rotation per pixel of pointer motion
    pub mouse_sensitivity: f32,
    /// Roll speed in degrees per second
    pub roll_speed_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            move_speed: 0.5,
            mouse_sensitivity: 0.0025,
            roll_speed_degrees: 120.0,
        }
    }
}

/// Initial raymarch and fractal tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    /// Distance field shown at startup
    pub field: FractalField,
    /// Fractal iteration count
    pub iterations: i32,
    /// Escape radius
    pub bailout: f32,
    /// Mandelbulb power / mandelbox scale
    pub power: f32,
    /// Raymarch step budget
    pub max_steps: i32,
    /// Distance at which a ray is considered a miss
    pub max_distance: f32,
    /// Surface hit threshold
    pub hit_epsilon: f32,
    /// Finite-difference offset for normals
    pub normal_epsilon: f32,
    /// Vertical field of view in radians
    pub fov: f32,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            field: FractalField::Mandelbulb,
            iterations: 256,
            bailout: 32.0,
            power: 8.0,
            max_steps: 256,
            max_distance: 50.0,
            hit_epsilon: 1e-3,
            normal_epsilon: 1e-3,
            fov: 1.2,
        }
    }
}

/// Top-level viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
    /// Camera settings
    pub camera: CameraConfig,
    /// Fractal settings
    pub fractal: FractalConfig,
    /// Default `env_logger` filter (overridden by `RUST_LOG`)
    pub log_level: String,
}

impl ViewerConfig {
    /// Set the number of frames in flight
    pub fn with_frames_in_flight(mut self, frames: usize) -> Self {
        self.renderer.frames_in_flight = frames;
        self
    }

    /// Force validation layers on or off
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.renderer.enable_validation = Some(enabled);
        self
    }

    /// Set the shader directory
    pub fn with_shader_dir(mut self, dir: impl Into<String>) -> Self {
        self.renderer.shader_dir = Some(dir.into());
        self
    }

    /// Set the log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.title.is_empty() {
            return Err(ConfigError::Invalid("Window title cannot be empty".to_string()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.renderer.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }
        if self.renderer.frames_in_flight == 0 {
            return Err(ConfigError::Invalid("Frames in flight must be at least 1".to_string()));
        }
        if self.renderer.frames_in_flight > MAX_FRAMES_IN_FLIGHT {
            return Err(ConfigError::Invalid(format!(
                "Frames in flight should not exceed {MAX_FRAMES_IN_FLIGHT}, got {}",
                self.renderer.frames_in_flight
            )));
        }
        if self.camera.move_speed < 0.0 || self.camera.mouse_sensitivity < 0.0 {
            return Err(ConfigError::Invalid("Camera speeds cannot be negative".to_string()));
        }
        self.fractal.validate()
    }
}

impl FractalConfig {
    /// Check every value against the range the control panel can reach
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("max_steps", self.max_steps, ControlPanel::STEPS_RANGE)?;
        check_range("iterations", self.iterations, ControlPanel::ITERATIONS_RANGE)?;
        check_range("power", self.power, ControlPanel::POWER_RANGE)?;
        check_range("bailout", self.bailout, ControlPanel::BAILOUT_RANGE)?;
        check_range("max_distance", self.max_distance, ControlPanel::DISTANCE_RANGE)?;
        check_range("hit_epsilon", self.hit_epsilon, ControlPanel::EPSILON_RANGE)?;
        check_range("normal_epsilon", self.normal_epsilon, ControlPanel::EPSILON_RANGE)?;
        if !(self.fov > 0.0 && self.fov < std::f32::consts::PI) {
            return Err(ConfigError::Invalid(format!(
                "Field of view must lie in (0, pi) radians, got {}",
                self.fov
            )));
        }
        Ok(())
    }
}

// NaN fails the containment check
fn check_range<T>(name: &str, value: T, (lo, hi): (T, T)) -> Result<(), ConfigError>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("Fractal {name} must lie in {lo}..={hi}, got {value}")))
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            renderer: RendererConfig::default(),
            camera: CameraConfig::default(),
            fractal: FractalConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config for ViewerConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_default_config_is_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.renderer.frames_in_flight, 2);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.fractal.field, FractalField::Mandelbulb);
    }

    #[test]
    fn test_frames_in_flight_bounds() {
        assert!(ViewerConfig::default().with_frames_in_flight(0).validate().is_err());
        assert!(ViewerConfig::default().with_frames_in_flight(1).validate().is_ok());
        assert!(ViewerConfig::default().with_frames_in_flight(8).validate().is_ok());
        assert!(ViewerConfig::default().with_frames_in_flight(9).validate().is_err());
    }

    #[test]
    fn test_zero_window_size_rejected() {
        let mut config = ViewerConfig::default();
        config.window.height = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_fractal_values_rejected() {
        let text = r#"
            [fractal]
            max_steps = 2147483647
        "#;
        let config = ViewerConfig::from_str_with_format(text, ConfigFormat::Toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ViewerConfig::default();
        config.fractal.hit_epsilon = -1e-3;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ViewerConfig::default();
        config.fractal.bailout = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.fractal.fov = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            log_level = "debug"

            [renderer]
            frames_in_flight = 3

            [fractal]
            field = "Mandelbox"
        "#;
        let config = ViewerConfig::from_str_with_format(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.renderer.frames_in_flight, 3);
        assert_eq!(config.fractal.field, FractalField::Mandelbox);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.fractal.iterations, 256);
    }

    #[test]
    fn test_toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        let config = ViewerConfig::default()
            .with_frames_in_flight(4)
            .with_validation(false)
            .with_shader_dir("/opt/shaders");

        config.save_to_file(&path).unwrap();
        let loaded = ViewerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.ron");
        let config = ViewerConfig::default().with_log_level("warn");

        config.save_to_file(&path).unwrap();
        let loaded = ViewerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            ViewerConfig::load_from_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
