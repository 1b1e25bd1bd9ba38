//! Distance field selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance field evaluated by the fragment shader
///
/// The discriminant is the selector value the shader switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FractalField {
    /// Unit sphere
    Sphere = 0,
    /// Unit box
    Box = 1,
    /// Power-N mandelbulb
    #[default]
    Mandelbulb = 2,
    /// Mandelbox
    Mandelbox = 3,
}

impl FractalField {
    /// All fields in selector order
    pub const ALL: [Self; 4] = [Self::Sphere, Self::Box, Self::Mandelbulb, Self::Mandelbox];

    /// Selector value written into the parameter block
    pub const fn selector(self) -> i32 {
        self as i32
    }

    /// Field for a selector value, clamped into the valid range
    pub fn from_selector(selector: i32) -> Self {
        let last = Self::ALL.len() as i32 - 1;
        Self::ALL[selector.clamp(0, last) as usize]
    }

    /// Step through the field list, stopping at either end
    pub fn shifted(self, delta: i32) -> Self {
        Self::from_selector(self.selector().saturating_add(delta))
    }

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sphere => "Sphere",
            Self::Box => "Box",
            Self::Mandelbulb => "Mandelbulb",
            Self::Mandelbox => "Mandelbox",
        }
    }

    /// Colour used by the on-screen field indicator
    pub const fn swatch_color(self) -> [f32; 4] {
        match self {
            Self::Sphere => [0.85, 0.30, 0.25, 1.0],
            Self::Box => [0.25, 0.70, 0.35, 1.0],
            Self::Mandelbulb => [0.30, 0.45, 0.90, 1.0],
            Self::Mandelbox => [0.90, 0.75, 0.20, 1.0],
        }
    }
}

impl fmt::Display for FractalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
