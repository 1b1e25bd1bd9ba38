//! Fractal parameters shared between the host and the raymarching shader
//!
//! - [`ParameterBlock`]: the GPU-visible uniform block
//! - [`FractalField`]: the selectable distance fields
//! - [`ControlPanel`]: keyboard-driven tuning of the live parameters

mod control_panel;
mod field;
mod params;

pub use control_panel::{ControlPanel, ParamAdjust, Tunable};
pub use field::FractalField;
pub use params::ParameterBlock;
