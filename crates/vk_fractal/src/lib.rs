//! # vk_fractal
//!
//! Live Vulkan viewer for raymarched distance-field fractals.
//!
//! ## Features
//!
//! - **Frame ring**: N frames in flight, each with its own command buffer,
//!   semaphores, fence and mapped parameter buffer
//! - **Presentable surface**: swapchain negotiation and destroy-then-rebuild
//!   recreation on resize or staleness
//! - **Frame orchestrator**: the wait, acquire, record, submit, present loop,
//!   generic over a backend so it can be exercised without a GPU
//! - **Fly camera and control panel**: quaternion camera and keyboard-driven
//!   fractal parameter tuning
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vk_fractal::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     let config = ViewerConfig::load_from_file("viewer.toml")?;
//!     let mut app = ViewerApp::new(&config)?;
//!     let stats = app.run()?;
//!     println!("{} frames presented", stats.presented);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod app;
pub mod camera;
pub mod config;
pub mod events;
pub mod foundation;
pub mod fractal;
pub mod render;
pub mod window;

pub use app::{ViewerApp, ViewerError};

/// Common imports for viewer users
pub mod prelude {
    pub use crate::{
        app::{EventEffect, ViewerApp, ViewerError, ViewerState},
        camera::{FlyCamera, MovementInput},
        config::{Config, ConfigError, ViewerConfig},
        events::{EventQueue, ViewerEvent},
        fractal::{ControlPanel, FractalField, ParameterBlock},
        render::{FrameOrchestrator, FrameOutcome, FrameRing, FrameStats, PresentationBackend, SurfaceExtent},
    };
}
