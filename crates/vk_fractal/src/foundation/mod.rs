//! Foundation module - Core utilities shared by the viewer
//!
//! - Frame timing
//! - Logging utilities

pub mod logging;
pub mod time;
