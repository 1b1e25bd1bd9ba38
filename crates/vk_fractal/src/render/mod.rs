//! # Rendering
//!
//! Frame pacing and presentation for the fractal viewer.
//!
//! - [`FrameRing`]: fixed ring of per-frame resource bundles
//! - [`surface`]: swapchain negotiation policy
//! - [`FrameOrchestrator`]: the wait, acquire, record, submit, present loop
//! - [`vulkan`]: the Vulkan backend the orchestrator drives in production

pub mod backend;
pub mod frame_ring;
pub mod orchestrator;
pub mod surface;
pub mod vulkan;

#[cfg(test)]
mod testing;

pub use backend::{AcquireStatus, FrameSlot, PresentStatus, PresentationBackend, RecordTarget};
pub use frame_ring::FrameRing;
pub use orchestrator::{FrameOrchestrator, FrameOutcome, FrameStats};
pub use surface::{SurfaceChoice, SurfaceExtent};
pub use vulkan::{VulkanBackend, VulkanError, VulkanResult};
