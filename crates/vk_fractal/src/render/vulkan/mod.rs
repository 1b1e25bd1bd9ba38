//! Vulkan rendering backend
//!
//! RAII wrappers around the Vulkan objects the fractal viewer needs, and the
//! [`VulkanBackend`] that drives them for the frame orchestrator.

pub mod backend;
pub mod buffer;
pub mod commands;
pub mod context;
pub mod frame_slot;
pub mod framebuffer;
pub mod overlay;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use backend::VulkanBackend;
pub use buffer::MappedBuffer;
pub use commands::{ActiveRenderPass, CommandPool, CommandRecorder};
pub use context::{LogicalDevice, PhysicalDeviceInfo, VulkanContext, VulkanError, VulkanInstance, VulkanResult};
pub use frame_slot::VulkanFrameSlot;
pub use framebuffer::Framebuffer;
pub use overlay::{FieldSwatchOverlay, OverlayRecorder};
pub use pipeline::FullscreenPipeline;
pub use render_pass::RenderPass;
pub use shader::{FullscreenShaders, ShaderModule};
pub use swapchain::PresentableSurface;
pub use sync::{Fence, Semaphore};
