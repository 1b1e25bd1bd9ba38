//! Presentation backend seam
//!
//! [`FrameOrchestrator`](super::FrameOrchestrator) drives any backend through
//! this trait. The Vulkan implementation lives in
//! [`VulkanBackend`](super::vulkan::VulkanBackend); tests use a scripted mock.

use super::surface::SurfaceExtent;
use super::vulkan::VulkanResult;
use crate::fractal::ParameterBlock;

/// Outcome of requesting the next presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStatus {
    /// Image acquired; the slot's image-ready signal will fire when it is usable
    Ready {
        /// Index into the surface's image set
        image_index: u32,
    },
    /// The surface no longer matches the window and must be recreated
    Stale,
    /// An image was acquired but the surface should be recreated
    Suboptimal,
}

/// Outcome of a presentation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    /// Presented normally
    Presented,
    /// The surface no longer matches the window
    Stale,
    /// Presented, but the surface should be recreated
    Suboptimal,
}

/// What the Record step renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTarget {
    /// Acquired image
    pub image_index: u32,
    /// Descriptor set to bind; always the active ring index
    pub descriptor_index: usize,
    /// Current surface extent used for viewport and scissor
    pub extent: SurfaceExtent,
}

/// Per-frame resources owned by one ring slot
pub trait FrameSlot {
    /// Copy the parameter block into the slot's mapped buffer
    fn write_parameters(&mut self, params: &ParameterBlock) -> VulkanResult<()>;

    /// Read back the slot's mapped buffer, `None` if it cannot hold a full block
    fn read_parameters(&self) -> Option<ParameterBlock>;
}

/// Device-side operations of the per-frame loop
///
/// Every method except [`wait_retired`](Self::wait_retired) must return
/// promptly; that call is the only place the render thread blocks.
pub trait PresentationBackend {
    /// Slot type stored in the frame ring
    type Slot: FrameSlot;

    /// Block until the slot's previous submission has retired
    fn wait_retired(&mut self, slot: &Self::Slot) -> VulkanResult<()>;

    /// Request the next image, signalling the slot's image-ready primitive
    ///
    /// On [`AcquireStatus::Suboptimal`] the backend must leave the slot with a
    /// fresh, unsignaled image-ready primitive.
    fn acquire_image(&mut self, slot: &mut Self::Slot) -> VulkanResult<AcquireStatus>;

    /// Record the frame's commands into the slot's command buffer
    fn record_frame(&mut self, slot: &Self::Slot, target: &RecordTarget, params: &ParameterBlock)
        -> VulkanResult<()>;

    /// Re-arm the slot's retirement guard and submit its recorded commands
    fn submit_frame(&mut self, slot: &Self::Slot) -> VulkanResult<()>;

    /// Present `image_index` once the slot's submission has signalled
    fn present_frame(&mut self, slot: &Self::Slot, image_index: u32) -> VulkanResult<PresentStatus>;

    /// Destroy and rebuild the surface and everything bound to its images
    ///
    /// The caller guarantees no submitted work still references the old images.
    fn recreate_surface(&mut self, requested: SurfaceExtent) -> VulkanResult<()>;

    /// Extent of the current surface
    fn surface_extent(&self) -> SurfaceExtent;

    /// Wait until the device has finished all submitted work
    fn wait_idle(&mut self) -> VulkanResult<()>;
}
