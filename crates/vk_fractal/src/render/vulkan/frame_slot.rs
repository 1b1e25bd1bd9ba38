//! Per-frame Vulkan resources

use ash::{vk, Device};

use super::buffer::MappedBuffer;
use super::context::VulkanContext;
use super::sync::{Fence, Semaphore};
use super::VulkanResult;
use crate::fractal::ParameterBlock;
use crate::render::backend::FrameSlot;

/// Command buffer, sync primitives and parameter buffer for one ring slot
///
/// The command buffer belongs to the context's pool and is freed with it.
pub struct VulkanFrameSlot {
    device: Device,
    command_buffer: vk::CommandBuffer,
    image_ready: Semaphore,
    work_submitted: Semaphore,
    retired: Fence,
    parameters: MappedBuffer,
}

impl VulkanFrameSlot {
    /// Allocate every primitive of one slot
    ///
    /// The retirement guard starts signaled so the first wait returns at once.
    pub fn new(context: &VulkanContext) -> VulkanResult<Self> {
        let device = context.raw_device().clone();
        let command_buffer = context.command_pool.allocate_primary()?;
        let image_ready = Semaphore::new(device.clone())?;
        let work_submitted = Semaphore::new(device.clone())?;
        let retired = Fence::new(device.clone(), true)?;
        let parameters = MappedBuffer::new(
            device.clone(),
            &context.physical_device.memory_properties,
            ParameterBlock::SIZE,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
        )?;

        Ok(Self {
            device,
            command_buffer,
            image_ready,
            work_submitted,
            retired,
            parameters,
        })
    }

    /// Replace the image-ready semaphore with a fresh unsignaled one
    ///
    /// Only valid once nothing can still wait on or signal the old one.
    pub fn renew_image_ready(&mut self) -> VulkanResult<()> {
        self.image_ready = Semaphore::new(self.device.clone())?;
        Ok(())
    }

    /// Command buffer recorded each time this slot is used
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Signalled by acquisition when the image can be rendered to
    pub fn image_ready(&self) -> vk::Semaphore {
        self.image_ready.handle()
    }

    /// Signalled by the submission; presentation waits on it
    pub fn work_submitted(&self) -> vk::Semaphore {
        self.work_submitted.handle()
    }

    /// Retirement guard
    pub fn retired(&self) -> &Fence {
        &self.retired
    }

    /// Parameter buffer handle and size, for descriptor binding
    pub fn parameter_binding(&self) -> (vk::Buffer, vk::DeviceSize) {
        (self.parameters.handle(), self.parameters.size() as vk::DeviceSize)
    }
}

impl FrameSlot for VulkanFrameSlot {
    fn write_parameters(&mut self, params: &ParameterBlock) -> VulkanResult<()> {
        self.parameters.write(params.as_bytes())
    }

    fn read_parameters(&self) -> Option<ParameterBlock> {
        ParameterBlock::from_bytes(self.parameters.bytes())
    }
}
