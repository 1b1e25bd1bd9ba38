//! Scripted presentation backend for exercising the draw loop without a GPU

use std::collections::VecDeque;

use super::backend::{AcquireStatus, FrameSlot, PresentStatus, PresentationBackend, RecordTarget};
use super::surface::SurfaceExtent;
use super::vulkan::{VulkanError, VulkanResult};
use crate::fractal::ParameterBlock;

/// Slot with fake handles and a byte buffer standing in for mapped memory
#[derive(Debug)]
pub struct MockSlot {
    pub id: usize,
    pub command_buffer: u64,
    pub image_ready: u64,
    pub work_submitted: u64,
    pub retired_guard: u64,
    memory: Vec<u8>,
}

impl MockSlot {
    /// Shrink the fake mapping so it can no longer hold a block
    pub fn truncate_memory(&mut self, len: usize) {
        self.memory.truncate(len);
    }
}

impl FrameSlot for MockSlot {
    fn write_parameters(&mut self, params: &ParameterBlock) -> VulkanResult<()> {
        let bytes = params.as_bytes();
        if bytes.len() > self.memory.len() {
            return Err(VulkanError::InvalidOperation {
                reason: format!("write of {} bytes into {}-byte buffer", bytes.len(), self.memory.len()),
            });
        }
        self.memory[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn read_parameters(&self) -> Option<ParameterBlock> {
        ParameterBlock::from_bytes(&self.memory)
    }
}

/// Backend call log entry
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    WaitRetired { slot: usize },
    Acquire { slot: usize },
    Record { slot: usize, target: RecordTarget },
    Submit {
        slot: usize,
        command_buffer: u64,
        image_ready: u64,
        work_submitted: u64,
        retired_guard: u64,
    },
    Present { slot: usize, image_index: u32 },
    Recreate { extent: SurfaceExtent },
    WaitIdle,
}

impl Call {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WaitRetired { .. } => "wait_retired",
            Self::Acquire { .. } => "acquire",
            Self::Record { .. } => "record",
            Self::Submit { .. } => "submit",
            Self::Present { .. } => "present",
            Self::Recreate { .. } => "recreate",
            Self::WaitIdle => "wait_idle",
        }
    }
}

/// Simulated device and swapchain
///
/// Submitted work retires exactly when the host waits for it, so the number of
/// outstanding submissions is the worst case the loop allows.
pub struct MockBackend {
    pub calls: Vec<Call>,
    /// Acquire results to return before falling back to rotating images
    pub acquire_script: VecDeque<AcquireStatus>,
    /// Present results to return before falling back to `Presented`
    pub present_script: VecDeque<PresentStatus>,
    /// Number of upcoming recreations that find the window minimized
    pub minimized_recreations: usize,
    pub max_outstanding: usize,
    pub extent: SurfaceExtent,
    pub image_count: u32,
    /// Extent each framebuffer was built for, one per image
    pub framebuffers: Vec<SurfaceExtent>,
    outstanding: Vec<usize>,
    next_image: u32,
    next_handle: u64,
}

impl MockBackend {
    pub fn new(extent: SurfaceExtent) -> Self {
        let image_count = 3;
        Self {
            calls: Vec::new(),
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            minimized_recreations: 0,
            max_outstanding: 0,
            extent,
            image_count,
            framebuffers: vec![extent; image_count as usize],
            outstanding: Vec::new(),
            next_image: 0,
            next_handle: 1,
        }
    }

    fn handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    pub fn create_slot(&mut self, id: usize) -> MockSlot {
        MockSlot {
            id,
            command_buffer: self.handle(),
            image_ready: self.handle(),
            work_submitted: self.handle(),
            retired_guard: self.handle(),
            memory: vec![0; ParameterBlock::SIZE],
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }
}

impl PresentationBackend for MockBackend {
    type Slot = MockSlot;

    fn wait_retired(&mut self, slot: &MockSlot) -> VulkanResult<()> {
        self.calls.push(Call::WaitRetired { slot: slot.id });
        self.outstanding.retain(|&id| id != slot.id);
        Ok(())
    }

    fn acquire_image(&mut self, slot: &mut MockSlot) -> VulkanResult<AcquireStatus> {
        self.calls.push(Call::Acquire { slot: slot.id });
        let status = match self.acquire_script.pop_front() {
            Some(status) => status,
            None => {
                let image_index = self.next_image;
                self.next_image = (self.next_image + 1) % self.image_count;
                AcquireStatus::Ready { image_index }
            }
        };
        if status == AcquireStatus::Suboptimal {
            slot.image_ready = self.handle();
        }
        Ok(status)
    }

    fn record_frame(&mut self, slot: &MockSlot, target: &RecordTarget, _params: &ParameterBlock) -> VulkanResult<()> {
        assert!(
            !self.outstanding.contains(&slot.id),
            "slot {} re-recorded while its submission is in flight",
            slot.id
        );
        assert!(target.image_index < self.image_count);
        assert_eq!(target.extent, self.extent);
        assert_eq!(self.framebuffers.len(), self.image_count as usize);
        assert!(self.framebuffers.iter().all(|fb| *fb == self.extent));
        self.calls.push(Call::Record {
            slot: slot.id,
            target: *target,
        });
        Ok(())
    }

    fn submit_frame(&mut self, slot: &MockSlot) -> VulkanResult<()> {
        assert!(!self.outstanding.contains(&slot.id));
        self.outstanding.push(slot.id);
        self.max_outstanding = self.max_outstanding.max(self.outstanding.len());
        self.calls.push(Call::Submit {
            slot: slot.id,
            command_buffer: slot.command_buffer,
            image_ready: slot.image_ready,
            work_submitted: slot.work_submitted,
            retired_guard: slot.retired_guard,
        });
        Ok(())
    }

    fn present_frame(&mut self, slot: &MockSlot, image_index: u32) -> VulkanResult<PresentStatus> {
        self.calls.push(Call::Present {
            slot: slot.id,
            image_index,
        });
        Ok(self.present_script.pop_front().unwrap_or(PresentStatus::Presented))
    }

    fn recreate_surface(&mut self, requested: SurfaceExtent) -> VulkanResult<()> {
        assert!(self.outstanding.is_empty(), "surface recreated with work in flight");
        self.calls.push(Call::Recreate { extent: requested });
        if requested.is_empty() {
            return Err(VulkanError::SurfaceMinimized);
        }

        self.extent = SurfaceExtent::default();
        self.framebuffers.clear();
        if self.minimized_recreations > 0 {
            self.minimized_recreations -= 1;
            return Err(VulkanError::SurfaceMinimized);
        }

        self.extent = requested;
        self.framebuffers = vec![requested; self.image_count as usize];
        self.next_image = 0;
        Ok(())
    }

    fn surface_extent(&self) -> SurfaceExtent {
        self.extent
    }

    fn wait_idle(&mut self) -> VulkanResult<()> {
        self.outstanding.clear();
        self.calls.push(Call::WaitIdle);
        Ok(())
    }
}
