//! Vulkan implementation of the presentation backend

use ash::vk;
use std::num::NonZeroUsize;

use super::commands::CommandRecorder;
use super::context::VulkanContext;
use super::frame_slot::VulkanFrameSlot;
use super::overlay::OverlayRecorder;
use super::pipeline::FullscreenPipeline;
use super::shader::{self, FullscreenShaders};
use super::swapchain::PresentableSurface;
use super::{VulkanError, VulkanResult};
use crate::config::RendererConfig;
use crate::fractal::ParameterBlock;
use crate::render::backend::{AcquireStatus, PresentStatus, PresentationBackend, RecordTarget};
use crate::render::frame_ring::FrameRing;
use crate::render::surface::SurfaceExtent;
use crate::window::Window;

/// Device, surface and pipeline driving the fullscreen fractal draw
///
/// Fields drop in declaration order, dependents first. The frame ring returned
/// by [`VulkanBackend::new`] must be dropped before the backend;
/// [`FrameOrchestrator`](crate::render::FrameOrchestrator) takes care of that.
pub struct VulkanBackend {
    overlay: Option<Box<dyn OverlayRecorder>>,
    pipeline: FullscreenPipeline,
    surface: PresentableSurface,
    clear_color: [f32; 4],
    context: VulkanContext,
}

impl VulkanBackend {
    /// Initialise Vulkan for `window` and create the frame ring
    pub fn new(
        window: &mut Window,
        config: &RendererConfig,
        requested: SurfaceExtent,
    ) -> VulkanResult<(Self, FrameRing<VulkanFrameSlot>)> {
        let frames = NonZeroUsize::new(config.frames_in_flight).ok_or_else(|| VulkanError::InvalidOperation {
            reason: "At least one frame in flight is required".to_string(),
        })?;
        let shaders = FullscreenShaders::load(&shader::resolve_shader_dir(config.shader_dir.as_deref()))?;

        let context = VulkanContext::new(window, &config.application_name, config.validation_enabled())?;
        let surface = PresentableSurface::new(&context, requested)?;
        let ring = FrameRing::init(frames, |_| VulkanFrameSlot::new(&context))?;
        log::debug!("Created {} frame slot(s)", ring.len());

        let pipeline = FullscreenPipeline::new(context.raw_device().clone(), &surface, shaders, ring.len())?;
        let bindings: Vec<_> = ring.iter().map(VulkanFrameSlot::parameter_binding).collect();
        pipeline.bind_parameter_buffers(&bindings)?;

        log::info!(
            "Vulkan backend ready: {}x{}, {} swapchain images, {} frames in flight",
            surface.extent().width,
            surface.extent().height,
            surface.image_count(),
            ring.len()
        );

        let backend = Self {
            overlay: None,
            pipeline,
            surface,
            clear_color: config.clear_color,
            context,
        };
        Ok((backend, ring))
    }

    /// Record `overlay` after the fullscreen draw of every frame
    pub fn set_overlay(&mut self, overlay: Box<dyn OverlayRecorder>) {
        self.overlay = Some(overlay);
    }
}

impl PresentationBackend for VulkanBackend {
    type Slot = VulkanFrameSlot;

    fn wait_retired(&mut self, slot: &Self::Slot) -> VulkanResult<()> {
        slot.retired().wait(u64::MAX)
    }

    fn acquire_image(&mut self, slot: &mut Self::Slot) -> VulkanResult<AcquireStatus> {
        let status = self.surface.acquire_next_image(slot.image_ready())?;
        if status == AcquireStatus::Suboptimal {
            // The acquire will signal image_ready but nothing is going to wait on it
            self.context.wait_idle()?;
            slot.renew_image_ready()?;
        }
        Ok(status)
    }

    fn record_frame(&mut self, slot: &Self::Slot, target: &RecordTarget, params: &ParameterBlock) -> VulkanResult<()> {
        let framebuffer = self
            .pipeline
            .framebuffer(target.image_index)
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: format!("No framebuffer for image {}", target.image_index),
            })?
            .handle();
        let descriptor_set =
            self.pipeline
                .descriptor_set(target.descriptor_index)
                .ok_or_else(|| VulkanError::InvalidOperation {
                    reason: format!("No descriptor set {}", target.descriptor_index),
                })?;

        let extent = target.extent.to_vk();
        let area = vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        };
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: self.clear_color,
            },
        }];

        let mut recorder = CommandRecorder::begin(self.context.raw_device(), slot.command_buffer())?;
        {
            let mut pass = recorder.begin_render_pass(self.surface.render_pass(), framebuffer, area, &clear_values);
            pass.set_viewport(vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            });
            pass.set_scissor(area);
            pass.bind_graphics_pipeline(self.pipeline.handle());
            pass.bind_descriptor_set(self.pipeline.layout(), descriptor_set);
            pass.draw(3, 1, 0, 0);

            if let Some(overlay) = self.overlay.as_mut() {
                overlay.record(&mut pass, extent, params)?;
            }
        }
        recorder.end()?;
        Ok(())
    }

    fn submit_frame(&mut self, slot: &Self::Slot) -> VulkanResult<()> {
        slot.retired().reset()?;

        let wait_semaphores = [slot.image_ready()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [slot.command_buffer()];
        let signal_semaphores = [slot.work_submitted()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.context
                .raw_device()
                .queue_submit(self.context.graphics_queue(), &[submit_info], slot.retired().handle())
                .map_err(VulkanError::Api)
        }
    }

    fn present_frame(&mut self, slot: &Self::Slot, image_index: u32) -> VulkanResult<PresentStatus> {
        self.surface
            .present(self.context.present_queue(), slot.work_submitted(), image_index)
    }

    fn recreate_surface(&mut self, requested: SurfaceExtent) -> VulkanResult<()> {
        if requested.is_empty() {
            return Err(VulkanError::SurfaceMinimized);
        }
        self.pipeline.release_framebuffers();
        self.surface.recreate(&self.context, requested)?;
        self.pipeline.recreate_framebuffers(&self.surface)?;

        let extent = self.surface.extent();
        log::debug!(
            "Surface recreated at {}x{} with {} framebuffers",
            extent.width,
            extent.height,
            self.pipeline.framebuffer_count()
        );
        Ok(())
    }

    fn surface_extent(&self) -> SurfaceExtent {
        self.surface.extent()
    }

    fn wait_idle(&mut self) -> VulkanResult<()> {
        self.context.wait_idle()
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        if let Err(e) = self.context.wait_idle() {
            log::error!("Device wait failed during backend teardown: {}", e);
        }
    }
}
