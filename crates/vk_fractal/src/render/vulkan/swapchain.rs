//! Presentable surface: swapchain, image views and the render pass targeting them
//!
//! Recreation destroys the current image set before negotiating a new one, so
//! callers must make sure no submitted work still references the old images.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use super::context::VulkanContext;
use super::render_pass::RenderPass;
use super::{VulkanError, VulkanResult};
use crate::render::backend::{AcquireStatus, PresentStatus};
use crate::render::surface::{self, SurfaceExtent};

/// One negotiated image set
struct SwapchainImages {
    device: Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: SurfaceExtent,
}

impl SwapchainImages {
    fn create(context: &VulkanContext, requested: SurfaceExtent) -> VulkanResult<Self> {
        let physical = &context.physical_device;
        let surface_loader = &context.surface_loader;

        let (caps, formats, present_modes) = unsafe {
            (
                surface_loader
                    .get_physical_device_surface_capabilities(physical.device, context.surface)
                    .map_err(VulkanError::Api)?,
                surface_loader
                    .get_physical_device_surface_formats(physical.device, context.surface)
                    .map_err(VulkanError::Api)?,
                surface_loader
                    .get_physical_device_surface_present_modes(physical.device, context.surface)
                    .map_err(VulkanError::Api)?,
            )
        };

        let choice = surface::negotiate(&caps, &formats, &present_modes, requested).ok_or_else(|| {
            VulkanError::InitializationFailed("Surface reports no supported formats".to_string())
        })?;
        if choice.extent.is_empty() {
            return Err(VulkanError::SurfaceMinimized);
        }

        let queue_families = [physical.graphics_family, physical.present_family];
        let mut create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(context.surface)
            .min_image_count(choice.min_image_count)
            .image_format(choice.format.format)
            .image_color_space(choice.format.color_space)
            .image_extent(choice.extent.to_vk())
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(choice.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());
        create_info = if physical.separate_present_family() {
            create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_families)
        } else {
            create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        };

        let device = context.raw_device().clone();
        let loader = context.swapchain_loader().clone();
        let swapchain = unsafe { loader.create_swapchain(&create_info, None).map_err(VulkanError::Api)? };

        // From here on Drop releases whatever has been created
        let mut images = Self {
            device,
            loader,
            swapchain,
            images: Vec::new(),
            image_views: Vec::new(),
            format: choice.format,
            present_mode: choice.present_mode,
            extent: choice.extent,
        };

        images.images = unsafe {
            images
                .loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::Api)?
        };
        for index in 0..images.images.len() {
            let view = images.create_view(images.images[index])?;
            images.image_views.push(view);
        }

        log::debug!(
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            images.extent.width,
            images.extent.height,
            images.images.len(),
            images.format.format,
            images.present_mode
        );
        Ok(images)
    }

    fn create_view(&self, image: vk::Image) -> VulkanResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(self.format.format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe { self.device.create_image_view(&create_info, None).map_err(VulkanError::Api) }
    }
}

impl Drop for SwapchainImages {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Swapchain lifecycle owner
///
/// Holds at most one image set at a time. After a failed recreation the surface
/// is left destroyed: [`extent`](Self::extent) reports zero and acquisition
/// reports [`AcquireStatus::Stale`] until a later recreation succeeds.
pub struct PresentableSurface {
    current: Option<SwapchainImages>,
    render_pass: Option<RenderPass>,
    render_pass_format: vk::Format,
}

impl PresentableSurface {
    /// Negotiate the initial image set
    ///
    /// Fails with [`VulkanError::SurfaceMinimized`] if the platform reports a
    /// zero-sized surface.
    pub fn new(context: &VulkanContext, requested: SurfaceExtent) -> VulkanResult<Self> {
        let mut surface = Self {
            current: None,
            render_pass: None,
            render_pass_format: vk::Format::UNDEFINED,
        };
        surface.recreate(context, requested)?;
        Ok(surface)
    }

    /// Destroy the current image set and negotiate a new one
    ///
    /// The render pass is rebuilt only when the negotiated format changes.
    /// An empty request fails with [`VulkanError::SurfaceMinimized`] and leaves
    /// the current image set untouched.
    pub fn recreate(&mut self, context: &VulkanContext, requested: SurfaceExtent) -> VulkanResult<()> {
        if requested.is_empty() {
            return Err(VulkanError::SurfaceMinimized);
        }
        self.destroy();

        let images = SwapchainImages::create(context, requested)?;
        if self.render_pass.is_none() || self.render_pass_format != images.format.format {
            self.render_pass = None;
            self.render_pass = Some(RenderPass::new_present_pass(
                context.raw_device().clone(),
                images.format.format,
            )?);
            self.render_pass_format = images.format.format;
        }
        self.current = Some(images);
        Ok(())
    }

    /// Release the current image set, keeping the render pass
    pub fn destroy(&mut self) {
        if self.current.take().is_some() {
            log::debug!("Swapchain destroyed");
        }
    }

    /// Raw swapchain handle, null while destroyed
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.current
            .as_ref()
            .map_or_else(vk::SwapchainKHR::null, |images| images.swapchain)
    }

    /// Image extent, zero while destroyed
    pub fn extent(&self) -> SurfaceExtent {
        self.current.as_ref().map(|images| images.extent).unwrap_or_default()
    }

    /// Image format, `UNDEFINED` while destroyed
    pub fn format(&self) -> vk::Format {
        self.current
            .as_ref()
            .map_or(vk::Format::UNDEFINED, |images| images.format.format)
    }

    /// Number of presentable images
    pub fn image_count(&self) -> usize {
        self.current.as_ref().map_or(0, |images| images.images.len())
    }

    /// Views over the presentable images, in image-index order
    pub fn image_views(&self) -> &[vk::ImageView] {
        self.current
            .as_ref()
            .map_or(&[][..], |images| images.image_views.as_slice())
    }

    /// Render pass compatible with the current images, null before the first negotiation
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
            .as_ref()
            .map_or_else(vk::RenderPass::null, RenderPass::handle)
    }

    /// Request the next image, signalling `image_ready` once it is usable
    pub fn acquire_next_image(&self, image_ready: vk::Semaphore) -> VulkanResult<AcquireStatus> {
        let Some(images) = &self.current else {
            return Ok(AcquireStatus::Stale);
        };

        let result = unsafe {
            images
                .loader
                .acquire_next_image(images.swapchain, u64::MAX, image_ready, vk::Fence::null())
        };
        match result {
            Ok((image_index, false)) => Ok(AcquireStatus::Ready { image_index }),
            Ok((_, true)) => Ok(AcquireStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireStatus::Stale),
            Err(e) => Err(VulkanError::Api(e)),
        }
    }

    /// Queue `image_index` for presentation after `wait` signals
    pub fn present(&self, queue: vk::Queue, wait: vk::Semaphore, image_index: u32) -> VulkanResult<PresentStatus> {
        let Some(images) = &self.current else {
            return Ok(PresentStatus::Stale);
        };

        let wait_semaphores = [wait];
        let swapchains = [images.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { images.loader.queue_present(queue, &present_info) } {
            Ok(false) => Ok(PresentStatus::Presented),
            Ok(true) => Ok(PresentStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentStatus::Stale),
            Err(e) => Err(VulkanError::Api(e)),
        }
    }
}
