//! Fullscreen raymarch pipeline
//!
//! One uniform-buffer descriptor set per frame slot, a graphics pipeline that
//! draws a single full-screen triangle, and one framebuffer per presentable
//! image. Viewport and scissor are dynamic so resizes only rebuild framebuffers.

use ash::{vk, Device};

use super::framebuffer::Framebuffer;
use super::shader::{FullscreenShaders, ShaderModule};
use super::swapchain::PresentableSurface;
use super::{VulkanError, VulkanResult};

/// Pipeline, layout, descriptor sets and per-image framebuffers
pub struct FullscreenPipeline {
    framebuffers: Vec<Framebuffer>,
    device: Device,
    shaders: FullscreenShaders,
    descriptor_set_layout: vk::DescriptorSetLayout,
    descriptor_pool: vk::DescriptorPool,
    descriptor_sets: Vec<vk::DescriptorSet>,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
    pipeline_format: vk::Format,
}

impl FullscreenPipeline {
    /// Build the pipeline for `surface` with `set_count` descriptor sets
    pub fn new(
        device: Device,
        surface: &PresentableSurface,
        shaders: FullscreenShaders,
        set_count: usize,
    ) -> VulkanResult<Self> {
        if set_count == 0 {
            return Err(VulkanError::InvalidOperation {
                reason: "Pipeline needs at least one descriptor set".to_string(),
            });
        }

        // Null handles until created; Drop cleans up any partial construction
        let mut pipeline = Self {
            framebuffers: Vec::new(),
            device,
            shaders,
            descriptor_set_layout: vk::DescriptorSetLayout::null(),
            descriptor_pool: vk::DescriptorPool::null(),
            descriptor_sets: Vec::new(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
            pipeline_format: vk::Format::UNDEFINED,
        };

        pipeline.create_descriptors(set_count)?;
        pipeline.create_layout()?;
        pipeline.create_pipeline(surface)?;
        pipeline.recreate_framebuffers(surface)?;

        log::debug!("Fullscreen pipeline created with {} descriptor set(s)", set_count);
        Ok(pipeline)
    }

    fn create_descriptors(&mut self, set_count: usize) -> VulkanResult<()> {
        let count = u32::try_from(set_count).map_err(|_| VulkanError::InvalidOperation {
            reason: format!("Too many descriptor sets: {}", set_count),
        })?;

        let bindings = [vk::DescriptorSetLayoutBinding::builder()
            .binding(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::FRAGMENT)
            .build()];
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);
        self.descriptor_set_layout = unsafe {
            self.device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let pool_sizes = [vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: count,
        }];
        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(&pool_sizes)
            .max_sets(count);
        self.descriptor_pool = unsafe {
            self.device
                .create_descriptor_pool(&pool_info, None)
                .map_err(VulkanError::Api)?
        };

        let layouts = vec![self.descriptor_set_layout; set_count];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.descriptor_pool)
            .set_layouts(&layouts);
        self.descriptor_sets = unsafe {
            self.device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(VulkanError::Api)?
        };
        Ok(())
    }

    fn create_layout(&mut self) -> VulkanResult<()> {
        let set_layouts = [self.descriptor_set_layout];
        let layout_info = vk::PipelineLayoutCreateInfo::builder().set_layouts(&set_layouts);
        self.pipeline_layout = unsafe {
            self.device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };
        Ok(())
    }

    fn create_pipeline(&mut self, surface: &PresentableSurface) -> VulkanResult<()> {
        let vertex = ShaderModule::new(self.device.clone(), &self.shaders.vertex)?;
        let fragment = ShaderModule::new(self.device.clone(), &self.shaders.fragment)?;
        let stages = [
            vertex.stage_info(vk::ShaderStageFlags::VERTEX),
            fragment.stage_info(vk::ShaderStageFlags::FRAGMENT),
        ];

        // The triangle is generated from gl_VertexIndex
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder();
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);
        let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .line_width(1.0);
        let multisample = vk::PipelineMultisampleStateCreateInfo::builder()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);
        let color_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blend = vk::PipelineColorBlendStateCreateInfo::builder().attachments(&color_attachments);
        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let create_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(self.pipeline_layout)
            .render_pass(surface.render_pass())
            .subpass(0)
            .build();

        let pipelines = unsafe {
            self.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| VulkanError::Api(e))?
        };
        self.pipeline = pipelines.into_iter().next().ok_or_else(|| {
            VulkanError::InitializationFailed("Driver returned no graphics pipeline".to_string())
        })?;
        self.pipeline_format = surface.format();
        Ok(())
    }

    /// Point descriptor set `i` at parameter buffer `i`
    ///
    /// `buffers` must hold exactly one `(buffer, size)` pair per descriptor set.
    pub fn bind_parameter_buffers(&self, buffers: &[(vk::Buffer, vk::DeviceSize)]) -> VulkanResult<()> {
        if buffers.len() != self.descriptor_sets.len() {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "{} parameter buffers for {} descriptor sets",
                    buffers.len(),
                    self.descriptor_sets.len()
                ),
            });
        }

        let buffer_infos: Vec<[vk::DescriptorBufferInfo; 1]> = buffers
            .iter()
            .map(|&(buffer, range)| {
                [vk::DescriptorBufferInfo {
                    buffer,
                    offset: 0,
                    range,
                }]
            })
            .collect();
        let writes: Vec<vk::WriteDescriptorSet> = self
            .descriptor_sets
            .iter()
            .zip(&buffer_infos)
            .map(|(&set, info)| {
                vk::WriteDescriptorSet::builder()
                    .dst_set(set)
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(info)
                    .build()
            })
            .collect();

        unsafe { self.device.update_descriptor_sets(&writes, &[]) };
        Ok(())
    }

    /// Drop every framebuffer; must happen before the surface's image views go away
    pub fn release_framebuffers(&mut self) {
        self.framebuffers.clear();
    }

    /// Rebuild one framebuffer per presentable image of `surface`
    ///
    /// The pipeline itself is rebuilt only if the surface format changed.
    pub fn recreate_framebuffers(&mut self, surface: &PresentableSurface) -> VulkanResult<()> {
        self.framebuffers.clear();

        if surface.format() != self.pipeline_format {
            unsafe { self.device.destroy_pipeline(self.pipeline, None) };
            self.pipeline = vk::Pipeline::null();
            self.create_pipeline(surface)?;
            log::debug!("Pipeline rebuilt for format {:?}", self.pipeline_format);
        }

        let extent = surface.extent().to_vk();
        self.framebuffers = surface
            .image_views()
            .iter()
            .map(|&view| Framebuffer::new(self.device.clone(), surface.render_pass(), &[view], extent))
            .collect::<VulkanResult<_>>()?;
        Ok(())
    }

    /// Descriptor set bound to parameter buffer `index`
    pub fn descriptor_set(&self, index: usize) -> Option<vk::DescriptorSet> {
        self.descriptor_sets.get(index).copied()
    }

    /// Framebuffer for presentable image `image_index`
    pub fn framebuffer(&self, image_index: u32) -> Option<&Framebuffer> {
        self.framebuffers.get(image_index as usize)
    }

    /// Number of framebuffers, one per presentable image
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Pipeline layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    /// Pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for FullscreenPipeline {
    fn drop(&mut self) {
        self.framebuffers.clear();
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
            // Destroying the pool frees its sets
            self.device.destroy_descriptor_pool(self.descriptor_pool, None);
            self.device
                .destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
    }
}
