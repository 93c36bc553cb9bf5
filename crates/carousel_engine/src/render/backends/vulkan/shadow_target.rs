//! Vulkan depth render targets with RAII cleanup

use std::rc::Rc;

use ash::{vk, Device};

use super::{find_memory_type, VulkanError, VulkanResult, SHADOW_DEPTH_FORMAT};
use crate::render::shadow::ShadowTarget;
use crate::render::{RenderError, RenderResult};

/// Depth-only render pass shared by all shadow targets
pub struct ShadowRenderPass {
    device: Device,
    render_pass: vk::RenderPass,
}

impl ShadowRenderPass {
    /// Create a render pass with a single cleared depth attachment
    pub fn new(device: Device) -> VulkanResult<Self> {
        let depth_attachment = vk::AttachmentDescription::builder()
            .format(SHADOW_DEPTH_FORMAT)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL)
            .build();

        let depth_attachment_ref = vk::AttachmentReference::builder()
            .attachment(0)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
            .build();

        let subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .depth_stencil_attachment(&depth_attachment_ref)
            .build();

        // Previous frame's sampling must finish before we overwrite the map,
        // and our writes must land before the lit pass samples it.
        let dependencies = [
            vk::SubpassDependency::builder()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .src_access_mask(vk::AccessFlags::SHADER_READ)
                .dst_stage_mask(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
                .dst_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
                .build(),
            vk::SubpassDependency::builder()
                .src_subpass(0)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS)
                .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .dst_access_mask(vk::AccessFlags::SHADER_READ)
                .build(),
        ];

        let attachments = [depth_attachment];
        let subpasses = [subpass];
        let render_pass_create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            device
                .create_render_pass(&render_pass_create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, render_pass })
    }

    /// Get the render pass handle
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for ShadowRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

/// Sampling handles of a shadow map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VulkanDepthTexture {
    /// Depth image view
    pub image_view: vk::ImageView,
    /// Comparison sampler for `sampler2DShadow` lookups
    pub sampler: vk::Sampler,
}

/// Depth image, view, sampler and framebuffer of one light
pub struct VulkanShadowTarget {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    image_view: vk::ImageView,
    sampler: vk::Sampler,
    framebuffer: vk::Framebuffer,
    render_pass: Rc<ShadowRenderPass>,
    size: u32,
}

impl VulkanShadowTarget {
    pub(super) fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        render_pass: Rc<ShadowRenderPass>,
        size: u32,
    ) -> VulkanResult<Self> {
        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: size,
                height: size,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(SHADOW_DEPTH_FORMAT)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe {
            device
                .create_image(&image_create_info, None)
                .map_err(VulkanError::Api)?
        };

        let memory_requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory = find_memory_type(
            memory_requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            memory_properties,
        )
        .and_then(|memory_type_index| {
            let alloc_info = vk::MemoryAllocateInfo::builder()
                .allocation_size(memory_requirements.size)
                .memory_type_index(memory_type_index);
            unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::Api) }
        });
        let memory = match memory {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        // From here on `target` owns everything created so far and its Drop
        // releases it if a later step fails.
        let mut target = Self {
            device,
            image,
            memory,
            image_view: vk::ImageView::null(),
            sampler: vk::Sampler::null(),
            framebuffer: vk::Framebuffer::null(),
            render_pass,
            size,
        };

        unsafe {
            target
                .device
                .bind_image_memory(image, memory, 0)
                .map_err(VulkanError::Api)?;
        }

        let image_view_create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(SHADOW_DEPTH_FORMAT)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        target.image_view = unsafe {
            target
                .device
                .create_image_view(&image_view_create_info, None)
                .map_err(VulkanError::Api)?
        };

        // Outside the map counts as lit
        let sampler_create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
            .unnormalized_coordinates(false)
            .compare_enable(true)
            .compare_op(vk::CompareOp::LESS_OR_EQUAL)
            .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
            .min_lod(0.0)
            .max_lod(0.0);
        target.sampler = unsafe {
            target
                .device
                .create_sampler(&sampler_create_info, None)
                .map_err(VulkanError::Api)?
        };

        let attachments = [target.image_view];
        let framebuffer_create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(target.render_pass.handle())
            .attachments(&attachments)
            .width(size)
            .height(size)
            .layers(1);
        target.framebuffer = unsafe {
            target
                .device
                .create_framebuffer(&framebuffer_create_info, None)
                .map_err(VulkanError::Api)?
        };

        log::debug!("Created Vulkan shadow target {}x{}", size, size);
        Ok(target)
    }

    fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.size,
            height: self.size,
        }
    }
}

impl ShadowTarget for VulkanShadowTarget {
    type Recorder = vk::CommandBuffer;
    type Texture = VulkanDepthTexture;

    fn size(&self) -> u32 {
        self.size
    }

    fn begin_depth_pass(&mut self, command_buffer: &vk::CommandBuffer) -> RenderResult<()> {
        if *command_buffer == vk::CommandBuffer::null() {
            return Err(RenderError::RenderingFailed(
                "shadow pass needs a recording command buffer".to_string(),
            ));
        }

        let clear_values = [vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
        }];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent(),
        };
        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(self.render_pass.handle())
            .framebuffer(self.framebuffer)
            .render_area(render_area)
            .clear_values(&clear_values);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.size as f32,
            height: self.size as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        unsafe {
            self.device
                .cmd_begin_render_pass(*command_buffer, &begin_info, vk::SubpassContents::INLINE);
            self.device.cmd_set_viewport(*command_buffer, 0, &[viewport]);
            self.device.cmd_set_scissor(*command_buffer, 0, &[render_area]);
        }
        Ok(())
    }

    fn end_depth_pass(&mut self, command_buffer: &vk::CommandBuffer) {
        unsafe {
            self.device.cmd_end_render_pass(*command_buffer);
        }
    }

    fn depth_texture(&self) -> VulkanDepthTexture {
        VulkanDepthTexture {
            image_view: self.image_view,
            sampler: self.sampler,
        }
    }
}

impl Drop for VulkanShadowTarget {
    fn drop(&mut self) {
        // Null handles are ignored by the destroy calls
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
