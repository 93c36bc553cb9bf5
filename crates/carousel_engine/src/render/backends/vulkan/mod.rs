//! Vulkan shadow backend
//!
//! Every light owns one depth image plus its view, sampler and framebuffer.
//! All targets share a single depth-only render pass that leaves the image in
//! `DEPTH_STENCIL_READ_ONLY_OPTIMAL` so the lit pass can sample it directly.

use std::rc::Rc;

use ash::{vk, Device};
use thiserror::Error;

use crate::render::shadow::ShadowBackend;
use crate::render::{RenderError, RenderResult};

mod shadow_target;

pub use shadow_target::{ShadowRenderPass, VulkanDepthTexture, VulkanShadowTarget};

/// Depth format of every shadow map
pub const SHADOW_DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Errors raised while creating or using Vulkan shadow resources
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

impl From<VulkanError> for RenderError {
    fn from(error: VulkanError) -> Self {
        match error {
            VulkanError::Api(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
            | VulkanError::Api(vk::Result::ERROR_OUT_OF_HOST_MEMORY)
            | VulkanError::NoSuitableMemoryType => {
                RenderError::ResourceCreationFailed(error.to_string())
            }
            other => RenderError::BackendError(other.to_string()),
        }
    }
}

/// Creates [`VulkanShadowTarget`]s on one logical device
pub struct VulkanShadowBackend {
    device: Device,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    render_pass: Rc<ShadowRenderPass>,
}

impl VulkanShadowBackend {
    /// Create the backend and its shared depth-only render pass
    pub fn new(
        device: Device,
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> RenderResult<Self> {
        let memory_properties =
            unsafe { instance.get_physical_device_memory_properties(physical_device) };
        let render_pass = ShadowRenderPass::new(device.clone()).map_err(|e| {
            RenderError::InitializationFailed(format!("shadow render pass: {e}"))
        })?;
        let render_pass = Rc::new(render_pass);

        log::info!("Vulkan shadow backend ready ({:?} depth maps)", SHADOW_DEPTH_FORMAT);

        Ok(Self {
            device,
            memory_properties,
            render_pass,
        })
    }

    /// Render pass every shadow pipeline must be created against
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.handle()
    }
}

impl ShadowBackend for VulkanShadowBackend {
    type Target = VulkanShadowTarget;

    fn create_target(&mut self, size: u32) -> RenderResult<VulkanShadowTarget> {
        if size == 0 {
            return Err(RenderError::ResourceCreationFailed(
                "shadow map size must be positive".to_string(),
            ));
        }

        VulkanShadowTarget::new(
            self.device.clone(),
            &self.memory_properties,
            Rc::clone(&self.render_pass),
            size,
        )
        .map_err(|e| {
            log::error!("Failed to create {}x{} shadow map: {}", size, size, e);
            RenderError::from(e)
        })
    }
}

/// Find a memory type matching both the resource's filter and `properties`
pub(crate) fn find_memory_type(
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
) -> VulkanResult<u32> {
    (0..memory_properties.memory_type_count)
        .find(|&i| {
            (type_filter & (1 << i)) != 0
                && memory_properties.memory_types[i as usize]
                    .property_flags
                    .contains(properties)
        })
        .ok_or(VulkanError::NoSuitableMemoryType)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties_with(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut properties = vk::PhysicalDeviceMemoryProperties::default();
        for (i, &property_flags) in flags.iter().enumerate() {
            properties.memory_types[i] = vk::MemoryType { property_flags, heap_index: 0 };
        }
        properties.memory_type_count = flags.len() as u32;
        properties
    }

    #[test]
    fn memory_type_respects_filter_and_flags() {
        let properties = properties_with(&[
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ]);

        let index = find_memory_type(0b110, vk::MemoryPropertyFlags::DEVICE_LOCAL, &properties);
        assert_eq!(index.unwrap(), 1);

        let index = find_memory_type(0b100, vk::MemoryPropertyFlags::DEVICE_LOCAL, &properties);
        assert_eq!(index.unwrap(), 2);

        let missing = find_memory_type(0b001, vk::MemoryPropertyFlags::DEVICE_LOCAL, &properties);
        assert!(matches!(missing, Err(VulkanError::NoSuitableMemoryType)));
    }

    #[test]
    fn out_of_memory_maps_to_resource_failure() {
        let error = RenderError::from(VulkanError::Api(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        assert!(matches!(error, RenderError::ResourceCreationFailed(_)));

        let error = RenderError::from(VulkanError::Api(vk::Result::ERROR_DEVICE_LOST));
        assert!(matches!(error, RenderError::BackendError(_)));
    }
}
