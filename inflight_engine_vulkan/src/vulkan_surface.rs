/// VulkanSurface - Vulkan implementation of the SurfaceProvider trait
///
/// Reports what the window surface supports right now and creates swapchains
/// from negotiated settings. Surface formats the engine has no name for are
/// left out of the capability report.

use ash::vk;
use inflight_engine::inflight::device::Extent2D;
use inflight_engine::inflight::swapchain::{
    SurfaceCapabilities, SurfaceFormat, SurfaceProvider, SwapchainBackend, SwapchainSettings,
};
use inflight_engine::inflight::Result;
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::{
    color_space_from_vk, composite_alphas_from_vk, format_from_vk, present_mode_from_vk,
    transform_from_vk, transforms_from_vk, vk_error,
};
use crate::vulkan_swapchain::VulkanSwapchain;

pub struct VulkanSurface {
    context: Arc<VulkanContext>,
}

impl VulkanSurface {
    pub fn new(context: Arc<VulkanContext>) -> Self {
        Self { context }
    }
}

/// Translate a native capability report
///
/// A current extent of `u32::MAX` means the swapchain picks its own extent.
pub(crate) fn capabilities_from_vk(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    formats: &[vk::SurfaceFormatKHR],
    present_modes: &[vk::PresentModeKHR],
) -> SurfaceCapabilities {
    let current_extent = if capabilities.current_extent.width == u32::MAX {
        None
    } else {
        Some(Extent2D::new(
            capabilities.current_extent.width,
            capabilities.current_extent.height,
        ))
    };

    SurfaceCapabilities {
        min_image_count: capabilities.min_image_count,
        max_image_count: capabilities.max_image_count,
        current_extent,
        min_image_extent: Extent2D::new(
            capabilities.min_image_extent.width,
            capabilities.min_image_extent.height,
        ),
        max_image_extent: Extent2D::new(
            capabilities.max_image_extent.width,
            capabilities.max_image_extent.height,
        ),
        current_transform: transform_from_vk(capabilities.current_transform),
        supported_transforms: transforms_from_vk(capabilities.supported_transforms),
        supported_composite_alpha: composite_alphas_from_vk(capabilities.supported_composite_alpha),
        present_modes: present_modes.iter().filter_map(|&mode| present_mode_from_vk(mode)).collect(),
        formats: formats
            .iter()
            .filter_map(|f| {
                Some(SurfaceFormat {
                    format: format_from_vk(f.format)?,
                    color_space: color_space_from_vk(f.color_space)?,
                })
            })
            .collect(),
    }
}

impl SurfaceProvider for VulkanSurface {
    fn capabilities(&self) -> Result<SurfaceCapabilities> {
        let context = &self.context;
        unsafe {
            let capabilities = context
                .surface_loader
                .get_physical_device_surface_capabilities(context.physical_device, context.surface)
                .map_err(|e| vk_error("query surface capabilities", e))?;
            let formats = context
                .surface_loader
                .get_physical_device_surface_formats(context.physical_device, context.surface)
                .map_err(|e| vk_error("query surface formats", e))?;
            let present_modes = context
                .surface_loader
                .get_physical_device_surface_present_modes(context.physical_device, context.surface)
                .map_err(|e| vk_error("query surface present modes", e))?;

            Ok(capabilities_from_vk(&capabilities, &formats, &present_modes))
        }
    }

    fn fallback_extent(&self) -> Extent2D {
        let size = self.context.window().inner_size();
        Extent2D::new(size.width, size.height)
    }

    fn create_swapchain(&mut self, settings: &SwapchainSettings) -> Result<Box<dyn SwapchainBackend>> {
        Ok(Box::new(VulkanSwapchain::new(Arc::clone(&self.context), settings)?))
    }
}
