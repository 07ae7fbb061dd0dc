/// VulkanSwapchain - Vulkan implementation of the SwapchainBackend trait
///
/// Created by `VulkanSurface` from negotiated settings. Acquire and present
/// only translate Vulkan results: out-of-date becomes `Invalidated`, the
/// suboptimal flag becomes `Suboptimal`, and no recovery is attempted here.

use ash::prelude::VkResult;
use ash::vk;
use inflight_engine::inflight::device::{Fence, ImageView, Semaphore};
use inflight_engine::inflight::swapchain::{SwapchainBackend, SwapchainImage, SwapchainSettings, SwapchainStatus};
use inflight_engine::inflight::Result;
use inflight_engine::inflight_debug;
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::{
    color_space_to_vk, composite_alpha_to_vk, extent_to_vk, format_to_vk, from_raw,
    present_mode_to_vk, to_raw, transform_to_vk, vk_error,
};

pub struct VulkanSwapchain {
    context: Arc<VulkanContext>,

    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,

    /// Owned by the swapchain; only the views are destroyed by us
    image_views: Vec<vk::ImageView>,
    images: Vec<SwapchainImage>,
}

impl VulkanSwapchain {
    pub(crate) fn new(context: Arc<VulkanContext>, settings: &SwapchainSettings) -> Result<Self> {
        let vk_format = format_to_vk(settings.format.format);

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(context.surface)
            .min_image_count(settings.image_count)
            .image_format(vk_format)
            .image_color_space(color_space_to_vk(settings.format.color_space))
            .image_extent(extent_to_vk(settings.extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(transform_to_vk(settings.transform))
            .composite_alpha(composite_alpha_to_vk(settings.composite_alpha))
            .present_mode(present_mode_to_vk(settings.present_mode))
            .clipped(true);

        let swapchain_loader = ash::khr::swapchain::Device::new(&context.instance, &context.device);

        unsafe {
            let swapchain = swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| vk_error("create swapchain", e))?;

            let swapchain_images = match swapchain_loader.get_swapchain_images(swapchain) {
                Ok(images) => images,
                Err(e) => {
                    swapchain_loader.destroy_swapchain(swapchain, None);
                    return Err(vk_error("get swapchain images", e));
                }
            };

            let mut image_views = Vec::with_capacity(swapchain_images.len());
            for &image in &swapchain_images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(vk_format)
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

                match context.device.create_image_view(&view_info, None) {
                    Ok(view) => image_views.push(view),
                    Err(e) => {
                        for view in image_views {
                            context.device.destroy_image_view(view, None);
                        }
                        swapchain_loader.destroy_swapchain(swapchain, None);
                        return Err(vk_error("create swapchain image view", e));
                    }
                }
            }

            let images = image_views
                .iter()
                .enumerate()
                .map(|(index, &view)| SwapchainImage {
                    index: index as u32,
                    view: ImageView::from_raw(to_raw(view)),
                    format: settings.format.format,
                    extent: settings.extent,
                })
                .collect();

            inflight_debug!(
                "inflight::vulkan",
                "Swapchain images: {} requested, {} created",
                settings.image_count,
                image_views.len()
            );

            Ok(Self {
                context,
                swapchain_loader,
                swapchain,
                image_views,
                images,
            })
        }
    }
}

/// Translate the result of `vkAcquireNextImageKHR`
pub(crate) fn acquire_status(result: VkResult<(u32, bool)>) -> Result<SwapchainStatus<u32>> {
    match result {
        Ok((index, false)) => Ok(SwapchainStatus::Optimal(index)),
        Ok((index, true)) => Ok(SwapchainStatus::Suboptimal(index)),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(SwapchainStatus::Invalidated),
        Err(e) => Err(vk_error("acquire next swapchain image", e)),
    }
}

/// Translate the result of `vkQueuePresentKHR`
pub(crate) fn present_status(result: VkResult<bool>) -> Result<SwapchainStatus<()>> {
    match result {
        Ok(false) => Ok(SwapchainStatus::Optimal(())),
        Ok(true) => Ok(SwapchainStatus::Suboptimal(())),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(SwapchainStatus::Invalidated),
        Err(e) => Err(vk_error("present swapchain image", e)),
    }
}

impl SwapchainBackend for VulkanSwapchain {
    fn images(&self) -> &[SwapchainImage] {
        &self.images
    }

    fn acquire_next_image(
        &mut self,
        timeout_ns: u64,
        signal_semaphore: Option<Semaphore>,
        signal_fence: Option<Fence>,
    ) -> Result<SwapchainStatus<u32>> {
        let semaphore = signal_semaphore
            .map(|semaphore| from_raw::<vk::Semaphore>(semaphore.raw()))
            .unwrap_or(vk::Semaphore::null());
        let fence = signal_fence
            .map(|fence| from_raw::<vk::Fence>(fence.raw()))
            .unwrap_or(vk::Fence::null());

        let result = unsafe {
            self.swapchain_loader
                .acquire_next_image(self.swapchain, timeout_ns, semaphore, fence)
        };
        acquire_status(result)
    }

    fn queue_present(&mut self, image_index: u32, wait_semaphore: Semaphore) -> Result<SwapchainStatus<()>> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [from_raw::<vk::Semaphore>(wait_semaphore.raw())];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = self
            .context
            .with_queue(|queue| unsafe { self.swapchain_loader.queue_present(queue, &present_info) })?;
        present_status(result)
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.context.device.destroy_image_view(view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
