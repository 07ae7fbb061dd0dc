/// VulkanDepthTargets - per-swapchain-image depth buffers for colour + depth render passes
///
/// Each swapchain image gets its own depth image so frames in flight never
/// share one. All images are released together when the swapchain is rebuilt.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use inflight_engine::inflight::device::{Format, ImageView};
use inflight_engine::inflight::frame::TargetImages;
use inflight_engine::inflight::render::FramebufferImage;
use inflight_engine::inflight::swapchain::SwapchainImage;
use inflight_engine::inflight::{Error, Result};
use inflight_engine::{inflight_debug, inflight_error};
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::{format_to_vk, to_raw, vk_error};

struct DepthImage {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

pub struct VulkanDepthTargets {
    context: Arc<VulkanContext>,
    format: Format,
    images: Vec<DepthImage>,
}

impl VulkanDepthTargets {
    /// # Errors
    ///
    /// `Error::InvalidArgument` if `format` is not a depth format.
    pub fn new(context: Arc<VulkanContext>, format: Format) -> Result<Self> {
        if !format.is_depth() {
            return Err(Error::InvalidArgument(format!("{:?} is not a depth format", format)));
        }
        Ok(Self {
            context,
            format,
            images: Vec::new(),
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    fn create_depth_image(&self, image: &SwapchainImage) -> Result<DepthImage> {
        let device = &self.context.device;
        let vk_format = format_to_vk(self.format);

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(vk_format)
            .extent(vk::Extent3D {
                width: image.extent.width,
                height: image.extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        unsafe {
            let vk_image = device
                .create_image(&image_info, None)
                .map_err(|e| vk_error("create depth image", e))?;

            let mut depth = DepthImage {
                image: vk_image,
                view: vk::ImageView::null(),
                allocation: None,
            };

            let requirements = device.get_image_memory_requirements(vk_image);
            let allocation = self
                .context
                .allocator
                .lock()
                .map_err(|_| Error::BackendError("GPU allocator lock poisoned".to_string()))
                .and_then(|mut allocator| {
                    allocator
                        .allocate(&AllocationCreateDesc {
                            name: "depth_target",
                            requirements,
                            location: MemoryLocation::GpuOnly,
                            linear: false,
                            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                        })
                        .map_err(|e| {
                            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                            inflight_error!(
                                "inflight::vulkan",
                                "Out of GPU memory for depth target ({}x{}, {:.2} MB): {}",
                                image.extent.width,
                                image.extent.height,
                                size_mb,
                                e
                            );
                            Error::OutOfMemory
                        })
                });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.destroy_depth_image(depth);
                    return Err(e);
                }
            };

            let bound = device.bind_image_memory(vk_image, allocation.memory(), allocation.offset());
            depth.allocation = Some(allocation);
            if let Err(e) = bound {
                self.destroy_depth_image(depth);
                return Err(vk_error("bind depth image memory", e));
            }

            let mut aspect_mask = vk::ImageAspectFlags::DEPTH;
            if self.format.has_stencil() {
                aspect_mask |= vk::ImageAspectFlags::STENCIL;
            }

            let view_info = vk::ImageViewCreateInfo::default()
                .image(vk_image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(vk_format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            match device.create_image_view(&view_info, None) {
                Ok(view) => {
                    depth.view = view;
                    Ok(depth)
                }
                Err(e) => {
                    self.destroy_depth_image(depth);
                    Err(vk_error("create depth image view", e))
                }
            }
        }
    }

    fn destroy_depth_image(&self, depth: DepthImage) {
        unsafe {
            if depth.view != vk::ImageView::null() {
                self.context.device.destroy_image_view(depth.view, None);
            }
            self.context.device.destroy_image(depth.image, None);
        }
        if let Some(allocation) = depth.allocation {
            if let Ok(mut allocator) = self.context.allocator.lock() {
                allocator.free(allocation).ok();
            }
        }
    }
}

impl TargetImages for VulkanDepthTargets {
    fn attachments(&mut self, image: &SwapchainImage) -> Result<Vec<FramebufferImage>> {
        let depth = self.create_depth_image(image)?;
        let view = ImageView::from_raw(to_raw(depth.view));
        self.images.push(depth);

        Ok(vec![
            FramebufferImage {
                view: image.view,
                format: image.format,
                extent: image.extent,
            },
            FramebufferImage {
                view,
                format: self.format,
                extent: image.extent,
            },
        ])
    }

    fn release(&mut self) {
        if self.images.is_empty() {
            return;
        }
        inflight_debug!("inflight::vulkan", "Releasing {} depth target(s)", self.images.len());
        for depth in std::mem::take(&mut self.images) {
            self.destroy_depth_image(depth);
        }
    }
}

impl Drop for VulkanDepthTargets {
    fn drop(&mut self) {
        self.release();
    }
}
