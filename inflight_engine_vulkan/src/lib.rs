/*!
# Inflight Engine - Vulkan Backend

Vulkan implementation of the inflight_engine device and surface seams, using
Ash for Vulkan bindings and gpu-allocator for depth target memory.

## Usage

```no_run
use std::sync::Arc;
use inflight_engine::inflight::{Config, GraphicsDevice};
use inflight_engine::inflight::device::Format;
use inflight_engine::inflight::frame::{FrameProcessor, SwapchainTargets};
use inflight_engine::inflight::render::RenderPass;
use inflight_engine_vulkan::{VulkanContext, VulkanDevice, VulkanSurface};

# fn run(window: Arc<winit::window::Window>) -> inflight_engine::inflight::Result<()> {
let config = Config::default();
let context = VulkanContext::new(window, &config)?;
let device: Arc<dyn GraphicsDevice> = VulkanDevice::new(Arc::clone(&context))?;
let render_pass = Arc::new(RenderPass::presentable(
    Arc::clone(&device),
    Format::B8G8R8A8_SRGB,
    None,
    [0.0, 0.0, 0.0, 1.0],
)?);
let _processor = FrameProcessor::new(
    device,
    Box::new(VulkanSurface::new(context)),
    render_pass,
    &config,
    Box::new(SwapchainTargets),
)?;
# Ok(())
# }
```
*/

mod vulkan_format;
mod vulkan_context;
mod vulkan_command_encoder;
mod vulkan_device;
mod vulkan_surface;
mod vulkan_swapchain;
mod vulkan_depth_targets;
#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub use vulkan_context::VulkanContext;
pub use vulkan_device::VulkanDevice;
pub use vulkan_surface::VulkanSurface;
pub use vulkan_swapchain::VulkanSwapchain;
pub use vulkan_depth_targets::VulkanDepthTargets;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use vulkan_debug::{print_validation_stats_report, validation_stats, ValidationStats};
