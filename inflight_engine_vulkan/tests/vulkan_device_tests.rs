//! Integration tests for the Vulkan backend
//!
//! These tests drive the real device, surface and frame loop against a hidden
//! window. All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use inflight_engine::inflight::device::{CommandSequence, Format, Submission};
use inflight_engine::inflight::frame::{FrameContext, FrameOutcome, FrameProcessor, SwapchainTargets};
use inflight_engine::inflight::render::RenderPass;
use inflight_engine::inflight::swapchain::{SurfaceProvider, Swapchain};
use inflight_engine::inflight::sync::FrameState;
use inflight_engine::inflight::{Config, GraphicsDevice, Result};
use inflight_engine_vulkan::{VulkanContext, VulkanDepthTargets, VulkanDevice, VulkanSurface};
use std::sync::Arc;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Helper to create a test window for Vulkan
#[allow(deprecated)]
fn create_test_window() -> (Arc<Window>, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Inflight Vulkan Test")
        .with_inner_size(winit::dpi::LogicalSize::new(800, 600))
        .with_visible(false); // Hidden window for tests
    let window = event_loop.create_window(window_attrs).unwrap();
    (Arc::new(window), event_loop)
}

fn test_config() -> Config {
    Config {
        app_name: "inflight_vulkan_tests".to_string(),
        enable_validation: false,
        ..Config::default()
    }
}

fn create_device(window: Arc<Window>) -> (Arc<VulkanContext>, Arc<dyn GraphicsDevice>) {
    let context = VulkanContext::new(window, &test_config()).unwrap();
    let device: Arc<dyn GraphicsDevice> = VulkanDevice::new(Arc::clone(&context)).unwrap();
    (context, device)
}

/// Color format the surface actually offers, from the default preference list
fn surface_color_format(surface: &VulkanSurface) -> Format {
    let capabilities = surface.capabilities().unwrap();
    let preferred = test_config().swapchain.preferred_formats;
    preferred
        .iter()
        .copied()
        .find(|format| capabilities.formats.iter().any(|f| f.format == *format))
        .unwrap()
}

/// The render pass clear is the whole frame
fn clear_only(_ctx: &FrameContext<'_>, _commands: &mut CommandSequence) -> Result<()> {
    Ok(())
}

// ============================================================================
// DEVICE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_context_and_device() {
    let (window, _event_loop) = create_test_window();
    let (_context, device) = create_device(window);

    device.wait_idle().unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_fence_round_trip() {
    let (window, _event_loop) = create_test_window();
    let (_context, device) = create_device(window);

    let fence = device.create_fence(true).unwrap();
    device.wait_for_fence(fence, u64::MAX).unwrap();
    device.reset_fence(fence).unwrap();

    // An empty submission still signals the fence
    device
        .submit(&Submission { fence: Some(fence), ..Default::default() })
        .unwrap();
    device.wait_for_fence(fence, u64::MAX).unwrap();

    device.destroy_fence(fence);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_frame_state_create_destroy() {
    let (window, _event_loop) = create_test_window();
    let (_context, device) = create_device(window);

    let state = FrameState::create(device.as_ref()).unwrap();
    assert_ne!(state.available(), state.ready());
    state.destroy(device.as_ref());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_record_empty_sequence() {
    let (window, _event_loop) = create_test_window();
    let (_context, device) = create_device(window);

    let command_buffer = device.allocate_command_buffer().unwrap();
    device.record(command_buffer, &CommandSequence::new()).unwrap();
    device.free_command_buffer(command_buffer);
}

// ============================================================================
// SURFACE / SWAPCHAIN TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_surface_capabilities() {
    let (window, _event_loop) = create_test_window();
    let (context, _device) = create_device(window);
    let surface = VulkanSurface::new(context);

    let capabilities = surface.capabilities().unwrap();

    assert!(capabilities.min_image_count >= 1);
    assert!(!capabilities.formats.is_empty());
    assert!(capabilities.present_modes.contains(&inflight_engine::inflight::swapchain::PresentMode::Fifo));
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_swapchain_acquire() {
    let (window, _event_loop) = create_test_window();
    let (context, device) = create_device(window);
    let mut surface = VulkanSurface::new(context);

    let mut config = test_config().swapchain;
    let capabilities = surface.capabilities().unwrap();
    config.image_count = capabilities.min_image_count.max(2);
    if !capabilities.supports_image_count(config.image_count) {
        config.image_count = capabilities.min_image_count;
    }

    let mut swapchain = Swapchain::new(&mut surface, &config).unwrap();
    assert!(swapchain.image_count() >= config.image_count as usize);

    let fence = device.create_fence(false).unwrap();
    let status = swapchain.acquire(None, Some(fence)).unwrap();
    if let Some(index) = status.value() {
        assert!((index as usize) < swapchain.image_count());
        device.wait_for_fence(fence, u64::MAX).unwrap();
    }

    device.wait_idle().unwrap();
    device.destroy_fence(fence);
}

// ============================================================================
// FRAME LOOP TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_render_frames() {
    let (window, _event_loop) = create_test_window();
    let (context, device) = create_device(window);
    let surface = VulkanSurface::new(context);
    let color_format = surface_color_format(&surface);

    let render_pass = Arc::new(
        RenderPass::presentable(Arc::clone(&device), color_format, None, [0.1, 0.2, 0.3, 1.0]).unwrap(),
    );
    let mut config = test_config();
    config.swapchain.image_count = surface.capabilities().unwrap().min_image_count.max(2);

    let mut processor = FrameProcessor::new(
        device,
        Box::new(surface),
        render_pass,
        &config,
        Box::new(SwapchainTargets),
    )
    .unwrap();

    let mut recorder = clear_only;
    for _ in 0..4 {
        let outcome = processor.render(&mut recorder).unwrap();
        assert!(!matches!(outcome, FrameOutcome::Suspended));
    }

    assert_eq!(processor.stats().frames_presented + processor.stats().frames_dropped, 4);
    processor.shutdown().unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_render_with_depth_targets() {
    let (window, _event_loop) = create_test_window();
    let (context, device) = create_device(window);
    let surface = VulkanSurface::new(Arc::clone(&context));
    let color_format = surface_color_format(&surface);

    let render_pass = Arc::new(
        RenderPass::presentable(
            Arc::clone(&device),
            color_format,
            Some(Format::D32_FLOAT),
            [0.0, 0.0, 0.0, 1.0],
        )
        .unwrap(),
    );
    let mut config = test_config();
    config.swapchain.image_count = surface.capabilities().unwrap().min_image_count.max(2);

    let depth_targets = VulkanDepthTargets::new(context, Format::D32_FLOAT).unwrap();
    let mut processor = FrameProcessor::new(
        device,
        Box::new(surface),
        render_pass,
        &config,
        Box::new(depth_targets),
    )
    .unwrap();

    let mut recorder = clear_only;
    for _ in 0..3 {
        processor.render(&mut recorder).unwrap();
    }

    processor.shutdown().unwrap();
}
