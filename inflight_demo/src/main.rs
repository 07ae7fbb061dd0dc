//! Inflight demo - clears the window to a slowly cycling colour
//!
//! Exercises the whole frame loop: two frames in flight, per-frame clear
//! values, and swapchain rebuilds when the window is resized or minimized.

use std::sync::Arc;
use std::time::Instant;

use inflight_engine::inflight::device::{ClearValue, CommandSequence};
use inflight_engine::inflight::frame::{FrameContext, FrameOutcome, FrameProcessor, FrameRecorder, SwapchainTargets};
use inflight_engine::inflight::log::LogSeverity;
use inflight_engine::inflight::render::RenderPass;
use inflight_engine::inflight::swapchain::SurfaceProvider;
use inflight_engine::inflight::{Config, Engine, Error, GraphicsDevice, Result};
use inflight_engine::{inflight_error, inflight_info};
use inflight_engine_vulkan::{VulkanContext, VulkanDevice, VulkanSurface};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const SOURCE: &str = "inflight_demo";

/// Clear colour as a function of time
struct CyclingClear {
    start: Instant,
}

impl FrameRecorder for CyclingClear {
    fn record(&mut self, _frame: &FrameContext<'_>, _commands: &mut CommandSequence) -> Result<()> {
        Ok(())
    }

    fn clear_values(&mut self, _frame: &FrameContext<'_>) -> Option<Vec<Option<ClearValue>>> {
        let t = self.start.elapsed().as_secs_f32();
        let channel = |phase: f32| 0.5 + 0.5 * (t + phase).sin();
        Some(vec![Some(ClearValue::Color([channel(0.0), channel(2.1), channel(4.2), 1.0]))])
    }
}

struct Renderer {
    window: Arc<Window>,
    processor: FrameProcessor,
    recorder: CyclingClear,
}

impl Renderer {
    fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let context = VulkanContext::new(Arc::clone(&window), config)?;
        let device: Arc<dyn GraphicsDevice> = VulkanDevice::new(Arc::clone(&context))?;
        let surface = VulkanSurface::new(context);

        // The render pass format must be the one negotiation will pick
        let capabilities = surface.capabilities()?;
        let color_format = config
            .swapchain
            .preferred_formats
            .iter()
            .copied()
            .find(|format| capabilities.formats.iter().any(|f| f.format == *format))
            .ok_or_else(|| Error::UnsupportedSurface("no preferred colour format available".to_string()))?;

        let render_pass = Arc::new(RenderPass::presentable(
            Arc::clone(&device),
            color_format,
            None,
            [0.0, 0.0, 0.0, 1.0],
        )?);

        let processor = FrameProcessor::new(
            device,
            Box::new(surface),
            render_pass,
            config,
            Box::new(SwapchainTargets),
        )?;

        Ok(Self {
            window,
            processor,
            recorder: CyclingClear { start: Instant::now() },
        })
    }

    fn render(&mut self) -> Result<()> {
        if let FrameOutcome::Suspended = self.processor.render(&mut self.recorder)? {
            // Minimized: nothing to draw until the next resize
            return Ok(());
        }
        self.window.request_redraw();
        Ok(())
    }
}

#[derive(Default)]
struct App {
    renderer: Option<Renderer>,
}

impl App {
    fn shutdown(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            let stats = renderer.processor.stats();
            inflight_info!(
                SOURCE,
                "Presented {} frame(s), dropped {}, {} swapchain rebuild(s), {} suboptimal",
                stats.frames_presented,
                stats.frames_dropped,
                stats.rebuilds,
                stats.suboptimal_frames
            );
            if let Err(e) = renderer.processor.shutdown() {
                inflight_error!(SOURCE, "Shutdown failed: {}", e);
            }

            #[cfg(feature = "vulkan-validation")]
            inflight_engine_vulkan::print_validation_stats_report();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("Inflight Demo")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                inflight_error!(SOURCE, "Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let config = Config {
            app_name: "Inflight Demo".to_string(),
            ..Config::default()
        };

        match Renderer::new(window, &config) {
            Ok(renderer) => {
                inflight_info!(SOURCE, "Initialization complete, entering main loop");
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(e) => {
                inflight_error!(SOURCE, "Failed to create renderer: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                inflight_info!(SOURCE, "Close requested, shutting down");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                // The swapchain is rebuilt by the frame that sees it invalidated
                if let Some(renderer) = &self.renderer {
                    renderer.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) = renderer.render() {
                        inflight_error!(SOURCE, "Render error: {}", e);
                        self.shutdown();
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    Engine::set_min_severity(LogSeverity::Debug);
    inflight_info!(SOURCE, "Starting inflight demo");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::default();
    event_loop.run_app(&mut app)?;

    Ok(())
}
