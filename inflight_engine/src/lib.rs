/*!
# Inflight Engine

Backend-agnostic core of a frames-in-flight presentation pipeline.

The crate describes what a frame needs (render pass graph, framebuffers,
swapchain negotiation, per-slot synchronization, recorded commands) and drives
the acquire / record / submit / present loop. A backend crate supplies the
`GraphicsDevice` and `SurfaceProvider` implementations.

## Architecture

- **RenderPassBuilder / RenderPass**: validated attachment and subpass graph
- **Framebuffer**: image views bound to a render pass, with begin/end commands
- **Swapchain**: negotiated presentation images; acquire and present report
  `Optimal`, `Suboptimal` or `Invalidated`
- **FrameState**: per-slot `available` / `ready` semaphores and fence
- **FrameProcessor**: round-robin frame slots, recovery on invalidation

Nothing here touches a global device: every object holds the
`Arc<dyn GraphicsDevice>` it was created with.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod graphics_device;
pub mod renderer;
pub mod swapchain;
pub mod frame;

// Main inflight namespace module
pub mod inflight {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger registry
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{Config, DebugSeverity};

    // Device seam
    pub use crate::graphics_device::GraphicsDevice;

    // Logging sub-module (types only; the inflight_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device-facing types: handles, formats, commands, submissions
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Render pass graph and framebuffers
    pub mod render {
        pub use crate::renderer::*;
    }

    // Per-slot synchronization
    pub mod sync {
        pub use crate::graphics_device::sync::FrameState;
        pub use crate::graphics_device::Submission;
    }

    // Surface negotiation and presentation
    pub mod swapchain {
        pub use crate::swapchain::*;
    }

    // Frame loop
    pub mod frame {
        pub use crate::frame::*;
    }
}
