/// GraphicsDevice trait - the device/queue seam used by the frame pipeline

use crate::error::Result;
use crate::graphics_device::command::CommandSequence;
use crate::graphics_device::handles::{
    CommandBufferHandle, Fence, FramebufferHandle, ImageView, RenderPassHandle, Semaphore,
};
use crate::graphics_device::types::{Extent2D, PipelineStages};
use crate::renderer::RenderPassLayout;

/// Framebuffer creation parameters (already validated against the render pass)
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDesc {
    pub render_pass: RenderPassHandle,
    /// Attachment views in render-pass declaration order
    pub attachments: Vec<ImageView>,
    pub extent: Extent2D,
}

/// One queue submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub command_buffers: Vec<CommandBufferHandle>,
    /// Semaphores to wait on, each at the given stages
    pub wait: Vec<(Semaphore, PipelineStages)>,
    pub signal: Vec<Semaphore>,
    /// Signalled once every command buffer has completed
    pub fence: Option<Fence>,
}

/// Logical device plus its single graphics/present queue
///
/// All methods take `&self`; implementations synchronize internally.
/// Timeouts are in nanoseconds, `u64::MAX` meaning unbounded.
pub trait GraphicsDevice: Send + Sync {
    // ===== SYNCHRONIZATION =====

    fn create_semaphore(&self) -> Result<Semaphore>;

    fn destroy_semaphore(&self, semaphore: Semaphore);

    /// Create a fence, optionally already signalled
    fn create_fence(&self, signaled: bool) -> Result<Fence>;

    fn destroy_fence(&self, fence: Fence);

    /// Block until `fence` is signalled
    fn wait_for_fence(&self, fence: Fence, timeout_ns: u64) -> Result<()>;

    fn reset_fence(&self, fence: Fence) -> Result<()>;

    /// Submit work to the queue
    fn submit(&self, submission: &Submission) -> Result<()>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> Result<()>;

    // ===== RESOURCES =====

    /// Realize a validated render pass layout as one native object
    fn create_render_pass(&self, layout: &RenderPassLayout) -> Result<RenderPassHandle>;

    fn destroy_render_pass(&self, render_pass: RenderPassHandle);

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<FramebufferHandle>;

    fn destroy_framebuffer(&self, framebuffer: FramebufferHandle);

    fn allocate_command_buffer(&self) -> Result<CommandBufferHandle>;

    fn free_command_buffer(&self, command_buffer: CommandBufferHandle);

    // ===== RECORDING =====

    /// Reset `command_buffer` and record `commands` into it
    fn record(&self, command_buffer: CommandBufferHandle, commands: &CommandSequence) -> Result<()>;
}
