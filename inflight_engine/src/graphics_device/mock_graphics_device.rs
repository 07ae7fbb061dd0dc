/// Mock graphics device for unit tests (no GPU required)
///
/// Every call is appended to a shared event log so tests can assert on the
/// exact order of device operations. Fences and semaphores carry a signalled
/// flag and the mock rejects operations a real device would hang or fault on:
/// waiting on an unsignalled fence with nothing pending, waiting on an
/// unsignalled semaphore, or signalling an already signalled one.
///
/// By default submitted work completes instantly. With
/// `defer_fence_completion` a submitted fence stays pending until the host
/// waits on it (or on the whole device), and resetting a pending fence fails.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::graphics_device::{
    Barrier, BeginRenderPass, CommandBufferHandle, CommandEncoder, CommandSequence, Fence,
    FramebufferDesc, FramebufferHandle, GraphicsDevice, PipelineHandle, Rect2D, RenderPassHandle,
    Semaphore, Submission, Viewport,
};
use crate::renderer::RenderPassLayout;

// ============================================================================
// Shared event log
// ============================================================================

/// One observable device or swapchain operation
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    CreateSemaphore(Semaphore),
    DestroySemaphore(Semaphore),
    CreateFence { fence: Fence, signaled: bool },
    DestroyFence(Fence),
    WaitFence(Fence),
    ResetFence(Fence),
    Submit(Submission),
    WaitIdle,
    CreateRenderPass { handle: RenderPassHandle, attachments: usize, subpasses: usize, dependencies: usize },
    DestroyRenderPass(RenderPassHandle),
    CreateFramebuffer { handle: FramebufferHandle, desc: FramebufferDesc },
    DestroyFramebuffer(FramebufferHandle),
    AllocateCommandBuffer(CommandBufferHandle),
    FreeCommandBuffer(CommandBufferHandle),
    Record { command_buffer: CommandBufferHandle, commands: Vec<String> },
    CreateSwapchain { image_count: u32, width: u32, height: u32 },
    DestroySwapchain,
    Acquire { signal: Option<Semaphore>, image_index: Option<u32> },
    Present { image_index: u32, wait: Semaphore },
    ReleaseTargets,
}

/// State shared between the mock device and the mock surface/swapchain
#[derive(Default)]
pub struct MockLog {
    events: Mutex<Vec<MockEvent>>,
    next_handle: AtomicU64,
    signaled_semaphores: Mutex<FxHashSet<Semaphore>>,
    fences: Mutex<FxHashMap<Fence, bool>>,
    pending_fences: Mutex<FxHashSet<Fence>>,
    live: Mutex<FxHashSet<u64>>,
}

impl MockLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU64::new(1),
            ..Default::default()
        })
    }

    pub fn push(&self, event: MockEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Allocate a fresh non-null handle value and track it as live
    pub fn allocate(&self) -> u64 {
        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.live.lock().unwrap().insert(raw);
        raw
    }

    pub fn release(&self, raw: u64) {
        self.live.lock().unwrap().remove(&raw);
    }

    /// Number of objects created and not yet destroyed
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    /// Mark `semaphore` signalled; signalling twice without a wait is an error
    pub fn signal_semaphore(&self, semaphore: Semaphore) -> Result<()> {
        if !self.signaled_semaphores.lock().unwrap().insert(semaphore) {
            return Err(Error::BackendError(format!("{:?} signalled twice without a wait", semaphore)));
        }
        Ok(())
    }

    /// Consume the signal of `semaphore`
    pub fn consume_semaphore(&self, semaphore: Semaphore) -> Result<()> {
        if !self.signaled_semaphores.lock().unwrap().remove(&semaphore) {
            return Err(Error::BackendError(format!("wait on unsignalled {:?} would never complete", semaphore)));
        }
        Ok(())
    }

    pub fn is_semaphore_signaled(&self, semaphore: Semaphore) -> bool {
        self.signaled_semaphores.lock().unwrap().contains(&semaphore)
    }

    fn set_fence(&self, fence: Fence, signaled: bool) {
        self.fences.lock().unwrap().insert(fence, signaled);
    }

    pub fn is_fence_signaled(&self, fence: Fence) -> bool {
        self.fences.lock().unwrap().get(&fence).copied().unwrap_or(false)
    }

    pub fn is_fence_pending(&self, fence: Fence) -> bool {
        self.pending_fences.lock().unwrap().contains(&fence)
    }

    /// Finish the work guarding `fence`; false if nothing was pending
    fn complete_fence(&self, fence: Fence) -> bool {
        let completed = self.pending_fences.lock().unwrap().remove(&fence);
        if completed {
            self.set_fence(fence, true);
        }
        completed
    }

    fn complete_all_fences(&self) {
        let pending: Vec<Fence> = self.pending_fences.lock().unwrap().drain().collect();
        for fence in pending {
            self.set_fence(fence, true);
        }
    }
}

// ============================================================================
// Mock command encoder
// ============================================================================

/// Records commands as readable strings
#[derive(Debug, Default)]
pub struct MockEncoder {
    pub commands: Vec<String>,
}

impl CommandEncoder for MockEncoder {
    fn begin_render_pass(&mut self, begin: &BeginRenderPass) {
        self.commands.push(format!(
            "begin_render_pass(fb={}, {}x{}, clears={})",
            begin.framebuffer.raw(),
            begin.render_area.width,
            begin.render_area.height,
            begin.clear_values.len()
        ));
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        self.commands.push(format!("bind_pipeline({})", pipeline.raw()));
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.commands.push(format!("set_viewport({}x{})", viewport.width, viewport.height));
    }

    fn set_scissor(&mut self, scissor: &Rect2D) {
        self.commands.push(format!("set_scissor({}x{})", scissor.width, scissor.height));
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, _first_vertex: u32, _first_instance: u32) {
        self.commands.push(format!("draw({}, {})", vertex_count, instance_count));
    }

    fn end_render_pass(&mut self) {
        self.commands.push("end_render_pass".to_string());
    }

    fn pipeline_barrier(&mut self, _barrier: &Barrier) {
        self.commands.push("pipeline_barrier".to_string());
    }
}

// ============================================================================
// Mock graphics device
// ============================================================================

pub struct MockGraphicsDevice {
    pub log: Arc<MockLog>,
    fail_next_submit: Mutex<Option<Error>>,
    defer_fences: AtomicBool,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::with_log(MockLog::new())
    }

    pub fn with_log(log: Arc<MockLog>) -> Self {
        Self {
            log,
            fail_next_submit: Mutex::new(None),
            defer_fences: AtomicBool::new(false),
        }
    }

    /// Keep submitted fences pending until the host waits on them
    pub fn defer_fence_completion(&self) {
        self.defer_fences.store(true, Ordering::Relaxed);
    }

    /// Make the next `submit` fail with `error`
    pub fn fail_next_submit(&self, error: Error) {
        *self.fail_next_submit.lock().unwrap() = Some(error);
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_semaphore(&self) -> Result<Semaphore> {
        let semaphore = Semaphore::from_raw(self.log.allocate());
        self.log.push(MockEvent::CreateSemaphore(semaphore));
        Ok(semaphore)
    }

    fn destroy_semaphore(&self, semaphore: Semaphore) {
        self.log.release(semaphore.raw());
        self.log.push(MockEvent::DestroySemaphore(semaphore));
    }

    fn create_fence(&self, signaled: bool) -> Result<Fence> {
        let fence = Fence::from_raw(self.log.allocate());
        self.log.set_fence(fence, signaled);
        self.log.push(MockEvent::CreateFence { fence, signaled });
        Ok(fence)
    }

    fn destroy_fence(&self, fence: Fence) {
        self.log.release(fence.raw());
        self.log.push(MockEvent::DestroyFence(fence));
    }

    fn wait_for_fence(&self, fence: Fence, _timeout_ns: u64) -> Result<()> {
        self.log.push(MockEvent::WaitFence(fence));
        self.log.complete_fence(fence);
        if !self.log.is_fence_signaled(fence) {
            return Err(Error::BackendError(format!(
                "wait on unsignalled {:?} with no pending submission would never complete",
                fence
            )));
        }
        Ok(())
    }

    fn reset_fence(&self, fence: Fence) -> Result<()> {
        if self.log.is_fence_pending(fence) {
            return Err(Error::InvalidSyncState(format!("{:?} reset while its work is still pending", fence)));
        }
        self.log.set_fence(fence, false);
        self.log.push(MockEvent::ResetFence(fence));
        Ok(())
    }

    fn submit(&self, submission: &Submission) -> Result<()> {
        if let Some(error) = self.fail_next_submit.lock().unwrap().take() {
            return Err(error);
        }
        for (semaphore, _) in &submission.wait {
            self.log.consume_semaphore(*semaphore)?;
        }
        for semaphore in &submission.signal {
            self.log.signal_semaphore(*semaphore)?;
        }
        if let Some(fence) = submission.fence {
            if self.defer_fences.load(Ordering::Relaxed) {
                if !self.log.pending_fences.lock().unwrap().insert(fence) {
                    return Err(Error::InvalidSyncState(format!("{:?} submitted twice while pending", fence)));
                }
            } else {
                self.log.set_fence(fence, true);
            }
        }
        self.log.push(MockEvent::Submit(submission.clone()));
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.log.complete_all_fences();
        self.log.push(MockEvent::WaitIdle);
        Ok(())
    }

    fn create_render_pass(&self, layout: &RenderPassLayout) -> Result<RenderPassHandle> {
        let handle = RenderPassHandle::from_raw(self.log.allocate());
        self.log.push(MockEvent::CreateRenderPass {
            handle,
            attachments: layout.attachments.len(),
            subpasses: layout.subpasses.len(),
            dependencies: layout.dependencies.len(),
        });
        Ok(handle)
    }

    fn destroy_render_pass(&self, render_pass: RenderPassHandle) {
        self.log.release(render_pass.raw());
        self.log.push(MockEvent::DestroyRenderPass(render_pass));
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        let handle = FramebufferHandle::from_raw(self.log.allocate());
        self.log.push(MockEvent::CreateFramebuffer { handle, desc: desc.clone() });
        Ok(handle)
    }

    fn destroy_framebuffer(&self, framebuffer: FramebufferHandle) {
        self.log.release(framebuffer.raw());
        self.log.push(MockEvent::DestroyFramebuffer(framebuffer));
    }

    fn allocate_command_buffer(&self) -> Result<CommandBufferHandle> {
        let handle = CommandBufferHandle::from_raw(self.log.allocate());
        self.log.push(MockEvent::AllocateCommandBuffer(handle));
        Ok(handle)
    }

    fn free_command_buffer(&self, command_buffer: CommandBufferHandle) {
        self.log.release(command_buffer.raw());
        self.log.push(MockEvent::FreeCommandBuffer(command_buffer));
    }

    fn record(&self, command_buffer: CommandBufferHandle, commands: &CommandSequence) -> Result<()> {
        let mut encoder = MockEncoder::default();
        commands.record(&mut encoder);
        self.log.push(MockEvent::Record {
            command_buffer,
            commands: encoder.commands,
        });
        Ok(())
    }
}
