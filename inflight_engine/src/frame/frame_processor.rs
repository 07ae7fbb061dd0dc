/// FrameProcessor - round-robin frame loop over a fixed pool of slots
///
/// Each call to `render` runs one frame on the current slot:
///
/// 1. Wait for the slot's fence, then reset it
/// 2. Acquire a swapchain image, signalling the slot's `available` semaphore
/// 3. Record and submit, waiting on `available` at colour-attachment output
///    and signalling `ready` and the fence
/// 4. Present, waiting on `ready`
///
/// If acquire or present reports the swapchain as invalidated, the frame is
/// dropped (never retried): the device is drained, framebuffers, extra
/// attachment images and the swapchain are destroyed and rebuilt from fresh
/// surface capabilities. Every other failure is returned to the caller. A
/// failure after the image was acquired (recorder, clear values, recording)
/// also drops the frame first, so the slot stays usable.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::graphics_device::{
    ClearValue, CommandBufferHandle, CommandSequence, Extent2D, FrameState, GraphicsDevice, PipelineStages,
    Submission,
};
use crate::renderer::{Framebuffer, FramebufferImage, RenderPass};
use crate::swapchain::{
    SurfaceProvider, Swapchain, SwapchainConfig, SwapchainImage, SwapchainSettings, SwapchainStatus,
};
use crate::{inflight_debug, inflight_error, inflight_info, inflight_warn};

const SOURCE: &str = "inflight::FrameProcessor";

/// What the recorder sees for one frame
pub struct FrameContext<'a> {
    pub slot: usize,
    pub image_index: u32,
    pub extent: Extent2D,
    pub framebuffer: &'a Framebuffer,
}

/// Records the draw commands of one frame
///
/// The processor has already pushed the framebuffer's begin-render-pass and
/// pushes the matching end after `record` returns.
pub trait FrameRecorder {
    fn record(&mut self, frame: &FrameContext<'_>, commands: &mut CommandSequence) -> Result<()>;

    /// Per-frame clear values, one per attachment (`None` keeps the default)
    fn clear_values(&mut self, _frame: &FrameContext<'_>) -> Option<Vec<Option<ClearValue>>> {
        None
    }
}

impl<F> FrameRecorder for F
where
    F: FnMut(&FrameContext<'_>, &mut CommandSequence) -> Result<()>,
{
    fn record(&mut self, frame: &FrameContext<'_>, commands: &mut CommandSequence) -> Result<()> {
        self(frame, commands)
    }
}

/// Provides the framebuffer images for each swapchain image
///
/// Images beyond the swapchain's own (depth buffers, MSAA targets) depend on
/// the swapchain extent, so they are created with every rebuild and released
/// before the swapchain is destroyed.
pub trait TargetImages: Send {
    /// Attachment images for `image`, in render-pass declaration order
    fn attachments(&mut self, image: &SwapchainImage) -> Result<Vec<FramebufferImage>>;

    /// Destroy everything created by `attachments`
    fn release(&mut self);
}

/// Render passes with a single colour attachment: the swapchain image itself
pub struct SwapchainTargets;

impl TargetImages for SwapchainTargets {
    fn attachments(&mut self, image: &SwapchainImage) -> Result<Vec<FramebufferImage>> {
        Ok(vec![FramebufferImage {
            view: image.view,
            format: image.format,
            extent: image.extent,
        }])
    }

    fn release(&mut self) {}
}

/// Result of one `render` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented { slot: usize, image_index: u32, suboptimal: bool },
    /// The swapchain was invalidated; targets were rebuilt and the frame discarded
    Dropped { slot: usize },
    /// The surface has no area (minimized); nothing was done
    Suspended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_presented: u64,
    pub frames_dropped: u64,
    pub rebuilds: u64,
    pub suboptimal_frames: u64,
}

struct FrameSlot {
    state: FrameState,
    command_buffer: CommandBufferHandle,
}

// Field order is drop order: framebuffers go before the swapchain
struct Targets {
    framebuffers: Vec<Framebuffer>,
    swapchain: Swapchain,
}

pub struct FrameProcessor {
    device: Arc<dyn GraphicsDevice>,
    surface: Box<dyn SurfaceProvider>,
    render_pass: Arc<RenderPass>,
    swapchain_config: SwapchainConfig,
    target_images: Box<dyn TargetImages>,
    slots: Vec<FrameSlot>,
    targets: Option<Targets>,
    index: usize,
    stats: FrameStats,
    /// A rebuild found a zero extent and is finished by a later `render`
    rebuild_pending: bool,
    shut_down: bool,
}

impl FrameProcessor {
    /// Create `config.frames_in_flight` slots and the initial swapchain targets
    ///
    /// A surface with no area at startup is not an error: targets are built
    /// by the first `render` call that finds a usable extent.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        surface: Box<dyn SurfaceProvider>,
        render_pass: Arc<RenderPass>,
        config: &Config,
        target_images: Box<dyn TargetImages>,
    ) -> Result<Self> {
        config.validate()?;

        let mut processor = Self {
            device,
            surface,
            render_pass,
            swapchain_config: config.swapchain.clone(),
            target_images,
            slots: Vec::with_capacity(config.frames_in_flight),
            targets: None,
            index: 0,
            stats: FrameStats::default(),
            rebuild_pending: false,
            shut_down: false,
        };

        // On any failure below, Drop tears down what was created so far
        for _ in 0..config.frames_in_flight {
            let state = FrameState::create(&*processor.device)?;
            let command_buffer = match processor.device.allocate_command_buffer() {
                Ok(command_buffer) => command_buffer,
                Err(e) => {
                    state.destroy(&*processor.device);
                    return Err(e);
                }
            };
            processor.slots.push(FrameSlot { state, command_buffer });
        }

        processor.build_targets()?;

        inflight_info!(SOURCE, "Frame processor ready with {} slot(s)", processor.slots.len());
        Ok(processor)
    }

    /// Run one frame on the current slot and advance to the next slot
    pub fn render(&mut self, recorder: &mut dyn FrameRecorder) -> Result<FrameOutcome> {
        if self.targets.is_none() {
            if !self.build_targets()? {
                return Ok(FrameOutcome::Suspended);
            }
            if self.rebuild_pending {
                self.rebuild_pending = false;
                self.stats.rebuilds += 1;
            }
        }

        let slot = self.index;
        let available = self.slots[slot].state.available();
        let ready = self.slots[slot].state.ready();
        let fence = self.slots[slot].state.fence();
        let command_buffer = self.slots[slot].command_buffer;

        // 1. The slot's previous submission must be finished before reuse
        self.slots[slot].state.wait_and_reset(&*self.device)?;

        // 2. Acquire
        let acquired = self.targets_mut()?.swapchain.acquire(Some(available), None)?;
        let (image_index, mut suboptimal) = match acquired {
            SwapchainStatus::Optimal(index) => (index, false),
            SwapchainStatus::Suboptimal(index) => (index, true),
            SwapchainStatus::Invalidated => {
                // Nothing will signal the fence we just reset; an empty
                // submission re-arms it so the slot's next wait completes
                self.device.submit(&Submission {
                    fence: Some(fence),
                    ..Default::default()
                })?;
                return self.drop_frame(slot, "acquire");
            }
        };

        // 3. Record and submit
        if let Err(e) = self.record_frame(slot, image_index, recorder) {
            return Err(self.abandon_frame(slot, e));
        }

        self.device.submit(&Submission {
            command_buffers: vec![command_buffer],
            wait: vec![(available, PipelineStages::COLOR_ATTACHMENT_OUTPUT)],
            signal: vec![ready],
            fence: Some(fence),
        })?;

        // 4. Present
        match self.targets_mut()?.swapchain.present(image_index, ready)? {
            SwapchainStatus::Optimal(()) => {}
            SwapchainStatus::Suboptimal(()) => suboptimal = true,
            SwapchainStatus::Invalidated => return self.drop_frame(slot, "present"),
        }

        self.advance();
        self.stats.frames_presented += 1;
        if suboptimal {
            self.stats.suboptimal_frames += 1;
        }

        Ok(FrameOutcome::Presented { slot, image_index, suboptimal })
    }

    /// Drain the device and destroy every object the processor owns
    pub fn shutdown(mut self) -> Result<()> {
        self.teardown()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot the next `render` call will use
    pub fn current_slot(&self) -> usize {
        self.index
    }

    /// Current swapchain, `None` while suspended
    pub fn swapchain(&self) -> Option<&Swapchain> {
        self.targets.as_ref().map(|targets| &targets.swapchain)
    }

    pub fn render_pass(&self) -> &Arc<RenderPass> {
        &self.render_pass
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.slots.len();
    }

    fn targets_ref(&self) -> Result<&Targets> {
        self.targets
            .as_ref()
            .ok_or_else(|| Error::BackendError("frame targets are missing".to_string()))
    }

    fn targets_mut(&mut self) -> Result<&mut Targets> {
        self.targets
            .as_mut()
            .ok_or_else(|| Error::BackendError("frame targets are missing".to_string()))
    }

    fn drop_frame(&mut self, slot: usize, during: &str) -> Result<FrameOutcome> {
        inflight_warn!(SOURCE, "Swapchain invalidated during {}, dropping frame on slot {}", during, slot);
        self.stats.frames_dropped += 1;
        self.advance();
        self.rebuild()?;
        Ok(FrameOutcome::Dropped { slot })
    }

    fn record_frame(&self, slot: usize, image_index: u32, recorder: &mut dyn FrameRecorder) -> Result<()> {
        let targets = self.targets_ref()?;
        let framebuffer = targets.framebuffers.get(image_index as usize).ok_or_else(|| {
            Error::BackendError(format!("no framebuffer for swapchain image {}", image_index))
        })?;

        let context = FrameContext {
            slot,
            image_index,
            extent: framebuffer.extent(),
            framebuffer,
        };

        let mut commands = CommandSequence::new();
        commands.push(match recorder.clear_values(&context) {
            Some(values) => framebuffer.begin_with_clear_values(&values)?,
            None => framebuffer.begin(),
        });
        recorder.record(&context, &mut commands)?;
        commands.push(Framebuffer::end());
        commands.validate()?;

        self.device.record(self.slots[slot].command_buffer, &commands)
    }

    /// Put `slot` back in a usable state after a failure between acquire and submit
    ///
    /// The acquired image is never presented, so the cycle counts as dropped
    /// and the targets are rebuilt. `error` is handed back to the caller.
    fn abandon_frame(&mut self, slot: usize, error: Error) -> Error {
        inflight_warn!(SOURCE, "Frame on slot {} failed before submit: {}", slot, error);

        // Consume `available` and re-arm the fence so the slot's next wait completes
        let recovery = self.device.submit(&Submission {
            wait: vec![(self.slots[slot].state.available(), PipelineStages::COLOR_ATTACHMENT_OUTPUT)],
            fence: Some(self.slots[slot].state.fence()),
            ..Default::default()
        });
        if let Err(e) = recovery {
            inflight_error!(SOURCE, "Could not release slot {} after a failed frame: {}", slot, e);
            return error;
        }

        self.stats.frames_dropped += 1;
        self.advance();
        if let Err(e) = self.rebuild() {
            inflight_error!(SOURCE, "Rebuild after a failed frame failed: {}", e);
        }
        error
    }

    fn rebuild(&mut self) -> Result<()> {
        self.device.wait_idle()?;
        self.destroy_targets();
        if self.build_targets()? {
            self.stats.rebuilds += 1;
        } else {
            self.rebuild_pending = true;
            inflight_debug!(SOURCE, "Rebuild deferred until the surface has a non-zero extent");
        }
        Ok(())
    }

    /// Create swapchain + framebuffers; `Ok(false)` if the surface has no area
    fn build_targets(&mut self) -> Result<bool> {
        let capabilities = self.surface.capabilities()?;
        let extent = SwapchainSettings::resolve_extent(&capabilities, self.surface.fallback_extent());
        if extent.is_zero() {
            return Ok(false);
        }

        let settings = SwapchainSettings::negotiate_with_extent(&self.swapchain_config, &capabilities, extent)?;
        let swapchain = Swapchain::with_settings(&mut *self.surface, settings)?;

        let mut framebuffers = Vec::with_capacity(swapchain.image_count());
        for image in swapchain.images() {
            let framebuffer = self
                .target_images
                .attachments(image)
                .and_then(|images| {
                    Framebuffer::new(self.device.clone(), self.render_pass.clone(), images, swapchain.extent())
                });
            match framebuffer {
                Ok(framebuffer) => framebuffers.push(framebuffer),
                Err(e) => {
                    drop(framebuffers);
                    self.target_images.release();
                    return Err(e);
                }
            }
        }

        inflight_debug!(
            SOURCE,
            "Built {} framebuffer(s) at {}x{}",
            framebuffers.len(),
            swapchain.extent().width,
            swapchain.extent().height
        );
        self.targets = Some(Targets { framebuffers, swapchain });
        Ok(true)
    }

    fn destroy_targets(&mut self) {
        if let Some(Targets { framebuffers, swapchain }) = self.targets.take() {
            drop(framebuffers);
            self.target_images.release();
            drop(swapchain);
        }
    }

    fn teardown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        let idle = self.device.wait_idle();
        self.destroy_targets();
        for slot in self.slots.drain(..) {
            self.device.free_command_buffer(slot.command_buffer);
            slot.state.destroy(&*self.device);
        }
        idle
    }
}

impl Drop for FrameProcessor {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            inflight_error!(SOURCE, "Device wait failed during teardown: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "frame_processor_tests.rs"]
mod tests;
