/// VulkanDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Owns one resettable command pool on the context's queue family. Every
/// handle it returns is the raw Vulkan handle.

use ash::vk;
use inflight_engine::inflight::device::{
    CommandBufferHandle, CommandSequence, Fence, FramebufferDesc, FramebufferHandle,
    GraphicsDevice, RenderPassHandle, Semaphore, Submission,
};
use inflight_engine::inflight::render::RenderPassLayout;
use inflight_engine::inflight::{Error, Result};
use inflight_engine::inflight_debug;
use std::sync::{Arc, Mutex};

use crate::vulkan_command_encoder::VulkanCommandEncoder;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::{
    attachment_description, extent_to_vk, from_raw, image_layout_to_vk, stages_to_vk, subpass_dependency, to_raw, vk_error,
};

pub struct VulkanDevice {
    context: Arc<VulkanContext>,
    /// Command buffers are allocated from and freed to this pool under the lock
    command_pool: Mutex<vk::CommandPool>,
}

impl VulkanDevice {
    pub fn new(context: Arc<VulkanContext>) -> Result<Arc<Self>> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(context.queue_family);

        let command_pool = unsafe {
            context
                .device
                .create_command_pool(&pool_info, None)
                .map_err(|e| vk_error("create command pool", e))?
        };

        Ok(Arc::new(Self {
            context,
            command_pool: Mutex::new(command_pool),
        }))
    }

    pub fn context(&self) -> &Arc<VulkanContext> {
        &self.context
    }

    fn lock_pool(&self) -> Result<std::sync::MutexGuard<'_, vk::CommandPool>> {
        self.command_pool
            .lock()
            .map_err(|_| Error::BackendError("Vulkan command pool lock poisoned".to_string()))
    }
}

impl GraphicsDevice for VulkanDevice {
    // ===== SYNCHRONIZATION =====

    fn create_semaphore(&self) -> Result<Semaphore> {
        let semaphore = unsafe {
            self.context
                .device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| vk_error("create semaphore", e))?
        };
        Ok(Semaphore::from_raw(to_raw(semaphore)))
    }

    fn destroy_semaphore(&self, semaphore: Semaphore) {
        unsafe {
            self.context
                .device
                .destroy_semaphore(from_raw::<vk::Semaphore>(semaphore.raw()), None);
        }
    }

    fn create_fence(&self, signaled: bool) -> Result<Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let fence = unsafe {
            self.context
                .device
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)
                .map_err(|e| vk_error("create fence", e))?
        };
        Ok(Fence::from_raw(to_raw(fence)))
    }

    fn destroy_fence(&self, fence: Fence) {
        unsafe {
            self.context.device.destroy_fence(from_raw::<vk::Fence>(fence.raw()), None);
        }
    }

    fn wait_for_fence(&self, fence: Fence, timeout_ns: u64) -> Result<()> {
        unsafe {
            self.context
                .device
                .wait_for_fences(&[from_raw::<vk::Fence>(fence.raw())], true, timeout_ns)
                .map_err(|e| vk_error("wait for fence", e))
        }
    }

    fn reset_fence(&self, fence: Fence) -> Result<()> {
        unsafe {
            self.context
                .device
                .reset_fences(&[from_raw::<vk::Fence>(fence.raw())])
                .map_err(|e| vk_error("reset fence", e))
        }
    }

    fn submit(&self, submission: &Submission) -> Result<()> {
        let command_buffers: Vec<vk::CommandBuffer> = submission
            .command_buffers
            .iter()
            .map(|cb| from_raw(cb.raw()))
            .collect();
        let wait_semaphores: Vec<vk::Semaphore> = submission
            .wait
            .iter()
            .map(|(semaphore, _)| from_raw(semaphore.raw()))
            .collect();
        let wait_stages: Vec<vk::PipelineStageFlags> = submission
            .wait
            .iter()
            .map(|(_, stages)| stages_to_vk(*stages))
            .collect();
        let signal_semaphores: Vec<vk::Semaphore> = submission
            .signal
            .iter()
            .map(|semaphore| from_raw(semaphore.raw()))
            .collect();
        let fence = submission
            .fence
            .map(|fence| from_raw::<vk::Fence>(fence.raw()))
            .unwrap_or(vk::Fence::null());

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        self.context
            .with_queue(|queue| unsafe { self.context.device.queue_submit(queue, &[submit_info], fence) })?
            .map_err(|e| vk_error("submit to queue", e))
    }

    fn wait_idle(&self) -> Result<()> {
        // Hold the queue so nothing is submitted while waiting
        self.context
            .with_queue(|_| unsafe { self.context.device.device_wait_idle() })?
            .map_err(|e| vk_error("wait for device idle", e))
    }

    // ===== RESOURCES =====

    fn create_render_pass(&self, layout: &RenderPassLayout) -> Result<RenderPassHandle> {
        let attachments: Vec<vk::AttachmentDescription> =
            layout.attachments.iter().map(attachment_description).collect();

        // Reference arrays must outlive the subpass descriptions pointing into them
        let color_refs: Vec<Vec<vk::AttachmentReference>> = layout
            .subpasses
            .iter()
            .map(|subpass| {
                subpass
                    .colors()
                    .iter()
                    .map(|reference| vk::AttachmentReference {
                        attachment: reference.attachment.index(),
                        layout: image_layout_to_vk(reference.layout),
                    })
                    .collect()
            })
            .collect();
        let depth_refs: Vec<Option<vk::AttachmentReference>> = layout
            .subpasses
            .iter()
            .map(|subpass| {
                subpass.depth_stencil().map(|reference| vk::AttachmentReference {
                    attachment: reference.attachment.index(),
                    layout: image_layout_to_vk(reference.layout),
                })
            })
            .collect();

        let subpasses: Vec<vk::SubpassDescription> = color_refs
            .iter()
            .zip(depth_refs.iter())
            .map(|(colors, depth)| {
                let description = vk::SubpassDescription::default()
                    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                    .color_attachments(colors);
                match depth {
                    Some(depth) => description.depth_stencil_attachment(depth),
                    None => description,
                }
            })
            .collect();

        let dependencies: Vec<vk::SubpassDependency> =
            layout.dependencies.iter().map(subpass_dependency).collect();

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            self.context
                .device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| vk_error("create render pass", e))?
        };

        inflight_debug!(
            "inflight::vulkan",
            "Created render pass: {} attachment(s), {} subpass(es), {} dependency(ies)",
            attachments.len(),
            subpasses.len(),
            dependencies.len()
        );

        Ok(RenderPassHandle::from_raw(to_raw(render_pass)))
    }

    fn destroy_render_pass(&self, render_pass: RenderPassHandle) {
        unsafe {
            self.context
                .device
                .destroy_render_pass(from_raw::<vk::RenderPass>(render_pass.raw()), None);
        }
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        let attachments: Vec<vk::ImageView> = desc
            .attachments
            .iter()
            .map(|view| from_raw(view.raw()))
            .collect();
        let extent = extent_to_vk(desc.extent);

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(from_raw(desc.render_pass.raw()))
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            self.context
                .device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(|e| vk_error("create framebuffer", e))?
        };

        Ok(FramebufferHandle::from_raw(to_raw(framebuffer)))
    }

    fn destroy_framebuffer(&self, framebuffer: FramebufferHandle) {
        unsafe {
            self.context
                .device
                .destroy_framebuffer(from_raw::<vk::Framebuffer>(framebuffer.raw()), None);
        }
    }

    fn allocate_command_buffer(&self) -> Result<CommandBufferHandle> {
        let pool = self.lock_pool()?;
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(*pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = unsafe {
            self.context
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| vk_error("allocate command buffer", e))?
        };

        command_buffers
            .first()
            .map(|&cb| CommandBufferHandle::from_raw(to_raw(cb)))
            .ok_or_else(|| Error::BackendError("Command buffer allocation returned nothing".to_string()))
    }

    fn free_command_buffer(&self, command_buffer: CommandBufferHandle) {
        if let Ok(pool) = self.lock_pool() {
            unsafe {
                self.context
                    .device
                    .free_command_buffers(*pool, &[from_raw(command_buffer.raw())]);
            }
        }
    }

    // ===== RECORDING =====

    fn record(&self, command_buffer: CommandBufferHandle, commands: &CommandSequence) -> Result<()> {
        let cb: vk::CommandBuffer = from_raw(command_buffer.raw());
        let device = &self.context.device;

        // Buffers from one pool must not be recorded concurrently
        let _pool = self.lock_pool()?;

        unsafe {
            device
                .reset_command_buffer(cb, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_error("reset command buffer", e))?;

            let begin_info =
                vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(cb, &begin_info)
                .map_err(|e| vk_error("begin command buffer", e))?;
        }

        let mut encoder = VulkanCommandEncoder::new(device, cb);
        commands.record(&mut encoder);

        unsafe {
            device
                .end_command_buffer(cb)
                .map_err(|e| vk_error("end command buffer", e))
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            self.context.device.device_wait_idle().ok();
            if let Ok(pool) = self.command_pool.get_mut() {
                self.context.device.destroy_command_pool(*pool, None);
            }
        }
    }
}
