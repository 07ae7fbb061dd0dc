/// CommandEncoder - records inflight commands into a Vulkan command buffer

use ash::vk;
use inflight_engine::inflight::device::{
    BeginRenderPass, Barrier, CommandEncoder, PipelineHandle, Rect2D, Viewport,
};

use crate::vulkan_format::{access_to_vk, clear_value_to_vk, from_raw, stages_to_vk};

/// Encoder borrowing a command buffer that is already in the recording state
pub(crate) struct VulkanCommandEncoder<'a> {
    device: &'a ash::Device,
    command_buffer: vk::CommandBuffer,
}

impl<'a> VulkanCommandEncoder<'a> {
    pub(crate) fn new(device: &'a ash::Device, command_buffer: vk::CommandBuffer) -> Self {
        Self { device, command_buffer }
    }
}

fn rect_to_vk(rect: &Rect2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D { width: rect.width, height: rect.height },
    }
}

impl CommandEncoder for VulkanCommandEncoder<'_> {
    fn begin_render_pass(&mut self, begin: &BeginRenderPass) {
        let clear_values: Vec<vk::ClearValue> = begin
            .clear_values
            .iter()
            .map(|value| clear_value_to_vk(*value))
            .collect();

        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(from_raw(begin.render_pass.raw()))
            .framebuffer(from_raw(begin.framebuffer.raw()))
            .render_area(rect_to_vk(&begin.render_area))
            .clear_values(&clear_values);

        unsafe {
            self.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        unsafe {
            self.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                from_raw(pipeline.raw()),
            );
        }
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };

        unsafe {
            self.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
    }

    fn set_scissor(&mut self, scissor: &Rect2D) {
        unsafe {
            self.device.cmd_set_scissor(self.command_buffer, 0, &[rect_to_vk(scissor)]);
        }
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe {
            self.device.cmd_draw(
                self.command_buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            );
        }
    }

    fn end_render_pass(&mut self) {
        unsafe {
            self.device.cmd_end_render_pass(self.command_buffer);
        }
    }

    fn pipeline_barrier(&mut self, barrier: &Barrier) {
        let memory_barrier = vk::MemoryBarrier::default()
            .src_access_mask(access_to_vk(barrier.src_access))
            .dst_access_mask(access_to_vk(barrier.dst_access));

        unsafe {
            self.device.cmd_pipeline_barrier(
                self.command_buffer,
                stages_to_vk(barrier.src_stages),
                stages_to_vk(barrier.dst_stages),
                vk::DependencyFlags::empty(),
                &[memory_barrier],
                &[],
                &[],
            );
        }
    }
}
