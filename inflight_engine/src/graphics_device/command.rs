/// Closed set of recordable commands
///
/// Every command knows how to record itself into a `CommandEncoder`; the
/// backend only implements the encoder. A `CommandSequence` checks render-pass
/// bracketing before anything is handed to the device.

use crate::error::{Error, Result};
use crate::graphics_device::handles::{FramebufferHandle, PipelineHandle, RenderPassHandle};
use crate::graphics_device::types::{AccessFlags, ClearValue, PipelineStages};

/// Viewport rectangle with depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// Integer rectangle (render area, scissor)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Arguments of a begin-render-pass command
///
/// `clear_values` has one slot per attachment in declaration order; `None`
/// marks an attachment without a clear policy.
#[derive(Debug, Clone, PartialEq)]
pub struct BeginRenderPass {
    pub render_pass: RenderPassHandle,
    pub framebuffer: FramebufferHandle,
    pub render_area: Rect2D,
    pub clear_values: Vec<Option<ClearValue>>,
}

/// Global execution + memory barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barrier {
    pub src_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_stages: PipelineStages,
    pub dst_access: AccessFlags,
}

/// A single recordable command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginRenderPass(BeginRenderPass),
    BindPipeline { pipeline: PipelineHandle },
    SetViewport(Viewport),
    SetScissor(Rect2D),
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    EndRenderPass,
    PipelineBarrier(Barrier),
}

/// Backend sink for commands
///
/// Implemented once per backend (and by test mocks).
pub trait CommandEncoder {
    fn begin_render_pass(&mut self, begin: &BeginRenderPass);
    fn bind_pipeline(&mut self, pipeline: PipelineHandle);
    fn set_viewport(&mut self, viewport: &Viewport);
    fn set_scissor(&mut self, scissor: &Rect2D);
    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
    fn end_render_pass(&mut self);
    fn pipeline_barrier(&mut self, barrier: &Barrier);
}

impl Command {
    /// Record this command into `encoder`
    pub fn record(&self, encoder: &mut dyn CommandEncoder) {
        match self {
            Command::BeginRenderPass(begin) => encoder.begin_render_pass(begin),
            Command::BindPipeline { pipeline } => encoder.bind_pipeline(*pipeline),
            Command::SetViewport(viewport) => encoder.set_viewport(viewport),
            Command::SetScissor(scissor) => encoder.set_scissor(scissor),
            Command::Draw { vertex_count, instance_count, first_vertex, first_instance } => {
                encoder.draw(*vertex_count, *instance_count, *first_vertex, *first_instance)
            }
            Command::EndRenderPass => encoder.end_render_pass(),
            Command::PipelineBarrier(barrier) => encoder.pipeline_barrier(barrier),
        }
    }

    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Command::BeginRenderPass(_) => "BeginRenderPass",
            Command::BindPipeline { .. } => "BindPipeline",
            Command::SetViewport(_) => "SetViewport",
            Command::SetScissor(_) => "SetScissor",
            Command::Draw { .. } => "Draw",
            Command::EndRenderPass => "EndRenderPass",
            Command::PipelineBarrier(_) => "PipelineBarrier",
        }
    }
}

/// Ordered list of commands for one command buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandSequence {
    commands: Vec<Command>,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Check render-pass bracketing
    ///
    /// Begin/end must be balanced and never nested. Binds, dynamic state and
    /// draws only inside a pass; barriers only outside one.
    pub fn validate(&self) -> Result<()> {
        let mut inside = false;
        for (i, command) in self.commands.iter().enumerate() {
            match command {
                Command::BeginRenderPass(_) => {
                    if inside {
                        return Err(Error::InvalidCommandSequence(format!(
                            "command {}: BeginRenderPass inside an active render pass", i
                        )));
                    }
                    inside = true;
                }
                Command::EndRenderPass => {
                    if !inside {
                        return Err(Error::InvalidCommandSequence(format!(
                            "command {}: EndRenderPass without a matching BeginRenderPass", i
                        )));
                    }
                    inside = false;
                }
                Command::PipelineBarrier(_) => {
                    if inside {
                        return Err(Error::InvalidCommandSequence(format!(
                            "command {}: PipelineBarrier inside a render pass", i
                        )));
                    }
                }
                Command::BindPipeline { .. }
                | Command::SetViewport(_)
                | Command::SetScissor(_)
                | Command::Draw { .. } => {
                    if !inside {
                        return Err(Error::InvalidCommandSequence(format!(
                            "command {}: {} outside a render pass", i, command.name()
                        )));
                    }
                }
            }
        }
        if inside {
            return Err(Error::InvalidCommandSequence(
                "render pass was begun but never ended".to_string(),
            ));
        }
        Ok(())
    }

    /// Record every command, in order, into `encoder`
    pub fn record(&self, encoder: &mut dyn CommandEncoder) {
        for command in &self.commands {
            command.record(encoder);
        }
    }
}

impl Extend<Command> for CommandSequence {
    fn extend<I: IntoIterator<Item = Command>>(&mut self, iter: I) {
        self.commands.extend(iter);
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
