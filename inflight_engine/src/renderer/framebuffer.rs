/// Framebuffer - binds concrete image views to a render pass's attachments

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BeginRenderPass, ClearValue, Command, Extent2D, Format, FramebufferDesc, FramebufferHandle,
    GraphicsDevice, ImageView, Rect2D,
};
use crate::renderer::RenderPass;

/// One image bound to a framebuffer attachment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferImage {
    pub view: ImageView,
    pub format: Format,
    pub extent: Extent2D,
}

/// Render pass + image views + extent
///
/// Owns its device object; destroyed when dropped. One framebuffer exists
/// per swapchain image and is rebuilt with it.
pub struct Framebuffer {
    device: Arc<dyn GraphicsDevice>,
    render_pass: Arc<RenderPass>,
    images: Vec<FramebufferImage>,
    extent: Extent2D,
    handle: FramebufferHandle,
}

impl Framebuffer {
    /// Create a framebuffer for `render_pass`
    ///
    /// `images` must follow attachment declaration order.
    ///
    /// # Errors
    ///
    /// `Error::FramebufferMismatch` if the image count differs from the
    /// attachment count, an image format differs from its attachment format,
    /// an image is smaller than `extent`, or `extent` is zero.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        render_pass: Arc<RenderPass>,
        images: Vec<FramebufferImage>,
        extent: Extent2D,
    ) -> Result<Self> {
        let attachments = render_pass.attachments();

        if images.len() != attachments.len() {
            return Err(Error::FramebufferMismatch(format!(
                "render pass declares {} attachment(s), got {} image(s)",
                attachments.len(),
                images.len()
            )));
        }

        if extent.is_zero() {
            return Err(Error::FramebufferMismatch(format!(
                "framebuffer extent {}x{} is empty",
                extent.width, extent.height
            )));
        }

        for (i, (image, attachment)) in images.iter().zip(attachments).enumerate() {
            if image.format != attachment.format() {
                return Err(Error::FramebufferMismatch(format!(
                    "image {} has format {:?}, attachment expects {:?}",
                    i,
                    image.format,
                    attachment.format()
                )));
            }
            if !image.extent.contains(&extent) {
                return Err(Error::FramebufferMismatch(format!(
                    "image {} is {}x{}, smaller than the framebuffer extent {}x{}",
                    i, image.extent.width, image.extent.height, extent.width, extent.height
                )));
            }
        }

        let handle = device.create_framebuffer(&FramebufferDesc {
            render_pass: render_pass.handle(),
            attachments: images.iter().map(|image| image.view).collect(),
            extent,
        })?;

        Ok(Self {
            device,
            render_pass,
            images,
            extent,
            handle,
        })
    }

    /// Begin-render-pass command covering the whole framebuffer
    ///
    /// Clear values follow attachment declaration order; attachments without
    /// a clear policy get `None`.
    pub fn begin(&self) -> Command {
        Command::BeginRenderPass(self.begin_info())
    }

    fn begin_info(&self) -> BeginRenderPass {
        BeginRenderPass {
            render_pass: self.render_pass.handle(),
            framebuffer: self.handle,
            render_area: Rect2D {
                x: 0,
                y: 0,
                width: self.extent.width,
                height: self.extent.height,
            },
            clear_values: self
                .render_pass
                .attachments()
                .iter()
                .map(|attachment| attachment.clear_value())
                .collect(),
        }
    }

    /// Begin-render-pass command with per-frame clear values
    ///
    /// `clear_values` has one entry per attachment. `None` keeps the
    /// attachment's own clear value; an override is only accepted for an
    /// attachment that clears, and must match its format.
    pub fn begin_with_clear_values(&self, clear_values: &[Option<ClearValue>]) -> Result<Command> {
        let attachments = self.render_pass.attachments();
        if clear_values.len() != attachments.len() {
            return Err(Error::InvalidArgument(format!(
                "{} clear value(s) given for {} attachment(s)",
                clear_values.len(),
                attachments.len()
            )));
        }

        let mut begin = self.begin_info();
        for (i, (value, attachment)) in clear_values.iter().zip(attachments).enumerate() {
            let Some(value) = value else { continue };
            if attachment.clear_value().is_none() {
                return Err(Error::InvalidArgument(format!(
                    "attachment {} has no clear policy", i
                )));
            }
            if !value.matches_format(attachment.format()) {
                return Err(Error::InvalidArgument(format!(
                    "clear value {:?} does not fit attachment {} format {:?}",
                    value,
                    i,
                    attachment.format()
                )));
            }
            begin.clear_values[i] = Some(*value);
        }

        Ok(Command::BeginRenderPass(begin))
    }

    /// End-render-pass command (stateless)
    pub fn end() -> Command {
        Command::EndRenderPass
    }

    pub fn handle(&self) -> FramebufferHandle {
        self.handle
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn images(&self) -> &[FramebufferImage] {
        &self.images
    }

    pub fn render_pass(&self) -> &Arc<RenderPass> {
        &self.render_pass
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        self.device.destroy_framebuffer(self.handle);
    }
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
