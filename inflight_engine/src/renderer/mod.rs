/// Renderer module - render pass graph and framebuffers

pub mod render_pass;
pub mod framebuffer;

pub use render_pass::*;
pub use framebuffer::*;
