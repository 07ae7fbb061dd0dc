/// Surface capability report, as queried from the windowing system

use crate::graphics_device::{Extent2D, Format};

/// Presentation pacing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    /// Vsync; always supported by conforming surfaces
    Fifo,
    FifoRelaxed,
}

/// How the surface alpha channel is composited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeAlpha {
    Opaque,
    PreMultiplied,
    PostMultiplied,
    Inherit,
}

/// Transform applied by the presentation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceTransform {
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
    HorizontalMirror,
    Inherit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: Format,
    pub color_space: ColorSpace,
}

/// What a surface can do right now
///
/// Re-queried on every swapchain rebuild; window resizes change the extents.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    /// `None` when the surface lets the swapchain pick its extent
    pub current_extent: Option<Extent2D>,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
    pub current_transform: SurfaceTransform,
    pub supported_transforms: Vec<SurfaceTransform>,
    pub supported_composite_alpha: Vec<CompositeAlpha>,
    pub present_modes: Vec<PresentMode>,
    pub formats: Vec<SurfaceFormat>,
}

impl SurfaceCapabilities {
    pub fn supports_image_count(&self, count: u32) -> bool {
        count >= self.min_image_count && (self.max_image_count == 0 || count <= self.max_image_count)
    }
}
