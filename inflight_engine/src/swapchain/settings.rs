/// Swapchain configuration negotiation
///
/// Requested settings are checked against the surface's reported
/// capabilities. Anything unsupported is an error; only the extent is ever
/// adjusted (clamped into the surface's allowed range when the surface leaves
/// the choice to the swapchain).

use crate::error::{Error, Result};
use crate::graphics_device::{Extent2D, Format};
use crate::swapchain::capabilities::{
    CompositeAlpha, PresentMode, SurfaceCapabilities, SurfaceFormat, SurfaceTransform,
};

/// What the application asks for
#[derive(Debug, Clone, PartialEq)]
pub struct SwapchainConfig {
    /// Exact number of images requested
    pub image_count: u32,
    pub present_mode: PresentMode,
    pub composite_alpha: CompositeAlpha,
    /// `None` uses the surface's current transform
    pub transform: Option<SurfaceTransform>,
    /// Formats in priority order; empty accepts the surface's first format
    pub preferred_formats: Vec<Format>,
}

impl Default for SwapchainConfig {
    fn default() -> Self {
        Self {
            image_count: 3,
            present_mode: PresentMode::Fifo,
            composite_alpha: CompositeAlpha::Opaque,
            transform: None,
            preferred_formats: vec![Format::B8G8R8A8_SRGB, Format::R8G8B8A8_SRGB],
        }
    }
}

/// Negotiated swapchain parameters, all guaranteed supported by the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainSettings {
    pub image_count: u32,
    pub format: SurfaceFormat,
    pub extent: Extent2D,
    pub present_mode: PresentMode,
    pub transform: SurfaceTransform,
    pub composite_alpha: CompositeAlpha,
}

impl SwapchainSettings {
    /// Extent the swapchain would get from `capabilities`
    ///
    /// The surface's current extent when it reports one, otherwise
    /// `fallback` (usually the window's inner size) clamped to the allowed range.
    pub fn resolve_extent(capabilities: &SurfaceCapabilities, fallback: Extent2D) -> Extent2D {
        match capabilities.current_extent {
            Some(extent) => extent,
            None => fallback.clamp(capabilities.min_image_extent, capabilities.max_image_extent),
        }
    }

    /// Validate `config` against `capabilities`
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedSurface` naming the first unsupported parameter, or
    /// if the resolved extent is empty.
    pub fn negotiate(
        config: &SwapchainConfig,
        capabilities: &SurfaceCapabilities,
        fallback_extent: Extent2D,
    ) -> Result<Self> {
        let extent = Self::resolve_extent(capabilities, fallback_extent);
        if extent.is_zero() {
            return Err(Error::UnsupportedSurface(format!(
                "surface extent {}x{} is empty",
                extent.width, extent.height
            )));
        }
        Self::negotiate_with_extent(config, capabilities, extent)
    }

    /// Same as `negotiate`, with an extent the caller already resolved and
    /// checked to be non-zero
    pub fn negotiate_with_extent(
        config: &SwapchainConfig,
        capabilities: &SurfaceCapabilities,
        extent: Extent2D,
    ) -> Result<Self> {
        if !capabilities.supports_image_count(config.image_count) {
            let max = if capabilities.max_image_count == 0 {
                "unbounded".to_string()
            } else {
                capabilities.max_image_count.to_string()
            };
            return Err(Error::UnsupportedSurface(format!(
                "image count {} outside supported range {}..={}",
                config.image_count, capabilities.min_image_count, max
            )));
        }

        let transform = config.transform.unwrap_or(capabilities.current_transform);
        if !capabilities.supported_transforms.contains(&transform) {
            return Err(Error::UnsupportedSurface(format!(
                "transform {:?} not supported (supported: {:?})",
                transform, capabilities.supported_transforms
            )));
        }

        if !capabilities.supported_composite_alpha.contains(&config.composite_alpha) {
            return Err(Error::UnsupportedSurface(format!(
                "composite alpha {:?} not supported (supported: {:?})",
                config.composite_alpha, capabilities.supported_composite_alpha
            )));
        }

        if !capabilities.present_modes.contains(&config.present_mode) {
            return Err(Error::UnsupportedSurface(format!(
                "present mode {:?} not supported (supported: {:?})",
                config.present_mode, capabilities.present_modes
            )));
        }

        let format = Self::choose_format(config, capabilities)?;

        Ok(Self {
            image_count: config.image_count,
            format,
            extent,
            present_mode: config.present_mode,
            transform,
            composite_alpha: config.composite_alpha,
        })
    }

    fn choose_format(config: &SwapchainConfig, capabilities: &SurfaceCapabilities) -> Result<SurfaceFormat> {
        if config.preferred_formats.is_empty() {
            return capabilities.formats.first().copied().ok_or_else(|| {
                Error::UnsupportedSurface("surface reports no formats".to_string())
            });
        }

        config
            .preferred_formats
            .iter()
            .find_map(|wanted| capabilities.formats.iter().find(|f| f.format == *wanted))
            .copied()
            .ok_or_else(|| {
                Error::UnsupportedSurface(format!(
                    "none of the preferred formats {:?} is supported (supported: {:?})",
                    config.preferred_formats,
                    capabilities.formats.iter().map(|f| f.format).collect::<Vec<_>>()
                ))
            })
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
