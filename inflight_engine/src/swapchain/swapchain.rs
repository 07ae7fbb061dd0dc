/// Swapchain - presentable image set with acquire/present
///
/// `acquire` and `present` report three outcomes: the call worked, it worked
/// but the swapchain no longer matches the surface exactly (suboptimal, still
/// a success), or the swapchain can no longer be used (invalidated). Only the
/// last one requires a rebuild, and it is a status, not an error. Backends
/// never try to recover on their own.

use crate::error::{Error, Result};
use crate::graphics_device::{Extent2D, Fence, Format, ImageView, Semaphore};
use crate::swapchain::capabilities::SurfaceCapabilities;
use crate::swapchain::settings::{SwapchainConfig, SwapchainSettings};

/// Outcome of a swapchain operation that can be invalidated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainStatus<T> {
    Optimal(T),
    /// Succeeded; the swapchain should be rebuilt at some point
    Suboptimal(T),
    /// The swapchain must be rebuilt before it can be used again
    Invalidated,
}

impl<T> SwapchainStatus<T> {
    pub fn is_invalidated(&self) -> bool {
        matches!(self, SwapchainStatus::Invalidated)
    }

    pub fn is_suboptimal(&self) -> bool {
        matches!(self, SwapchainStatus::Suboptimal(_))
    }

    /// The success value, `None` when invalidated
    pub fn value(self) -> Option<T> {
        match self {
            SwapchainStatus::Optimal(v) | SwapchainStatus::Suboptimal(v) => Some(v),
            SwapchainStatus::Invalidated => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SwapchainStatus<U> {
        match self {
            SwapchainStatus::Optimal(v) => SwapchainStatus::Optimal(f(v)),
            SwapchainStatus::Suboptimal(v) => SwapchainStatus::Suboptimal(f(v)),
            SwapchainStatus::Invalidated => SwapchainStatus::Invalidated,
        }
    }
}

/// One presentable image with its view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainImage {
    pub index: u32,
    pub view: ImageView,
    pub format: Format,
    pub extent: Extent2D,
}

/// Native swapchain object
///
/// Dropping the backend destroys the image views and the native swapchain.
pub trait SwapchainBackend: Send {
    fn images(&self) -> &[SwapchainImage];

    /// Acquire the next image, signalling `signal_semaphore` and/or `signal_fence`
    fn acquire_next_image(
        &mut self,
        timeout_ns: u64,
        signal_semaphore: Option<Semaphore>,
        signal_fence: Option<Fence>,
    ) -> Result<SwapchainStatus<u32>>;

    /// Queue `image_index` for presentation once `wait_semaphore` is signalled
    fn queue_present(&mut self, image_index: u32, wait_semaphore: Semaphore) -> Result<SwapchainStatus<()>>;
}

/// Window surface able to (re)create swapchains
pub trait SurfaceProvider: Send {
    fn capabilities(&self) -> Result<SurfaceCapabilities>;

    /// Extent to use when the surface lets the swapchain choose (window inner size)
    fn fallback_extent(&self) -> Extent2D;

    fn create_swapchain(&mut self, settings: &SwapchainSettings) -> Result<Box<dyn SwapchainBackend>>;
}

/// Negotiated swapchain plus its images
pub struct Swapchain {
    settings: SwapchainSettings,
    backend: Box<dyn SwapchainBackend>,
}

impl Swapchain {
    /// Query `surface`, negotiate `config` and create the swapchain
    pub fn new(surface: &mut dyn SurfaceProvider, config: &SwapchainConfig) -> Result<Self> {
        let capabilities = surface.capabilities()?;
        let settings = SwapchainSettings::negotiate(config, &capabilities, surface.fallback_extent())?;
        Self::with_settings(surface, settings)
    }

    /// Create a swapchain from already negotiated settings
    pub fn with_settings(surface: &mut dyn SurfaceProvider, settings: SwapchainSettings) -> Result<Self> {
        let backend = surface.create_swapchain(&settings)?;
        if backend.images().is_empty() {
            return Err(Error::BackendError("swapchain was created without images".to_string()));
        }
        crate::inflight_info!(
            "inflight::Swapchain",
            "Created swapchain: {} image(s), {:?}, {}x{}, {:?}",
            backend.images().len(),
            settings.format.format,
            settings.extent.width,
            settings.extent.height,
            settings.present_mode
        );
        Ok(Self { settings, backend })
    }

    /// Acquire the next presentable image, blocking without a timeout
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` if neither a semaphore nor a fence is given.
    /// Device failures propagate; invalidation is returned as a status.
    pub fn acquire(
        &mut self,
        signal_semaphore: Option<Semaphore>,
        signal_fence: Option<Fence>,
    ) -> Result<SwapchainStatus<u32>> {
        if signal_semaphore.is_none() && signal_fence.is_none() {
            return Err(Error::InvalidArgument(
                "acquire needs a semaphore or a fence to signal".to_string(),
            ));
        }

        let status = self.backend.acquire_next_image(u64::MAX, signal_semaphore, signal_fence)?;
        if let Some(index) = status.value() {
            if index as usize >= self.backend.images().len() {
                return Err(Error::BackendError(format!(
                    "acquire returned image index {} but the swapchain has {} image(s)",
                    index,
                    self.backend.images().len()
                )));
            }
        }
        Ok(status)
    }

    /// Present `image_index` after `wait_semaphore` is signalled
    pub fn present(&mut self, image_index: u32, wait_semaphore: Semaphore) -> Result<SwapchainStatus<()>> {
        if image_index as usize >= self.backend.images().len() {
            return Err(Error::InvalidArgument(format!(
                "image index {} out of range (count: {})",
                image_index,
                self.backend.images().len()
            )));
        }
        self.backend.queue_present(image_index, wait_semaphore)
    }

    pub fn images(&self) -> &[SwapchainImage] {
        self.backend.images()
    }

    pub fn image_count(&self) -> usize {
        self.backend.images().len()
    }

    pub fn settings(&self) -> &SwapchainSettings {
        &self.settings
    }

    pub fn extent(&self) -> Extent2D {
        self.settings.extent
    }

    pub fn format(&self) -> Format {
        self.settings.format.format
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
