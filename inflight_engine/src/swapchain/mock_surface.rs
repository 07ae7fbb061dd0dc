/// Mock surface and swapchain for unit tests (no window or GPU required)
///
/// Acquire/present outcomes are scripted through `MockSurfaceControl`; when a
/// script is empty the call succeeds optimally. Images are handed out
/// round-robin. Semaphore signal/wait bookkeeping goes through the shared
/// `MockLog` so protocol mistakes surface as errors.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::mock_graphics_device::{MockEvent, MockLog};
use crate::graphics_device::{Extent2D, Fence, Format, ImageView, Semaphore};
use crate::swapchain::{
    ColorSpace, CompositeAlpha, PresentMode, SurfaceCapabilities, SurfaceFormat, SurfaceProvider,
    SurfaceTransform, SwapchainBackend, SwapchainImage, SwapchainSettings, SwapchainStatus,
};

/// Scripted result of one acquire or present call
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Optimal,
    Suboptimal,
    Invalidated,
    Fail(Error),
}

/// Knobs shared between a test and its mock surface
pub struct MockSurfaceControl {
    pub capabilities: Mutex<SurfaceCapabilities>,
    pub fallback_extent: Mutex<Extent2D>,
    acquire_script: Mutex<VecDeque<MockOutcome>>,
    present_script: Mutex<VecDeque<MockOutcome>>,
    swapchains_created: AtomicUsize,
}

impl MockSurfaceControl {
    pub fn script_acquire(&self, outcome: MockOutcome) {
        self.acquire_script.lock().unwrap().push_back(outcome);
    }

    pub fn script_present(&self, outcome: MockOutcome) {
        self.present_script.lock().unwrap().push_back(outcome);
    }

    pub fn swapchains_created(&self) -> usize {
        self.swapchains_created.load(Ordering::Relaxed)
    }

    pub fn set_current_extent(&self, extent: Option<Extent2D>) {
        self.capabilities.lock().unwrap().current_extent = extent;
    }

    fn next_acquire(&self) -> MockOutcome {
        self.acquire_script.lock().unwrap().pop_front().unwrap_or(MockOutcome::Optimal)
    }

    fn next_present(&self) -> MockOutcome {
        self.present_script.lock().unwrap().pop_front().unwrap_or(MockOutcome::Optimal)
    }
}

/// Capabilities of a typical desktop surface
pub fn default_capabilities(extent: Extent2D) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: 2,
        max_image_count: 8,
        current_extent: Some(extent),
        min_image_extent: Extent2D::new(1, 1),
        max_image_extent: Extent2D::new(16384, 16384),
        current_transform: SurfaceTransform::Identity,
        supported_transforms: vec![SurfaceTransform::Identity],
        supported_composite_alpha: vec![CompositeAlpha::Opaque],
        present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
        formats: vec![SurfaceFormat { format: Format::B8G8R8A8_SRGB, color_space: ColorSpace::SrgbNonlinear }],
    }
}

pub struct MockSurface {
    log: Arc<MockLog>,
    control: Arc<MockSurfaceControl>,
}

impl MockSurface {
    pub fn new(log: Arc<MockLog>, extent: Extent2D) -> (Self, Arc<MockSurfaceControl>) {
        let control = Arc::new(MockSurfaceControl {
            capabilities: Mutex::new(default_capabilities(extent)),
            fallback_extent: Mutex::new(extent),
            acquire_script: Mutex::new(VecDeque::new()),
            present_script: Mutex::new(VecDeque::new()),
            swapchains_created: AtomicUsize::new(0),
        });
        (Self { log, control: control.clone() }, control)
    }
}

impl SurfaceProvider for MockSurface {
    fn capabilities(&self) -> Result<SurfaceCapabilities> {
        Ok(self.control.capabilities.lock().unwrap().clone())
    }

    fn fallback_extent(&self) -> Extent2D {
        *self.control.fallback_extent.lock().unwrap()
    }

    fn create_swapchain(&mut self, settings: &SwapchainSettings) -> Result<Box<dyn SwapchainBackend>> {
        let images = (0..settings.image_count)
            .map(|index| SwapchainImage {
                index,
                view: ImageView::from_raw(self.log.allocate()),
                format: settings.format.format,
                extent: settings.extent,
            })
            .collect();
        self.control.swapchains_created.fetch_add(1, Ordering::Relaxed);
        self.log.push(MockEvent::CreateSwapchain {
            image_count: settings.image_count,
            width: settings.extent.width,
            height: settings.extent.height,
        });
        Ok(Box::new(MockSwapchain {
            log: self.log.clone(),
            control: self.control.clone(),
            images,
            next_image: 0,
        }))
    }
}

pub struct MockSwapchain {
    log: Arc<MockLog>,
    control: Arc<MockSurfaceControl>,
    images: Vec<SwapchainImage>,
    next_image: u32,
}

impl SwapchainBackend for MockSwapchain {
    fn images(&self) -> &[SwapchainImage] {
        &self.images
    }

    fn acquire_next_image(
        &mut self,
        _timeout_ns: u64,
        signal_semaphore: Option<Semaphore>,
        _signal_fence: Option<Fence>,
    ) -> Result<SwapchainStatus<u32>> {
        let outcome = self.control.next_acquire();
        let index = self.next_image;
        let status = match outcome {
            MockOutcome::Fail(error) => return Err(error),
            MockOutcome::Invalidated => {
                self.log.push(MockEvent::Acquire { signal: signal_semaphore, image_index: None });
                return Ok(SwapchainStatus::Invalidated);
            }
            MockOutcome::Optimal => SwapchainStatus::Optimal(index),
            MockOutcome::Suboptimal => SwapchainStatus::Suboptimal(index),
        };
        if let Some(semaphore) = signal_semaphore {
            self.log.signal_semaphore(semaphore)?;
        }
        self.next_image = (self.next_image + 1) % self.images.len() as u32;
        self.log.push(MockEvent::Acquire { signal: signal_semaphore, image_index: Some(index) });
        Ok(status)
    }

    fn queue_present(&mut self, image_index: u32, wait_semaphore: Semaphore) -> Result<SwapchainStatus<()>> {
        let outcome = self.control.next_present();
        if let MockOutcome::Fail(error) = outcome {
            return Err(error);
        }
        self.log.consume_semaphore(wait_semaphore)?;
        self.log.push(MockEvent::Present { image_index, wait: wait_semaphore });
        Ok(match outcome {
            MockOutcome::Suboptimal => SwapchainStatus::Suboptimal(()),
            MockOutcome::Invalidated => SwapchainStatus::Invalidated,
            _ => SwapchainStatus::Optimal(()),
        })
    }
}

impl Drop for MockSwapchain {
    fn drop(&mut self) {
        for image in &self.images {
            self.log.release(image.view.raw());
        }
        self.log.push(MockEvent::DestroySwapchain);
    }
}
