/// Per-slot synchronization unit
///
/// A frame slot owns two semaphores and one fence:
/// - `available`: signalled by acquire when the swapchain image can be written
/// - `ready`: signalled by the submission, waited on by present
/// - `fence`: signalled by the submission, waited on by the host before the
///   slot is reused

use crate::error::{Error, Result};
use crate::graphics_device::handles::{Fence, Semaphore};
use crate::graphics_device::GraphicsDevice;

#[derive(Debug, PartialEq, Eq)]
pub struct FrameState {
    available: Semaphore,
    ready: Semaphore,
    fence: Fence,
}

impl FrameState {
    /// Assemble a frame state from existing objects
    ///
    /// # Errors
    ///
    /// `Error::InvalidSyncState` if `available` and `ready` are the same semaphore.
    pub fn new(available: Semaphore, ready: Semaphore, fence: Fence) -> Result<Self> {
        if available == ready {
            return Err(Error::InvalidSyncState(format!(
                "available and ready must be distinct semaphores (both are {:?})",
                available
            )));
        }
        Ok(Self { available, ready, fence })
    }

    /// Create the semaphores and an already-signalled fence on `device`
    ///
    /// The fence starts signalled so the first wait on a fresh slot returns
    /// immediately.
    pub fn create(device: &dyn GraphicsDevice) -> Result<Self> {
        let available = device.create_semaphore()?;
        let ready = match device.create_semaphore() {
            Ok(ready) => ready,
            Err(e) => {
                device.destroy_semaphore(available);
                return Err(e);
            }
        };
        let fence = match device.create_fence(true) {
            Ok(fence) => fence,
            Err(e) => {
                device.destroy_semaphore(available);
                device.destroy_semaphore(ready);
                return Err(e);
            }
        };
        Self::new(available, ready, fence)
    }

    pub fn available(&self) -> Semaphore {
        self.available
    }

    pub fn ready(&self) -> Semaphore {
        self.ready
    }

    pub fn fence(&self) -> Fence {
        self.fence
    }

    /// Block until the slot's previous submission completed, then unsignal the fence
    pub fn wait_and_reset(&self, device: &dyn GraphicsDevice) -> Result<()> {
        device.wait_for_fence(self.fence, u64::MAX)?;
        device.reset_fence(self.fence)
    }

    /// Destroy all three objects. The caller guarantees the device is idle.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        device.destroy_fence(self.fence);
        device.destroy_semaphore(self.ready);
        device.destroy_semaphore(self.available);
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
