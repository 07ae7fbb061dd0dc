/// Engine configuration
///
/// Plain values with a `Default`; nothing is read from the environment or files.

use crate::error::{Error, Result};
use crate::swapchain::SwapchainConfig;

/// Which validation messages the backend forwards to the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Application name reported to the driver
    pub app_name: String,

    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),

    /// Enable backend validation layers (also requires the backend's
    /// validation feature at compile time)
    pub enable_validation: bool,

    pub debug_severity: DebugSeverity,

    /// Number of frame slots the CPU may record ahead of the GPU
    pub frames_in_flight: usize,

    pub swapchain: SwapchainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Inflight Application".to_string(),
            app_version: (1, 0, 0),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            frames_in_flight: 2,
            swapchain: SwapchainConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InvalidArgument("frames_in_flight must be at least 1".to_string()));
        }
        if self.swapchain.image_count == 0 {
            return Err(Error::InvalidArgument("swapchain image_count must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
