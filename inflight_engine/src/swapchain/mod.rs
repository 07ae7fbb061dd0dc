/// Swapchain module - surface capabilities, negotiation, acquire/present

pub mod capabilities;
pub mod settings;
pub mod swapchain;

pub use capabilities::*;
pub use settings::*;
pub use swapchain::*;

// Mock surface/swapchain for tests (no window required)
#[cfg(test)]
pub mod mock_surface;
