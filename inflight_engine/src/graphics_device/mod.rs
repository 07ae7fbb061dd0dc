/// Graphics device module - device seam, handles, value types, commands, sync

// Module declarations
pub mod graphics_device;
pub mod handles;
pub mod types;
pub mod command;
pub mod sync;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use handles::*;
pub use types::*;
pub use command::*;
pub use sync::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
