/// Frame module - frames-in-flight loop over the swapchain

pub mod frame_processor;

pub use frame_processor::*;
