//! Error types for the inflight engine
//!
//! Construction errors (attachments, render passes, framebuffers, sync
//! units, swapchain negotiation) and fatal device errors share one enum.
//! A swapchain that has become unusable is NOT an error: it is reported as
//! `SwapchainStatus::Invalidated` by acquire/present.

use std::fmt;

/// Result type for inflight engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Inflight engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Attachment description violates a layout or clear-policy rule
    InvalidAttachment(String),

    /// Render pass graph failed validation
    InvalidRenderPass(String),

    /// Framebuffer images do not match the render pass attachments
    FramebufferMismatch(String),

    /// Synchronization objects violate an ownership rule
    InvalidSyncState(String),

    /// Invalid argument passed to an operation
    InvalidArgument(String),

    /// Command sequence is not correctly bracketed
    InvalidCommandSequence(String),

    /// Surface cannot satisfy the requested swapchain configuration
    UnsupportedSurface(String),

    /// Initialization failed (instance, device, subsystems)
    InitializationFailed(String),

    /// Backend-specific error (Vulkan, mock, etc.)
    BackendError(String),

    /// Device was lost
    DeviceLost,

    /// Out of host or device memory
    OutOfMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAttachment(msg) => write!(f, "Invalid attachment: {}", msg),
            Error::InvalidRenderPass(msg) => write!(f, "Invalid render pass: {}", msg),
            Error::FramebufferMismatch(msg) => write!(f, "Framebuffer mismatch: {}", msg),
            Error::InvalidSyncState(msg) => write!(f, "Invalid sync state: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidCommandSequence(msg) => write!(f, "Invalid command sequence: {}", msg),
            Error::UnsupportedSurface(msg) => write!(f, "Unsupported surface: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::DeviceLost => write!(f, "Device lost"),
            Error::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for errors raised while building a value (as opposed to device failures)
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidAttachment(_)
                | Error::InvalidRenderPass(_)
                | Error::FramebufferMismatch(_)
                | Error::InvalidSyncState(_)
                | Error::InvalidArgument(_)
                | Error::InvalidCommandSequence(_)
                | Error::UnsupportedSurface(_)
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
