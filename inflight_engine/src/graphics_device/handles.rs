/// Opaque device object handles
///
/// Backends map these to native handles; the core only copies and compares them.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

define_handle!(
    /// GPU-GPU signal
    Semaphore
);
define_handle!(
    /// GPU-CPU signal
    Fence
);
define_handle!(ImageView);
define_handle!(RenderPassHandle);
define_handle!(FramebufferHandle);
define_handle!(CommandBufferHandle);
define_handle!(PipelineHandle);
