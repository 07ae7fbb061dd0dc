/// VulkanContext - instance, surface, device and queue shared by every Vulkan object
///
/// Created once per window. Devices, surfaces, swapchains and depth targets
/// hold an `Arc<VulkanContext>`, so the context is destroyed only after the
/// last of them.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use inflight_engine::inflight::{Config, Error, Result};
use inflight_engine::{inflight_error, inflight_info};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use winit::window::Window;

const SOURCE: &str = "inflight::vulkan";

pub struct VulkanContext {
    /// Vulkan entry (keeps the loader library alive)
    _entry: ash::Entry,
    pub(crate) instance: ash::Instance,

    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) surface: vk::SurfaceKHR,

    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Single graphics + present queue; every queue operation holds the lock
    pub(crate) queue: Mutex<vk::Queue>,
    pub(crate) queue_family: u32,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Debug utils loader and messenger (validation builds only)
    debug: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    /// The surface must not outlive its window
    window: Arc<Window>,
}

impl VulkanContext {
    /// Create the instance, surface, device and allocator for `window`
    ///
    /// Validation layers are enabled when `config.enable_validation` is set
    /// and the crate is built with the `vulkan-validation` feature.
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Arc<Self>> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                inflight_error!(SOURCE, "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let validation = cfg!(feature = "vulkan-validation") && config.enable_validation;

            // Application Info
            let app_name = std::ffi::CString::new(config.app_name.as_str())
                .map_err(|e| Error::InvalidArgument(format!("Application name: {}", e)))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Inflight")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            // Required extensions
            let display_handle = window.display_handle().map_err(|e| {
                inflight_error!(SOURCE, "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    inflight_error!(SOURCE, "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                inflight_error!(SOURCE, "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            let debug = if validation {
                match create_debug_messenger(&entry, &instance, config) {
                    Ok(debug) => debug,
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            // From here on, partially built state is torn down by `Partial`
            let mut partial = Partial {
                instance: instance.clone(),
                debug: debug.clone(),
                surface: None,
                device: None,
                armed: true,
            };

            // Surface
            let window_handle = window.window_handle().map_err(|e| {
                inflight_error!(SOURCE, "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                inflight_error!(SOURCE, "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;
            partial.surface = Some((surface_loader.clone(), surface));

            // Physical device with one family that can both draw and present
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                inflight_error!(SOURCE, "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

            let (physical_device, queue_family) = physical_devices
                .iter()
                .find_map(|&physical_device| {
                    instance
                        .get_physical_device_queue_family_properties(physical_device)
                        .iter()
                        .enumerate()
                        .find(|(index, family)| {
                            family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                                && surface_loader
                                    .get_physical_device_surface_support(physical_device, *index as u32, surface)
                                    .unwrap_or(false)
                        })
                        .map(|(index, _)| (physical_device, index as u32))
                })
                .ok_or_else(|| {
                    inflight_error!(SOURCE, "No GPU with a graphics queue that can present to the window");
                    Error::InitializationFailed(
                        "No GPU with a graphics queue that can present to the window".to_string(),
                    )
                })?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string());

            // Logical device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];
            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    inflight_error!(SOURCE, "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;
            partial.device = Some(device.clone());

            let queue = device.get_device_queue(queue_family, 0);

            // GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                inflight_error!(SOURCE, "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            partial.armed = false;

            inflight_info!(SOURCE, "Vulkan device ready: {} (queue family {})", device_name, queue_family);

            Ok(Arc::new(Self {
                _entry: entry,
                instance,
                surface_loader,
                surface,
                physical_device,
                device,
                queue: Mutex::new(queue),
                queue_family,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                debug,
                window,
            }))
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Run `f` with exclusive access to the queue
    pub(crate) fn with_queue<T>(&self, f: impl FnOnce(vk::Queue) -> T) -> Result<T> {
        let queue = self
            .queue
            .lock()
            .map_err(|_| Error::BackendError("Vulkan queue lock poisoned".to_string()))?;
        Ok(f(*queue))
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.device.device_wait_idle().ok();

            // 1. Drop allocator: free VkDeviceMemory pages BEFORE destroying device
            ManuallyDrop::drop(&mut self.allocator);

            // 2. Destroy device, then the surface
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            // 3. Destroy debug messenger BEFORE the instance
            if let Some((debug_utils, messenger)) = self.debug.take() {
                #[cfg(feature = "vulkan-validation")]
                crate::vulkan_debug::cleanup_debug_config();
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 4. Destroy instance
            self.instance.destroy_instance(None);
        }
    }
}

/// Undoes a partially completed `VulkanContext::new` on early return
struct Partial {
    instance: ash::Instance,
    debug: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface: Option<(ash::khr::surface::Instance, vk::SurfaceKHR)>,
    device: Option<ash::Device>,
    armed: bool,
}

impl Drop for Partial {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        unsafe {
            if let Some(device) = &self.device {
                device.destroy_device(None);
            }
            if let Some((loader, surface)) = &self.surface {
                loader.destroy_surface(*surface, None);
            }
            if let Some((debug_utils, messenger)) = &self.debug {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(feature = "vulkan-validation")]
unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    config: &Config,
) -> Result<Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>> {
    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

    crate::vulkan_debug::init_debug_config(config.debug_severity);

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(crate::vulkan_debug::severity_flags(config.debug_severity))
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(crate::vulkan_debug::vulkan_debug_callback));

    let messenger = debug_utils
        .create_debug_utils_messenger(&debug_info, None)
        .map_err(|e| {
            inflight_error!(SOURCE, "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })?;

    Ok(Some((debug_utils, messenger)))
}

#[cfg(not(feature = "vulkan-validation"))]
unsafe fn create_debug_messenger(
    _entry: &ash::Entry,
    _instance: &ash::Instance,
    _config: &Config,
) -> Result<Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>> {
    Ok(None)
}
