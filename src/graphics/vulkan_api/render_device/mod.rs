mod api;
mod device_queue;
mod gpu_device;
mod window_surface;

use ash::{extensions, vk};

pub use self::{
    device_queue::DeviceQueue,
    gpu_device::{FenceWait, FrameSubmission, GpuDevice, SwapchainParameters},
    window_surface::WindowSurface,
};

/// The Ash-backed implementation of [`GpuDevice`].
///
/// Instance, logical device, surface and queue creation all happen elsewhere.
/// The RenderDevice only borrows those handles to drive frames, so it never
/// destroys the logical device or the surface.
pub struct RenderDevice {
    graphics_queue: DeviceQueue,
    present_queue: DeviceQueue,
    swapchain_loader: extensions::khr::Swapchain,
    debug_utils: Option<extensions::ext::DebugUtils>,
    window_surface: WindowSurface,
    physical_device: vk::PhysicalDevice,
    logical_device: ash::Device,
}

impl RenderDevice {
    /// Wrap an existing logical device for frame presentation.
    ///
    /// # Params
    ///
    /// * `entry` / `instance` - used to load the surface and swapchain
    ///   extension functions
    /// * `logical_device` - must have been created with the swapchain
    ///   extension enabled
    /// * `surface` - the window surface targeted by the swapchain
    /// * `graphics_queue` / `present_queue` - may refer to the same queue
    /// * `enable_debug_names` - set when the instance has `VK_EXT_debug_utils`
    ///
    /// # Safety
    ///
    /// Every handle must stay valid for the lifetime of the RenderDevice and
    /// every object created through it must be destroyed before the logical
    /// device is.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn new(
        entry: &ash::Entry,
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        logical_device: ash::Device,
        surface: vk::SurfaceKHR,
        graphics_queue: DeviceQueue,
        present_queue: DeviceQueue,
        enable_debug_names: bool,
    ) -> Self {
        let swapchain_loader =
            extensions::khr::Swapchain::new(instance, &logical_device);
        let debug_utils = enable_debug_names
            .then(|| extensions::ext::DebugUtils::new(entry, instance));
        let window_surface = WindowSurface::new(entry, instance, surface);
        log::debug!(
            "Graphics queue {}:{}, present queue {}:{}",
            graphics_queue.family_index(),
            graphics_queue.queue_index(),
            present_queue.family_index(),
            present_queue.queue_index(),
        );
        Self {
            graphics_queue,
            present_queue,
            swapchain_loader,
            debug_utils,
            window_surface,
            physical_device,
            logical_device,
        }
    }

    /// The wrapped logical device. Recording callbacks use this to record
    /// commands into the frame's command buffer.
    pub fn logical_device(&self) -> &ash::Device {
        &self.logical_device
    }

    /// The surface targeted by the swapchain.
    pub fn window_surface(&self) -> &WindowSurface {
        &self.window_surface
    }
}
