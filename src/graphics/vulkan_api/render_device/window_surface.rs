use {
    crate::graphics::vulkan_api::VulkanError,
    ash::{extensions, vk},
};

/// The surface targeted by the swapchain and the Ash extension loader which
/// provides access to KHR surface functions.
///
/// The surface is created and destroyed by the windowing layer. This type only
/// queries it.
pub struct WindowSurface {
    surface: vk::SurfaceKHR,
    surface_loader: extensions::khr::Surface,
}

impl WindowSurface {
    /// Load the surface extension functions.
    ///
    /// # Safety
    ///
    /// The surface must outlive this object and belong to `instance`.
    pub unsafe fn new(
        entry: &ash::Entry,
        instance: &ash::Instance,
        surface: vk::SurfaceKHR,
    ) -> Self {
        let surface_loader = extensions::khr::Surface::new(entry, instance);
        Self {
            surface,
            surface_loader,
        }
    }

    /// The raw surface handle.
    pub fn raw(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Query the surface capabilities for the physical device.
    pub fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR, VulkanError> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(
                    physical_device,
                    self.surface,
                )
                .map_err(VulkanError::UnableToGetSurfaceCapabilities)
        }
    }

    /// Every format and color space pair supported by the surface, in the
    /// order the driver enumerates them.
    pub fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, VulkanError> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(
                    physical_device,
                    self.surface,
                )
                .map_err(VulkanError::UnableToGetSurfaceFormats)
        }
    }

    /// Every presentation mode supported by the surface.
    pub fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>, VulkanError> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(
                    physical_device,
                    self.surface,
                )
                .map_err(VulkanError::UnableToGetPresentModes)
        }
    }
}
