use {ash::vk, thiserror::Error};

/// A failed call into the graphics API.
///
/// Every variant except `NoSurfaceFormats` carries the raw result code the
/// driver reported.
#[derive(Debug, Error)]
pub enum VulkanError {
    #[error("Unable to create a fence {:?}", .0)]
    UnableToCreateFence(#[source] vk::Result),

    #[error("Unexpected error while waiting for a fence {:?}", .0)]
    UnexpectedFenceWaitError(#[source] vk::Result),

    #[error("Unexpected error while resetting a fence {:?}", .0)]
    UnexpectedFenceResetError(#[source] vk::Result),

    #[error("Unable to create a semaphore {:?}", .0)]
    UnableToCreateSemaphore(#[source] vk::Result),

    #[error("Unable to create a command pool {:?}", .0)]
    UnableToCreateCommandPool(#[source] vk::Result),

    #[error("Unable to allocate a command buffer {:?}", .0)]
    UnableToAllocateCommandBuffer(#[source] vk::Result),

    #[error("Unable to reset a command pool {:?}", .0)]
    UnableToResetCommandPool(#[source] vk::Result),

    #[error("Unable to begin a command buffer {:?}", .0)]
    UnableToBeginCommandBuffer(#[source] vk::Result),

    #[error("Unable to end a command buffer {:?}", .0)]
    UnableToEndCommandBuffer(#[source] vk::Result),

    #[error("Unable to submit graphics commands {:?}", .0)]
    UnableToSubmitCommands(#[source] vk::Result),

    #[error("Unable to wait for the device to idle {:?}", .0)]
    UnableToWaitForDeviceToIdle(#[source] vk::Result),

    #[error("Unable to query the surface capabilities {:?}", .0)]
    UnableToGetSurfaceCapabilities(#[source] vk::Result),

    #[error("Unable to query the supported surface formats {:?}", .0)]
    UnableToGetSurfaceFormats(#[source] vk::Result),

    #[error("Unable to query the supported presentation modes {:?}", .0)]
    UnableToGetPresentModes(#[source] vk::Result),

    #[error("The surface does not report any supported formats")]
    NoSurfaceFormats,

    #[error("Unable to create the swapchain {:?}", .0)]
    UnableToCreateSwapchain(#[source] vk::Result),

    #[error("Unable to get the swapchain images {:?}", .0)]
    UnableToGetSwapchainImages(#[source] vk::Result),

    #[error("Unable to create an image view {:?}", .0)]
    UnableToCreateImageView(#[source] vk::Result),

    #[error("Unable to create a framebuffer {:?}", .0)]
    UnableToCreateFramebuffer(#[source] vk::Result),

    #[error("Unexpected error while acquiring a swapchain image {:?}", .0)]
    UnexpectedAcquireError(#[source] vk::Result),

    #[error("Unexpected error while presenting a swapchain image {:?}", .0)]
    UnexpectedPresentError(#[source] vk::Result),
}

impl VulkanError {
    /// The raw result code reported by the driver, if there is one.
    pub fn result(&self) -> Option<vk::Result> {
        match *self {
            Self::UnableToCreateFence(result)
            | Self::UnexpectedFenceWaitError(result)
            | Self::UnexpectedFenceResetError(result)
            | Self::UnableToCreateSemaphore(result)
            | Self::UnableToCreateCommandPool(result)
            | Self::UnableToAllocateCommandBuffer(result)
            | Self::UnableToResetCommandPool(result)
            | Self::UnableToBeginCommandBuffer(result)
            | Self::UnableToEndCommandBuffer(result)
            | Self::UnableToSubmitCommands(result)
            | Self::UnableToWaitForDeviceToIdle(result)
            | Self::UnableToGetSurfaceCapabilities(result)
            | Self::UnableToGetSurfaceFormats(result)
            | Self::UnableToGetPresentModes(result)
            | Self::UnableToCreateSwapchain(result)
            | Self::UnableToGetSwapchainImages(result)
            | Self::UnableToCreateImageView(result)
            | Self::UnableToCreateFramebuffer(result)
            | Self::UnexpectedAcquireError(result)
            | Self::UnexpectedPresentError(result) => Some(result),
            Self::NoSurfaceFormats => None,
        }
    }

    /// True when the driver reported that the logical device was lost.
    pub fn is_device_lost(&self) -> bool {
        self.result() == Some(vk::Result::ERROR_DEVICE_LOST)
    }

    /// True when the surface itself is gone or could not be queried.
    pub fn is_surface_failure(&self) -> bool {
        match self {
            Self::UnableToGetSurfaceCapabilities(_)
            | Self::UnableToGetSurfaceFormats(_)
            | Self::UnableToGetPresentModes(_)
            | Self::NoSurfaceFormats => true,
            _ => self.result() == Some(vk::Result::ERROR_SURFACE_LOST_KHR),
        }
    }

    /// True when the failed call was an attempt to create a new GPU object.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(
            self,
            Self::UnableToCreateFence(_)
                | Self::UnableToCreateSemaphore(_)
                | Self::UnableToCreateCommandPool(_)
                | Self::UnableToAllocateCommandBuffer(_)
                | Self::UnableToCreateSwapchain(_)
                | Self::UnableToGetSwapchainImages(_)
                | Self::UnableToCreateImageView(_)
                | Self::UnableToCreateFramebuffer(_)
        ) || matches!(
            self.result(),
            Some(vk::Result::ERROR_OUT_OF_HOST_MEMORY)
                | Some(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
        )
    }
}
