use thiserror::Error;

use crate::{config::ConfigError, graphics::vulkan_api::VulkanError};

/// Everything that can go wrong while driving frames.
///
/// Out-of-date and suboptimal swapchains never show up here, they are handled
/// by rebuilding inside `FrameScheduler::advance`.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("The graphics device was lost. Every GPU object must be recreated.")]
    DeviceLost(#[source] VulkanError),

    #[error("The presentation surface is no longer usable")]
    SurfaceLost(#[source] VulkanError),

    #[error("Unable to allocate GPU resources for frame presentation")]
    ResourceExhausted(#[source] VulkanError),

    #[error(
        "The swapchain was still out of date right after being rebuilt \
         (generation {generation})"
    )]
    PresentationFailed { generation: u64 },

    #[error("Frame protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Invalid frame configuration")]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Callback(anyhow::Error),

    #[error(transparent)]
    Vulkan(VulkanError),
}

impl From<VulkanError> for FrameError {
    fn from(error: VulkanError) -> Self {
        if error.is_device_lost() {
            Self::DeviceLost(error)
        } else if error.is_surface_failure() {
            Self::SurfaceLost(error)
        } else if error.is_allocation_failure() {
            Self::ResourceExhausted(error)
        } else {
            Self::Vulkan(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, ash::vk};

    #[test]
    fn test_vulkan_errors_are_classified() {
        let lost: FrameError = VulkanError::UnableToSubmitCommands(
            vk::Result::ERROR_DEVICE_LOST,
        )
        .into();
        assert!(matches!(lost, FrameError::DeviceLost(_)));

        let surface: FrameError = VulkanError::UnableToGetSurfaceCapabilities(
            vk::Result::ERROR_SURFACE_LOST_KHR,
        )
        .into();
        assert!(matches!(surface, FrameError::SurfaceLost(_)));

        let exhausted: FrameError = VulkanError::UnableToCreateFramebuffer(
            vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
        )
        .into();
        assert!(matches!(exhausted, FrameError::ResourceExhausted(_)));

        let other: FrameError = VulkanError::UnableToEndCommandBuffer(
            vk::Result::ERROR_UNKNOWN,
        )
        .into();
        assert!(matches!(other, FrameError::Vulkan(_)));
    }
}
