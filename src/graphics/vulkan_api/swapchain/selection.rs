use {
    crate::{graphics::vulkan_api::VulkanError, logging::PrettyList},
    ash::vk,
};

/// Surfaces report this as their current width and height when the swapchain
/// extent decides the surface size.
pub const INDETERMINATE_EXTENT: u32 = u32::MAX;

/// True when either dimension is zero. Swapchains can't be created with a
/// zero-area extent, typically because the window is minimized.
pub fn is_zero_area(extent: vk::Extent2D) -> bool {
    extent.width == 0 || extent.height == 0
}

/// Pick the surface format for the swapchain.
///
/// An exact match for `preferred` wins. Otherwise, a surface whose first
/// entry is `UNDEFINED` accepts any format, so the preferred format is used
/// with that entry's color space. Otherwise the first enumerated format is
/// used.
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
    preferred: vk::SurfaceFormatKHR,
) -> Result<vk::SurfaceFormatKHR, VulkanError> {
    log::debug!("Available Surface Formats: {:#?}", PrettyList(formats));

    let first = formats.first().ok_or(VulkanError::NoSurfaceFormats)?;
    let format = if formats.contains(&preferred) {
        preferred
    } else if first.format == vk::Format::UNDEFINED {
        vk::SurfaceFormatKHR {
            format: preferred.format,
            color_space: first.color_space,
        }
    } else {
        *first
    };

    log::debug!("Chose Surface Format: {:#?}", format);
    Ok(format)
}

/// FIFO is the only mode every surface is required to support, and it is
/// the mode which paces the CPU against the display.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    log::debug!("Available Presentation Modes: {:#?}", PrettyList(modes));
    vk::PresentModeKHR::FIFO
}

/// Pick the swapchain extent.
///
/// The surface's current extent is used unless the surface reports the
/// indeterminate sentinel, in which case the requested size is clamped to
/// the supported range. A zero-area request is passed through untouched so
/// the caller can defer the build.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    requested: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != INDETERMINATE_EXTENT {
        return capabilities.current_extent;
    }
    if is_zero_area(requested) {
        return requested;
    }
    vk::Extent2D {
        width: requested.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: requested.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Clamp the desired image count to the surface limits. A max image count of
/// zero means there is no upper limit.
pub fn choose_image_count(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    desired: u32,
) -> u32 {
    let count = desired.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

pub fn choose_pre_transform(
    capabilities: &vk::SurfaceCapabilitiesKHR,
) -> vk::SurfaceTransformFlagsKHR {
    if capabilities
        .supported_transforms
        .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
    {
        vk::SurfaceTransformFlagsKHR::IDENTITY
    } else {
        capabilities.current_transform
    }
}

pub fn choose_composite_alpha(
    capabilities: &vk::SurfaceCapabilitiesKHR,
) -> vk::CompositeAlphaFlagsKHR {
    [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::INHERIT,
    ]
    .into_iter()
    .find(|&alpha| capabilities.supported_composite_alpha.contains(alpha))
    .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}
