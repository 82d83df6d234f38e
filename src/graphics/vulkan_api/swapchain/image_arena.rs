use {
    crate::graphics::vulkan_api::{GpuDevice, VulkanError},
    ash::vk::{self, Handle},
    scopeguard::{guard, ScopeGuard},
};

/// One presentable image and the resources used to render into it.
///
/// The image itself is owned by the swapchain. Only the view and the
/// framebuffer are destroyed with the arena.
#[derive(Debug, Copy, Clone)]
pub struct SwapchainImage {
    pub index: u32,
    pub format: vk::Format,
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub framebuffer: vk::Framebuffer,
}

/// Every per-image resource for one swapchain generation.
#[derive(Debug, Default)]
pub(super) struct ImageArena {
    images: Vec<SwapchainImage>,
}

impl ImageArena {
    /// Create a view and a framebuffer for every swapchain image. If any
    /// creation fails, everything created so far is destroyed before the
    /// error is returned.
    pub fn new<D: GpuDevice>(
        device: &D,
        images: &[vk::Image],
        format: vk::Format,
        extent: vk::Extent2D,
        render_pass: vk::RenderPass,
    ) -> Result<Self, VulkanError> {
        let mut arena = guard(Self::default(), |mut arena| unsafe {
            // SAFE because none of the resources have been handed out yet
            arena.destroy(device);
        });

        for (index, &image) in images.iter().enumerate() {
            let view = guard(device.create_image_view(image, format)?, |view| {
                unsafe { device.destroy_image_view(view) }
            });
            device.name_object(
                vk::ObjectType::IMAGE_VIEW,
                view.as_raw(),
                &format!("Swapchain Image View {}", index),
            );

            let framebuffer =
                device.create_framebuffer(render_pass, *view, extent)?;
            device.name_object(
                vk::ObjectType::FRAMEBUFFER,
                framebuffer.as_raw(),
                &format!("Swapchain Framebuffer {}", index),
            );

            arena.images.push(SwapchainImage {
                index: index as u32,
                format,
                image,
                view: ScopeGuard::into_inner(view),
                framebuffer,
            });
        }

        Ok(ScopeGuard::into_inner(arena))
    }

    pub fn get(&self, index: u32) -> Option<&SwapchainImage> {
        self.images.get(index as usize)
    }

    pub fn images(&self) -> &[SwapchainImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Destroy every framebuffer and view. The arena is empty afterwards.
    ///
    /// # Safety
    ///
    /// The GPU must be done with every framebuffer and view in the arena.
    pub unsafe fn destroy<D: GpuDevice>(&mut self, device: &D) {
        for swapchain_image in self.images.drain(..) {
            device.destroy_framebuffer(swapchain_image.framebuffer);
            device.destroy_image_view(swapchain_image.view);
        }
    }
}
