mod acquire_present;
mod image_arena;
pub(crate) mod selection;

use {
    self::image_arena::ImageArena,
    crate::graphics::{
        vulkan_api::{GpuDevice, SwapchainParameters},
        FrameError,
    },
    ash::vk,
    std::sync::Arc,
};

pub use self::{
    acquire_present::{AcquireStatus, AcquiredImage, PresentStatus},
    image_arena::SwapchainImage,
};

/// The negotiated properties of a built swapchain.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SwapchainDescriptor {
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub present_mode: vk::PresentModeKHR,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub generation: u64,
}

impl SwapchainDescriptor {
    /// A viewport which covers the full swapchain extent with depth in
    /// [0, 1].
    pub fn viewport(&self) -> vk::Viewport {
        vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.extent.width as f32,
            height: self.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// A scissor rect which covers the full swapchain extent.
    pub fn scissor(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent,
        }
    }
}

/// The swapchain and all related per-image resources.
///
/// The manager owns the swapchain handle and an arena holding one view and
/// one framebuffer per swapchain image. The arena is always destroyed and
/// rebuilt as a unit.
pub struct SwapchainManager<D: GpuDevice> {
    swapchain_khr: vk::SwapchainKHR,
    arena: ImageArena,
    descriptor: Option<SwapchainDescriptor>,
    generation: u64,
    render_pass: vk::RenderPass,
    device: Arc<D>,
}

// Public API
// ----------

impl<D: GpuDevice> SwapchainManager<D> {
    /// Create a manager with no swapchain. Call `build` before acquiring.
    ///
    /// # Params
    ///
    /// * `render_pass` - every per-image framebuffer is created against this
    ///   render pass. It must outlive the manager.
    pub fn new(device: Arc<D>, render_pass: vk::RenderPass) -> Self {
        Self {
            swapchain_khr: vk::SwapchainKHR::null(),
            arena: ImageArena::default(),
            descriptor: None,
            generation: 0,
            render_pass,
            device,
        }
    }

    /// The extent a swapchain built right now would have.
    pub fn surface_extent(
        &self,
        requested: vk::Extent2D,
    ) -> Result<vk::Extent2D, FrameError> {
        let capabilities = self.device.surface_capabilities()?;
        Ok(selection::choose_extent(&capabilities, requested))
    }

    /// Build (or rebuild) the swapchain and its image arena.
    ///
    /// Returns `None` without touching any resources when the surface has a
    /// zero-area extent.
    ///
    /// # Params
    ///
    /// * `desired_image_count` - clamped to the surface limits
    /// * `preferred_format` - used when the surface supports it
    /// * `requested_extent` - only used when the surface leaves the extent up
    ///   to the swapchain
    ///
    /// # Safety
    ///
    /// No image, view, or framebuffer of the current swapchain may be in use
    /// by the GPU. Callers typically wait for the device to idle first.
    pub unsafe fn build(
        &mut self,
        desired_image_count: u32,
        preferred_format: vk::SurfaceFormatKHR,
        requested_extent: vk::Extent2D,
    ) -> Result<Option<SwapchainDescriptor>, FrameError> {
        let capabilities = self.device.surface_capabilities()?;
        let extent = selection::choose_extent(&capabilities, requested_extent);
        if selection::is_zero_area(extent) {
            log::debug!("Surface extent is {:?}, skipping build", extent);
            return Ok(None);
        }

        let formats = self.device.surface_formats()?;
        let modes = self.device.present_modes()?;
        let parameters = SwapchainParameters {
            surface_format: selection::choose_surface_format(
                &formats,
                preferred_format,
            )?,
            extent,
            min_image_count: selection::choose_image_count(
                &capabilities,
                desired_image_count,
            ),
            present_mode: selection::choose_present_mode(&modes),
            pre_transform: selection::choose_pre_transform(&capabilities),
            composite_alpha: selection::choose_composite_alpha(&capabilities),
        };

        // views and framebuffers reference the old images
        self.arena.destroy(&*self.device);
        self.descriptor = None;

        // the old swapchain is retired by the create call, even when it fails
        let old_swapchain = self.swapchain_khr;
        let created = self.device.create_swapchain(&parameters, old_swapchain);
        if old_swapchain != vk::SwapchainKHR::null() {
            self.device.destroy_swapchain(old_swapchain);
            self.swapchain_khr = vk::SwapchainKHR::null();
        }
        let swapchain_khr = created?;
        self.swapchain_khr = swapchain_khr;

        let images = self.device.swapchain_images(swapchain_khr)?;
        self.arena = ImageArena::new(
            &*self.device,
            &images,
            parameters.surface_format.format,
            extent,
            self.render_pass,
        )?;
        self.generation += 1;

        let descriptor = SwapchainDescriptor {
            format: parameters.surface_format,
            extent,
            image_count: self.arena.len() as u32,
            present_mode: parameters.present_mode,
            pre_transform: parameters.pre_transform,
            composite_alpha: parameters.composite_alpha,
            generation: self.generation,
        };
        log::info!(
            "Built swapchain generation {} with {} {:?} images at {}x{}",
            descriptor.generation,
            descriptor.image_count,
            descriptor.format.format,
            extent.width,
            extent.height,
        );
        self.descriptor = Some(descriptor);
        Ok(self.descriptor)
    }

    /// The framebuffer which targets an acquired image.
    pub fn framebuffer(
        &self,
        image: &AcquiredImage,
    ) -> Result<vk::Framebuffer, FrameError> {
        self.check_generation(image)?;
        self.arena
            .get(image.index())
            .map(|swapchain_image| swapchain_image.framebuffer)
            .ok_or_else(|| {
                FrameError::ProtocolViolation(format!(
                    "swapchain image {} does not exist",
                    image.index()
                ))
            })
    }

    /// The properties of the current swapchain, if it is built.
    pub fn descriptor(&self) -> Option<&SwapchainDescriptor> {
        self.descriptor.as_ref()
    }

    /// The per-image resources of the current swapchain.
    pub fn images(&self) -> &[SwapchainImage] {
        self.arena.images()
    }

    pub fn is_built(&self) -> bool {
        self.descriptor.is_some()
    }

    /// The number of successful builds so far. Zero until the first build.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The current extent, or zero when the swapchain is not built.
    pub fn extent(&self) -> vk::Extent2D {
        self.descriptor
            .map(|descriptor| descriptor.extent)
            .unwrap_or_default()
    }

    /// The current image format, or `UNDEFINED` when the swapchain is not
    /// built.
    pub fn format(&self) -> vk::Format {
        self.descriptor
            .map(|descriptor| descriptor.format.format)
            .unwrap_or(vk::Format::UNDEFINED)
    }

    /// Destroy the image arena and the swapchain. Safe to call repeatedly.
    ///
    /// # Safety
    ///
    /// The GPU must be done with every swapchain image.
    pub unsafe fn teardown(&mut self) {
        self.arena.destroy(&*self.device);
        self.descriptor = None;
        if self.swapchain_khr != vk::SwapchainKHR::null() {
            self.device.destroy_swapchain(self.swapchain_khr);
            self.swapchain_khr = vk::SwapchainKHR::null();
        }
    }
}

// Private API
// -----------

impl<D: GpuDevice> SwapchainManager<D> {
    fn check_generation(&self, image: &AcquiredImage) -> Result<(), FrameError> {
        if self.is_built() && image.generation() == self.generation {
            Ok(())
        } else {
            Err(FrameError::ProtocolViolation(format!(
                "image {} was acquired from swapchain generation {} but the \
                 current generation is {}",
                image.index(),
                image.generation(),
                self.generation
            )))
        }
    }
}
