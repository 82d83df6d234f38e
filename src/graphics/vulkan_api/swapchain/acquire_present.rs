//! Just the logic for acquiring and presenting swapchain images.
//!
//! Both operations return a status rather than an error for the conditions
//! which are fixed by rebuilding the swapchain.

use {
    super::SwapchainManager,
    crate::graphics::{
        vulkan_api::{GpuDevice, VulkanError},
        FrameError,
    },
    ash::vk,
};

/// A swapchain image which has been acquired but not yet presented.
///
/// The image remembers the swapchain generation it came from so it can't be
/// presented to a newer swapchain.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AcquiredImage {
    index: u32,
    generation: u64,
}

impl AcquiredImage {
    /// The swapchain image index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The swapchain generation this image was acquired from.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The result of trying to acquire the next swapchain image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AcquireStatus {
    /// The image is acquired and the swapchain matches the surface.
    Ready(AcquiredImage),

    /// The image is acquired and can be presented, but the swapchain should
    /// be rebuilt afterwards.
    SubOptimal(AcquiredImage),

    /// No image was acquired. The swapchain must be rebuilt.
    OutOfDate,

    /// No image became available before the timeout.
    TimedOut,
}

/// The result of presenting a swapchain image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentStatus {
    Ready,
    SubOptimal,
    OutOfDate,
}

// Public API
// ----------

impl<D: GpuDevice> SwapchainManager<D> {
    /// Acquire the next swapchain image.
    ///
    /// # Params
    ///
    /// * `semaphore` - signaled when the acquired image is available. It is
    ///   only signaled when an image is returned.
    /// * `timeout_ns` - how long to wait for an image, `u64::MAX` waits
    ///   forever
    pub fn acquire_next(
        &self,
        semaphore: vk::Semaphore,
        timeout_ns: u64,
    ) -> Result<AcquireStatus, FrameError> {
        if !self.is_built() {
            return Err(FrameError::ProtocolViolation(
                "acquired an image before the swapchain was built".to_owned(),
            ));
        }
        let result = self.device.acquire_next_image(
            self.swapchain_khr,
            timeout_ns,
            semaphore,
        );
        match result {
            // index acquired and the swapchain is optimal
            Ok((index, false)) => {
                Ok(AcquireStatus::Ready(self.acquired_image(index)))
            }

            // index acquired but the swapchain is suboptimal for the surface
            Ok((index, true)) => {
                log::debug!("Acquire Image: Swapchain suboptimal");
                Ok(AcquireStatus::SubOptimal(self.acquired_image(index)))
            }

            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::debug!("Acquire Image: Swapchain out of date");
                Ok(AcquireStatus::OutOfDate)
            }

            Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => {
                Ok(AcquireStatus::TimedOut)
            }

            Err(err) => Err(VulkanError::UnexpectedAcquireError(err).into()),
        }
    }

    /// Present an acquired image.
    ///
    /// # Params
    ///
    /// * `queue` - the queue used for presentation
    /// * `image` - must come from the current swapchain generation
    /// * `wait_semaphore` - presentation waits for this semaphore, typically
    ///   signaled when the frame's graphics commands finish
    pub fn present(
        &self,
        queue: vk::Queue,
        image: &AcquiredImage,
        wait_semaphore: vk::Semaphore,
    ) -> Result<PresentStatus, FrameError> {
        self.check_generation(image)?;
        let result = self.device.queue_present(
            queue,
            self.swapchain_khr,
            image.index(),
            wait_semaphore,
        );
        match result {
            Ok(false) => Ok(PresentStatus::Ready),
            Ok(true) => {
                log::debug!("Present Image: Swapchain suboptimal");
                Ok(PresentStatus::SubOptimal)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::debug!("Present Image: Swapchain out of date");
                Ok(PresentStatus::OutOfDate)
            }
            Err(err) => Err(VulkanError::UnexpectedPresentError(err).into()),
        }
    }
}

// Private API
// -----------

impl<D: GpuDevice> SwapchainManager<D> {
    fn acquired_image(&self, index: u32) -> AcquiredImage {
        AcquiredImage {
            index,
            generation: self.generation,
        }
    }
}
