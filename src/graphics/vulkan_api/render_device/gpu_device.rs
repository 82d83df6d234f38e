use {
    crate::graphics::vulkan_api::VulkanError,
    ash::{prelude::VkResult, vk},
};

/// The outcome of waiting on a fence with a timeout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FenceWait {
    /// The fence was observed in the signaled state.
    Signaled,

    /// The timeout expired before the fence was signaled.
    TimedOut,
}

/// Everything needed to submit one frame's graphics commands.
///
/// The submission waits on `wait_semaphore` at `wait_stage`, then signals
/// `signal_semaphore` and `fence` once the command buffer has finished
/// executing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameSubmission {
    pub queue: vk::Queue,
    pub command_buffer: vk::CommandBuffer,
    pub wait_semaphore: vk::Semaphore,
    pub wait_stage: vk::PipelineStageFlags,
    pub signal_semaphore: vk::Semaphore,
    pub fence: vk::Fence,
}

/// The negotiated settings used to create a swapchain.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SwapchainParameters {
    pub surface_format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub min_image_count: u32,
    pub present_mode: vk::PresentModeKHR,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
}

/// Every graphics API call made by the frame scheduler.
///
/// `RenderDevice` implements this with Ash. Keeping the calls behind a trait
/// means the scheduler never touches a raw `ash::Device` directly.
///
/// Methods which destroy resources are unsafe. Callers must ensure the GPU is
/// no longer using the resource.
pub trait GpuDevice {
    /// The queue used for graphics command submissions.
    fn graphics_queue(&self) -> vk::Queue;

    /// The queue used for presentation. This can be the same queue as the
    /// graphics queue.
    fn present_queue(&self) -> vk::Queue;

    /// The unique queue family indices which need access to swapchain images.
    fn swapchain_queue_family_indices(&self) -> Vec<u32>;

    /// Stall the thread until the GPU is done with all operations.
    fn wait_idle(&self) -> Result<(), VulkanError>;

    /// Give a debug name to a Vulkan object. The name shows up in validation
    /// layer messages. The default implementation ignores the name.
    fn name_object(
        &self,
        _object_type: vk::ObjectType,
        _raw_handle: u64,
        _name: &str,
    ) {
    }

    // Synchronization
    // ---------------

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence, VulkanError>;

    /// # Safety
    ///
    /// The fence must not be referenced by any pending submission.
    unsafe fn destroy_fence(&self, fence: vk::Fence);

    /// Block until the fence is signaled or `timeout_ns` elapses.
    fn wait_for_fence(
        &self,
        fence: vk::Fence,
        timeout_ns: u64,
    ) -> Result<FenceWait, VulkanError>;

    fn reset_fence(&self, fence: vk::Fence) -> Result<(), VulkanError>;

    fn create_semaphore(&self) -> Result<vk::Semaphore, VulkanError>;

    /// # Safety
    ///
    /// The semaphore must not be referenced by any pending GPU operation.
    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    // Commands
    // --------

    /// Create a transient command pool for the graphics queue family.
    fn create_command_pool(&self) -> Result<vk::CommandPool, VulkanError>;

    /// # Safety
    ///
    /// No command buffer allocated from the pool may be pending execution.
    unsafe fn destroy_command_pool(&self, command_pool: vk::CommandPool);

    /// Allocate a single primary command buffer from the pool.
    fn allocate_command_buffer(
        &self,
        command_pool: vk::CommandPool,
    ) -> Result<vk::CommandBuffer, VulkanError>;

    fn reset_command_pool(
        &self,
        command_pool: vk::CommandPool,
    ) -> Result<(), VulkanError>;

    /// Begin a one-time-submit command buffer.
    fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError>;

    fn end_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError>;

    fn submit_frame(
        &self,
        submission: &FrameSubmission,
    ) -> Result<(), VulkanError>;

    // Surface
    // -------

    fn surface_capabilities(
        &self,
    ) -> Result<vk::SurfaceCapabilitiesKHR, VulkanError>;

    fn surface_formats(&self) -> Result<Vec<vk::SurfaceFormatKHR>, VulkanError>;

    fn present_modes(&self) -> Result<Vec<vk::PresentModeKHR>, VulkanError>;

    // Swapchain
    // ---------

    /// Create a swapchain. `old_swapchain` may be null. When it is not, the
    /// driver can hand over resources from the retiring swapchain.
    fn create_swapchain(
        &self,
        parameters: &SwapchainParameters,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<vk::SwapchainKHR, VulkanError>;

    /// # Safety
    ///
    /// No image from the swapchain may be in use by the GPU.
    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

    fn swapchain_images(
        &self,
        swapchain: vk::SwapchainKHR,
    ) -> Result<Vec<vk::Image>, VulkanError>;

    /// Create a 2D color view for a swapchain image.
    fn create_image_view(
        &self,
        image: vk::Image,
        format: vk::Format,
    ) -> Result<vk::ImageView, VulkanError>;

    /// # Safety
    ///
    /// The view must not be in use by the GPU.
    unsafe fn destroy_image_view(&self, image_view: vk::ImageView);

    /// Create a single-attachment framebuffer which targets `image_view`.
    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        image_view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> Result<vk::Framebuffer, VulkanError>;

    /// # Safety
    ///
    /// The framebuffer must not be in use by the GPU.
    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    /// Raw image acquisition. Status codes like `ERROR_OUT_OF_DATE_KHR` and
    /// `TIMEOUT` are returned untouched so the swapchain can classify them.
    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout_ns: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)>;

    /// Raw presentation. Returns true when the swapchain is suboptimal.
    fn queue_present(
        &self,
        queue: vk::Queue,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool>;
}
