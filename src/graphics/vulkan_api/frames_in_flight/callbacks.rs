use {crate::graphics::vulkan_api::SwapchainDescriptor, ash::vk};

/// Everything a recording callback needs to fill one frame's command buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameTarget {
    /// Already begun. The scheduler ends and submits it after the callback
    /// returns.
    pub command_buffer: vk::CommandBuffer,

    /// Targets the acquired swapchain image through the scheduler's render
    /// pass.
    pub framebuffer: vk::Framebuffer,

    pub image_index: u32,
    pub extent: vk::Extent2D,
    pub slot_index: usize,
    pub generation: u64,
}

/// Records graphics commands for a frame.
///
/// Implemented for any `FnMut(&FrameTarget) -> anyhow::Result<()>` closure.
pub trait FrameRecorder {
    fn record(&mut self, target: &FrameTarget) -> anyhow::Result<()>;
}

impl<F> FrameRecorder for F
where
    F: FnMut(&FrameTarget) -> anyhow::Result<()>,
{
    fn record(&mut self, target: &FrameTarget) -> anyhow::Result<()> {
        self(target)
    }
}

pub type CleanupHook = Box<dyn FnMut() -> anyhow::Result<()>>;
pub type PrepareHook =
    Box<dyn FnMut(&SwapchainDescriptor) -> anyhow::Result<()>>;

/// Optional callbacks which run around every swapchain rebuild.
///
/// `on_cleanup` runs once the device is idle and before the old per-image
/// resources are destroyed. `on_prepare` runs once the new swapchain and its
/// framebuffers exist, which makes it the place to rebuild anything that
/// depends on the swapchain extent or format.
#[derive(Default)]
pub struct FrameHooks {
    pub on_cleanup: Option<CleanupHook>,
    pub on_prepare: Option<PrepareHook>,
}

impl FrameHooks {
    pub fn with_cleanup<F>(mut self, on_cleanup: F) -> Self
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.on_cleanup = Some(Box::new(on_cleanup));
        self
    }

    pub fn with_prepare<F>(mut self, on_prepare: F) -> Self
    where
        F: FnMut(&SwapchainDescriptor) -> anyhow::Result<()> + 'static,
    {
        self.on_prepare = Some(Box::new(on_prepare));
        self
    }
}

impl std::fmt::Debug for FrameHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHooks")
            .field("on_cleanup", &self.on_cleanup.is_some())
            .field("on_prepare", &self.on_prepare.is_some())
            .finish()
    }
}
