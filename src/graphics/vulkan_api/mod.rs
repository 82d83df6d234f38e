mod error;
mod frames_in_flight;
mod render_device;
mod swapchain;
mod sync;

#[cfg(test)]
pub(crate) mod mock_device;

pub(crate) use self::swapchain::selection;

pub use self::{
    error::VulkanError,
    frames_in_flight::{
        CleanupHook, FrameHooks, FrameRecorder, FrameReport, FrameScheduler,
        FrameStatus, FrameTarget, PrepareHook, SchedulerState,
    },
    render_device::{
        DeviceQueue, FenceWait, FrameSubmission, GpuDevice, RenderDevice,
        SwapchainParameters, WindowSurface,
    },
    swapchain::{
        AcquireStatus, AcquiredImage, PresentStatus, SwapchainDescriptor,
        SwapchainImage, SwapchainManager,
    },
    sync::SyncPrimitivePool,
};
