mod error;

pub mod vulkan_api;

pub use self::{
    error::FrameError,
    vulkan_api::{
        FrameHooks, FrameRecorder, FrameReport, FrameScheduler, FrameStatus,
        FrameTarget, SchedulerState, SwapchainDescriptor,
    },
};
