//! Frame-in-flight scheduling and swapchain presentation for Vulkan.
//!
//! The [`graphics::FrameScheduler`] owns a ring of buffered frames and the
//! swapchain. Each call to `advance` waits for the next frame slot, acquires a
//! swapchain image, asks the application to record commands, submits them,
//! and presents the result. Swapchains which go out of date are rebuilt along
//! the way.

pub mod config;
pub mod graphics;
pub mod logging;

pub use self::{
    config::{ConfigError, FrameConfig},
    graphics::{
        FrameError, FrameHooks, FrameRecorder, FrameReport, FrameScheduler,
        FrameStatus, FrameTarget, SchedulerState,
    },
};
