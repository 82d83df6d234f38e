//! A fake GPU used by the unit tests.
//!
//! The mock hands out unique handles, keeps a count of live objects of each
//! kind, and records an event log of every synchronization-relevant call.
//! Submitted work completes on a logical clock: each submission finishes
//! `latency` ticks after it was made, and the clock only moves forward when
//! the CPU blocks on a fence, idles the device, or a test advances it.

use {
    crate::graphics::vulkan_api::{
        FenceWait, FrameSubmission, GpuDevice, SwapchainParameters,
        VulkanError,
    },
    ash::{
        prelude::VkResult,
        vk::{self, Handle},
    },
    std::{
        collections::{HashMap, HashSet, VecDeque},
        sync::{Arc, Mutex, MutexGuard},
    },
};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) enum ObjectKind {
    Fence,
    Semaphore,
    CommandPool,
    Swapchain,
    ImageView,
    Framebuffer,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Event {
    FenceWaited { fence: vk::Fence, signaled: bool },
    FenceReset(vk::Fence),
    CommandPoolReset(vk::CommandPool),
    Submitted(FrameSubmission),
    Acquired { swapchain: vk::SwapchainKHR, image_index: u32 },
    Presented { swapchain: vk::SwapchainKHR, image_index: u32 },
    SwapchainCreated {
        swapchain: vk::SwapchainKHR,
        old_swapchain: vk::SwapchainKHR,
    },
    WaitIdle,
}

/// A scripted result for the next acquire or present call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Scripted {
    OutOfDate,
    SubOptimal,
    Timeout,
    Fail(vk::Result),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FenceState {
    Signaled,
    Unsignaled,
    Pending { completes_at: u64 },
}

pub(crate) struct MockState {
    next_handle: u64,
    pub live: HashMap<u64, ObjectKind>,
    pub created: HashMap<ObjectKind, usize>,
    pub clock: u64,
    pub latency: u64,
    fences: HashMap<vk::Fence, FenceState>,
    pub events: Vec<Event>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub acquire_script: VecDeque<Scripted>,
    pub present_script: VecDeque<Scripted>,
    pub swapchain_parameters: Vec<SwapchainParameters>,
    swapchain_images: HashMap<vk::SwapchainKHR, u32>,
    retired_swapchains: HashSet<vk::SwapchainKHR>,
    next_image: HashMap<vk::SwapchainKHR, u32>,
    failures: HashMap<ObjectKind, usize>,
    pub submit_failure: Option<vk::Result>,
    pub device_lost: bool,
    pub surface_lost: bool,
}

pub(crate) struct MockDevice {
    state: Mutex<MockState>,
}

impl MockDevice {
    /// A device with an 800x600 surface supporting 2 to 8 images in
    /// `B8G8R8A8_SRGB`.
    pub fn new() -> Arc<Self> {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            current_extent: vk::Extent2D {
                width: 800,
                height: 600,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            max_image_array_layers: 1,
            supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT,
        };
        Arc::new(Self {
            state: Mutex::new(MockState {
                next_handle: 1,
                live: HashMap::new(),
                created: HashMap::new(),
                clock: 0,
                latency: 0,
                fences: HashMap::new(),
                events: vec![],
                capabilities,
                formats: vec![vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                }],
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                swapchain_parameters: vec![],
                swapchain_images: HashMap::new(),
                retired_swapchains: HashSet::new(),
                next_image: HashMap::new(),
                failures: HashMap::new(),
                submit_failure: None,
                device_lost: false,
                surface_lost: false,
            }),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_latency(&self, latency: u64) {
        self.state().latency = latency;
    }

    pub fn set_extent(&self, width: u32, height: u32) {
        self.state().capabilities.current_extent =
            vk::Extent2D { width, height };
    }

    pub fn script_acquire(&self, results: &[Scripted]) {
        self.state().acquire_script.extend(results.iter().copied());
    }

    pub fn script_present(&self, results: &[Scripted]) {
        self.state().present_script.extend(results.iter().copied());
    }

    /// Make the `nth` (1-based) future creation of `kind` fail with
    /// `ERROR_OUT_OF_DEVICE_MEMORY`.
    pub fn fail_nth(&self, kind: ObjectKind, nth: usize) {
        self.state().failures.insert(kind, nth);
    }

    /// Make the next queue submission fail with `result`.
    pub fn fail_next_submit(&self, result: vk::Result) {
        self.state().submit_failure = Some(result);
    }

    pub fn live_count(&self) -> usize {
        self.state().live.len()
    }

    pub fn live_of(&self, kind: ObjectKind) -> usize {
        self.state().live.values().filter(|&&k| k == kind).count()
    }

    pub fn created_of(&self, kind: ObjectKind) -> usize {
        self.state().created.get(&kind).copied().unwrap_or(0)
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn submissions(&self) -> Vec<FrameSubmission> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Submitted(submission) => Some(submission),
                _ => None,
            })
            .collect()
    }

    pub fn present_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Presented { .. }))
            .count()
    }
}

impl MockState {
    fn allocate(
        &mut self,
        kind: ObjectKind,
        track_live: bool,
    ) -> Result<u64, vk::Result> {
        if let Some(remaining) = self.failures.get_mut(&kind) {
            *remaining -= 1;
            if *remaining == 0 {
                self.failures.remove(&kind);
                return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
            }
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        *self.created.entry(kind).or_insert(0) += 1;
        if track_live {
            self.live.insert(handle, kind);
        }
        Ok(handle)
    }

    fn release(&mut self, raw: u64, kind: ObjectKind) {
        match self.live.remove(&raw) {
            Some(found) => assert_eq!(found, kind, "destroyed wrong kind"),
            None => panic!("double free or unknown {:?} {}", kind, raw),
        }
    }

    fn fence_state(&mut self, fence: vk::Fence) -> FenceState {
        let clock = self.clock;
        let state = self
            .fences
            .get_mut(&fence)
            .expect("waiting on an unknown fence");
        if let FenceState::Pending { completes_at } = *state {
            if completes_at <= clock {
                *state = FenceState::Signaled;
            }
        }
        *state
    }

    fn check_device(&self) -> Result<(), vk::Result> {
        if self.device_lost {
            Err(vk::Result::ERROR_DEVICE_LOST)
        } else {
            Ok(())
        }
    }
}

impl GpuDevice for MockDevice {
    fn graphics_queue(&self) -> vk::Queue {
        vk::Queue::from_raw(0xA)
    }

    fn present_queue(&self) -> vk::Queue {
        vk::Queue::from_raw(0xB)
    }

    fn swapchain_queue_family_indices(&self) -> Vec<u32> {
        vec![0]
    }

    fn wait_idle(&self) -> Result<(), VulkanError> {
        let mut state = self.state();
        state
            .check_device()
            .map_err(VulkanError::UnableToWaitForDeviceToIdle)?;
        let latest = state
            .fences
            .values()
            .filter_map(|fence| match fence {
                FenceState::Pending { completes_at } => Some(*completes_at),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        state.clock = state.clock.max(latest);
        for fence in state.fences.values_mut() {
            if let FenceState::Pending { .. } = fence {
                *fence = FenceState::Signaled;
            }
        }
        state.events.push(Event::WaitIdle);
        Ok(())
    }

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence, VulkanError> {
        let mut state = self.state();
        let raw = state
            .allocate(ObjectKind::Fence, true)
            .map_err(VulkanError::UnableToCreateFence)?;
        let fence = vk::Fence::from_raw(raw);
        let initial = if signaled {
            FenceState::Signaled
        } else {
            FenceState::Unsignaled
        };
        state.fences.insert(fence, initial);
        Ok(fence)
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        let mut state = self.state();
        if let Some(FenceState::Pending { completes_at }) =
            state.fences.get(&fence).copied()
        {
            assert!(
                state.device_lost || completes_at <= state.clock,
                "destroyed a fence with pending GPU work"
            );
        }
        state.fences.remove(&fence);
        state.release(fence.as_raw(), ObjectKind::Fence);
    }

    fn wait_for_fence(
        &self,
        fence: vk::Fence,
        timeout_ns: u64,
    ) -> Result<FenceWait, VulkanError> {
        let mut state = self.state();
        state
            .check_device()
            .map_err(VulkanError::UnexpectedFenceWaitError)?;
        let signaled = match state.fence_state(fence) {
            FenceState::Signaled => true,
            FenceState::Unsignaled => {
                assert!(
                    timeout_ns != u64::MAX,
                    "unbounded wait on a fence that will never signal"
                );
                state.clock = state.clock.saturating_add(timeout_ns);
                false
            }
            FenceState::Pending { completes_at } => {
                let deadline = state.clock.saturating_add(timeout_ns);
                if completes_at <= deadline {
                    state.clock = completes_at;
                    state.fences.insert(fence, FenceState::Signaled);
                    true
                } else {
                    state.clock = deadline;
                    false
                }
            }
        };
        state.events.push(Event::FenceWaited { fence, signaled });
        Ok(if signaled {
            FenceWait::Signaled
        } else {
            FenceWait::TimedOut
        })
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<(), VulkanError> {
        let mut state = self.state();
        if let FenceState::Pending { .. } = state.fence_state(fence) {
            panic!("reset a fence with pending GPU work");
        }
        state.fences.insert(fence, FenceState::Unsignaled);
        state.events.push(Event::FenceReset(fence));
        Ok(())
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore, VulkanError> {
        self.state()
            .allocate(ObjectKind::Semaphore, true)
            .map(vk::Semaphore::from_raw)
            .map_err(VulkanError::UnableToCreateSemaphore)
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.state()
            .release(semaphore.as_raw(), ObjectKind::Semaphore);
    }

    fn create_command_pool(&self) -> Result<vk::CommandPool, VulkanError> {
        self.state()
            .allocate(ObjectKind::CommandPool, true)
            .map(vk::CommandPool::from_raw)
            .map_err(VulkanError::UnableToCreateCommandPool)
    }

    unsafe fn destroy_command_pool(&self, command_pool: vk::CommandPool) {
        self.state()
            .release(command_pool.as_raw(), ObjectKind::CommandPool);
    }

    fn allocate_command_buffer(
        &self,
        _command_pool: vk::CommandPool,
    ) -> Result<vk::CommandBuffer, VulkanError> {
        let mut state = self.state();
        let raw = state.next_handle;
        state.next_handle += 1;
        Ok(vk::CommandBuffer::from_raw(raw))
    }

    fn reset_command_pool(
        &self,
        command_pool: vk::CommandPool,
    ) -> Result<(), VulkanError> {
        self.state()
            .events
            .push(Event::CommandPoolReset(command_pool));
        Ok(())
    }

    fn begin_command_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError> {
        Ok(())
    }

    fn end_command_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError> {
        Ok(())
    }

    fn submit_frame(
        &self,
        submission: &FrameSubmission,
    ) -> Result<(), VulkanError> {
        let mut state = self.state();
        state
            .check_device()
            .map_err(VulkanError::UnableToSubmitCommands)?;
        if let Some(result) = state.submit_failure.take() {
            return Err(VulkanError::UnableToSubmitCommands(result));
        }
        assert_eq!(
            state.fence_state(submission.fence),
            FenceState::Unsignaled,
            "submitted with a fence that was not reset"
        );
        let completes_at = state.clock + state.latency;
        state
            .fences
            .insert(submission.fence, FenceState::Pending { completes_at });
        state.events.push(Event::Submitted(*submission));
        Ok(())
    }

    fn surface_capabilities(
        &self,
    ) -> Result<vk::SurfaceCapabilitiesKHR, VulkanError> {
        let state = self.state();
        if state.surface_lost {
            return Err(VulkanError::UnableToGetSurfaceCapabilities(
                vk::Result::ERROR_SURFACE_LOST_KHR,
            ));
        }
        Ok(state.capabilities)
    }

    fn surface_formats(&self) -> Result<Vec<vk::SurfaceFormatKHR>, VulkanError> {
        Ok(self.state().formats.clone())
    }

    fn present_modes(&self) -> Result<Vec<vk::PresentModeKHR>, VulkanError> {
        Ok(vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX])
    }

    fn create_swapchain(
        &self,
        parameters: &SwapchainParameters,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<vk::SwapchainKHR, VulkanError> {
        let mut state = self.state();
        assert!(
            parameters.extent.width > 0 && parameters.extent.height > 0,
            "zero-area swapchain requested"
        );
        if old_swapchain != vk::SwapchainKHR::null() {
            assert!(
                state.retired_swapchains.insert(old_swapchain),
                "retired swapchain passed again as oldSwapchain"
            );
        }
        let raw = state
            .allocate(ObjectKind::Swapchain, true)
            .map_err(VulkanError::UnableToCreateSwapchain)?;
        let swapchain = vk::SwapchainKHR::from_raw(raw);
        state.swapchain_parameters.push(*parameters);
        state
            .swapchain_images
            .insert(swapchain, parameters.min_image_count);
        state.events.push(Event::SwapchainCreated {
            swapchain,
            old_swapchain,
        });
        Ok(swapchain)
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        let mut state = self.state();
        state.swapchain_images.remove(&swapchain);
        state.release(swapchain.as_raw(), ObjectKind::Swapchain);
    }

    fn swapchain_images(
        &self,
        swapchain: vk::SwapchainKHR,
    ) -> Result<Vec<vk::Image>, VulkanError> {
        let mut state = self.state();
        let count = state.swapchain_images[&swapchain];
        let images = (0..count)
            .map(|_| {
                let raw = state.next_handle;
                state.next_handle += 1;
                vk::Image::from_raw(raw)
            })
            .collect();
        Ok(images)
    }

    fn create_image_view(
        &self,
        _image: vk::Image,
        _format: vk::Format,
    ) -> Result<vk::ImageView, VulkanError> {
        self.state()
            .allocate(ObjectKind::ImageView, true)
            .map(vk::ImageView::from_raw)
            .map_err(VulkanError::UnableToCreateImageView)
    }

    unsafe fn destroy_image_view(&self, image_view: vk::ImageView) {
        self.state()
            .release(image_view.as_raw(), ObjectKind::ImageView);
    }

    fn create_framebuffer(
        &self,
        _render_pass: vk::RenderPass,
        _image_view: vk::ImageView,
        _extent: vk::Extent2D,
    ) -> Result<vk::Framebuffer, VulkanError> {
        self.state()
            .allocate(ObjectKind::Framebuffer, true)
            .map(vk::Framebuffer::from_raw)
            .map_err(VulkanError::UnableToCreateFramebuffer)
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.state()
            .release(framebuffer.as_raw(), ObjectKind::Framebuffer);
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        _timeout_ns: u64,
        _semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        let mut state = self.state();
        state.check_device()?;
        let scripted = state.acquire_script.pop_front();
        let suboptimal = match scripted {
            Some(Scripted::OutOfDate) => {
                return Err(vk::Result::ERROR_OUT_OF_DATE_KHR)
            }
            Some(Scripted::Timeout) => return Err(vk::Result::TIMEOUT),
            Some(Scripted::Fail(err)) => return Err(err),
            Some(Scripted::SubOptimal) => true,
            None => false,
        };
        let count = state.swapchain_images[&swapchain];
        let next = state.next_image.entry(swapchain).or_insert(0);
        let image_index = *next;
        *next = (*next + 1) % count;
        state.events.push(Event::Acquired {
            swapchain,
            image_index,
        });
        Ok((image_index, suboptimal))
    }

    fn queue_present(
        &self,
        _queue: vk::Queue,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        _wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool> {
        let mut state = self.state();
        state.check_device()?;
        match state.present_script.pop_front() {
            Some(Scripted::OutOfDate) => Err(vk::Result::ERROR_OUT_OF_DATE_KHR),
            Some(Scripted::Timeout) => Err(vk::Result::TIMEOUT),
            Some(Scripted::Fail(err)) => Err(err),
            scripted => {
                state.events.push(Event::Presented {
                    swapchain,
                    image_index,
                });
                Ok(scripted == Some(Scripted::SubOptimal))
            }
        }
    }
}
