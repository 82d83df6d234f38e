mod callbacks;
mod frame_slot;


use {
    self::frame_slot::FrameSlot,
    crate::{
        config::FrameConfig,
        graphics::{
            vulkan_api::{
                selection, AcquireStatus, FenceWait, GpuDevice, PresentStatus,
                RenderDevice, SwapchainDescriptor, SwapchainManager,
                SyncPrimitivePool,
            },
            FrameError,
        },
    },
    anyhow::Context,
    ash::vk,
    std::{sync::Arc, time::Duration},
};

pub use self::callbacks::{
    CleanupHook, FrameHooks, FrameRecorder, FrameTarget, PrepareHook,
};

/// The lifecycle state of a FrameScheduler.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerState {
    /// Frames are being acquired, recorded, and presented.
    Running,

    /// The swapchain is being rebuilt.
    Rebuilding,

    /// Every resource has been released. Terminal.
    Destroyed,
}

/// Details about a frame which was submitted and presented.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameReport {
    pub slot_index: usize,
    pub image_index: u32,

    /// The swapchain generation the image was acquired from.
    pub generation: u64,

    /// True when the swapchain was rebuilt at any point during the tick.
    pub rebuilt: bool,
}

/// The result of a call to FrameScheduler::advance.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// The frame was recorded, submitted, and queued for presentation.
    Presented(FrameReport),

    /// The surface has zero area, usually because the window is minimized.
    /// Nothing was acquired or submitted.
    Deferred,

    /// A bounded wait expired before the frame slot or a swapchain image
    /// became available. Nothing was submitted and the current slot did not
    /// change.
    TimedOut,
}

/// Drives buffered frames from acquisition through presentation.
///
/// The scheduler owns one [`FrameSlot`] per buffered frame and the swapchain.
/// Each call to `advance` waits for the current slot's previous submission,
/// acquires a swapchain image, calls the recorder, submits, presents, and
/// moves on to the next slot. Out-of-date and suboptimal swapchains are
/// rebuilt along the way.
///
/// The number of slots follows the swapchain image count, which is the
/// configured buffering depth clamped to the surface limits.
pub struct FrameScheduler<D: GpuDevice = RenderDevice> {
    state: SchedulerState,
    current_slot: usize,
    needs_rebuild: bool,
    requested_extent: vk::Extent2D,
    slots: Vec<FrameSlot>,
    sync_pool: SyncPrimitivePool<D>,
    swapchain: SwapchainManager<D>,
    recorder: Box<dyn FrameRecorder>,
    hooks: FrameHooks,
    config: FrameConfig,
    device: Arc<D>,
}

// Public API
// ----------

impl<D: GpuDevice> FrameScheduler<D> {
    /// Create every per-frame resource and build the first swapchain.
    ///
    /// If the surface currently has zero area the first build is deferred
    /// until a call to `advance` sees a usable extent.
    ///
    /// # Params
    ///
    /// * `device` - used to create and destroy every resource
    /// * `config` - validated before anything is created
    /// * `render_pass` - each swapchain framebuffer targets this render pass.
    ///   It must have a single color attachment and outlive the scheduler.
    /// * `recorder` - called once per presented frame to record commands
    /// * `hooks` - optional callbacks around swapchain rebuilds
    pub fn new<R>(
        device: Arc<D>,
        config: &FrameConfig,
        render_pass: vk::RenderPass,
        recorder: R,
        hooks: FrameHooks,
    ) -> Result<Self, FrameError>
    where
        R: FrameRecorder + 'static,
    {
        config.validate()?;

        // Dropping a partly built scheduler releases whatever was created.
        let mut scheduler = Self {
            state: SchedulerState::Running,
            current_slot: 0,
            needs_rebuild: true,
            requested_extent: config.initial_extent(),
            slots: vec![],
            sync_pool: SyncPrimitivePool::new(device.clone()),
            swapchain: SwapchainManager::new(device.clone(), render_pass),
            recorder: Box::new(recorder),
            hooks,
            config: config.clone(),
            device,
        };
        for index in 0..config.buffering_depth as usize {
            let slot = FrameSlot::new(
                &*scheduler.device,
                &scheduler.sync_pool,
                index,
            )?;
            scheduler.slots.push(slot);
        }

        if !scheduler.rebuild()? {
            log::warn!("Surface has zero area, swapchain creation deferred");
        }
        Ok(scheduler)
    }

    /// Run one frame using the configured timeouts.
    pub fn advance(&mut self) -> Result<FrameStatus, FrameError> {
        let fence_timeout = to_nanos(self.config.fence_timeout());
        let acquire_timeout = to_nanos(self.config.acquire_timeout());
        self.advance_inner(fence_timeout, acquire_timeout)
    }

    /// Run one frame, giving up with `FrameStatus::TimedOut` if either the
    /// frame slot or the next swapchain image isn't available in time.
    pub fn advance_with_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<FrameStatus, FrameError> {
        let timeout_ns = to_nanos(Some(timeout));
        self.advance_inner(timeout_ns, timeout_ns)
    }

    /// Set the logical window size. Only used when the surface lets the
    /// swapchain decide its extent. The swapchain is rebuilt on the next
    /// tick.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.requested_extent = vk::Extent2D { width, height };
        self.invalidate_swapchain();
    }

    /// Force the swapchain to be rebuilt the next time a frame is requested.
    ///
    /// This can be useful in cases where it's known that the swapchain will
    /// need to be rebuilt (like when the application window is resized).
    pub fn invalidate_swapchain(&mut self) {
        self.needs_rebuild = true;
    }

    /// Wait for the device to idle, then destroy every resource. Later calls
    /// do nothing. Also called when the scheduler is dropped.
    pub fn destroy(&mut self) {
        if self.state == SchedulerState::Destroyed {
            return;
        }
        if let Err(err) = self.device.wait_idle() {
            log::warn!("Error waiting for the device to idle: {}", err);
        }
        if self.swapchain.is_built() {
            if let Err(err) = self.run_cleanup_hook() {
                log::warn!("{:?}", err);
            }
        }
        unsafe {
            // SAFE because the device is idle
            for slot in self.slots.drain(..) {
                slot.destroy(&*self.device, &self.sync_pool);
            }
            self.sync_pool.teardown();
            self.swapchain.teardown();
        }
        self.state = SchedulerState::Destroyed;
        log::debug!("Frame scheduler destroyed");
    }

    /// The current swapchain extent. Zero before the first build.
    pub fn current_extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// The current swapchain image format. `UNDEFINED` before the first
    /// build.
    pub fn current_format(&self) -> vk::Format {
        self.swapchain.format()
    }

    /// The number of swapchain builds so far.
    pub fn generation(&self) -> u64 {
        self.swapchain.generation()
    }

    /// The number of frame slots.
    pub fn buffering_depth(&self) -> usize {
        self.slots.len()
    }

    /// The slot the next call to `advance` will use.
    pub fn current_slot_index(&self) -> usize {
        self.current_slot
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The properties of the current swapchain, if it is built.
    pub fn swapchain_descriptor(&self) -> Option<&SwapchainDescriptor> {
        self.swapchain.descriptor()
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }
}

impl<D: GpuDevice> Drop for FrameScheduler<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

// Private API
// -----------

impl<D: GpuDevice> FrameScheduler<D> {
    fn advance_inner(
        &mut self,
        fence_timeout: u64,
        acquire_timeout: u64,
    ) -> Result<FrameStatus, FrameError> {
        if self.state == SchedulerState::Destroyed {
            return Err(FrameError::ProtocolViolation(
                "advance called after the frame scheduler was destroyed"
                    .to_owned(),
            ));
        }

        let extent = self.swapchain.surface_extent(self.requested_extent)?;
        if selection::is_zero_area(extent) {
            log::trace!("Surface extent is {:?}, frame deferred", extent);
            return Ok(FrameStatus::Deferred);
        }

        let mut rebuilt = false;
        if self.needs_rebuild || !self.swapchain.is_built() {
            if !self.rebuild()? {
                return Ok(FrameStatus::Deferred);
            }
            rebuilt = true;
        }

        let mut retried_out_of_date = false;
        let (slot_index, image) = loop {
            let slot_index = self.current_slot;
            let slot = &mut self.slots[slot_index];
            if slot.wait_until_reusable(&*self.device, fence_timeout)?
                == FenceWait::TimedOut
            {
                log::warn!("Timed out waiting for frame slot {}", slot_index);
                return Ok(FrameStatus::TimedOut);
            }

            let acquire_semaphore = slot.acquire_semaphore();
            match self
                .swapchain
                .acquire_next(acquire_semaphore, acquire_timeout)?
            {
                AcquireStatus::Ready(image) => break (slot_index, image),
                AcquireStatus::SubOptimal(image) => {
                    self.needs_rebuild = true;
                    break (slot_index, image);
                }
                AcquireStatus::TimedOut => {
                    log::warn!("Timed out acquiring a swapchain image");
                    return Ok(FrameStatus::TimedOut);
                }
                AcquireStatus::OutOfDate => {
                    if retried_out_of_date {
                        self.needs_rebuild = true;
                        return Err(FrameError::PresentationFailed {
                            generation: self.swapchain.generation(),
                        });
                    }
                    retried_out_of_date = true;
                    if !self.rebuild()? {
                        return Ok(FrameStatus::Deferred);
                    }
                    rebuilt = true;
                }
            }
        };

        let device = self.device.clone();
        let slot = &mut self.slots[slot_index];
        slot.reset(&*device)?;
        let target = FrameTarget {
            command_buffer: slot.command_buffer(),
            framebuffer: self.swapchain.framebuffer(&image)?,
            image_index: image.index(),
            extent: self.swapchain.extent(),
            slot_index,
            generation: image.generation(),
        };
        let recorded = self.recorder.record(&target).with_context(|| {
            format!("Error recording commands for frame slot {}", slot_index)
        });

        if let Err(err) = recorded {
            // The acquire semaphore is already pending a signal, so an empty
            // submission still has to consume it. The image can't be
            // presented, which leaves it acquired until the next rebuild.
            slot.discard_recording(&*device)?;
            let submitted = slot.submit(&*device, device.graphics_queue());
            if let Err(submit_err) = submitted {
                slot.mark_acquire_unwaited();
                self.needs_rebuild = true;
                return Err(submit_err);
            }
            slot.mark_release_unwaited();
            self.needs_rebuild = true;
            self.current_slot = (slot_index + 1) % self.slots.len();
            return Err(FrameError::Callback(err));
        }

        if let Err(err) = slot.submit(&*device, device.graphics_queue()) {
            // nothing will consume the pending acquire signal
            slot.mark_acquire_unwaited();
            self.needs_rebuild = true;
            return Err(err);
        }
        let release_semaphore = slot.release_semaphore();
        let status = self.swapchain.present(
            device.present_queue(),
            &image,
            release_semaphore,
        )?;
        if status != PresentStatus::Ready {
            self.needs_rebuild = true;
        }

        self.current_slot = (slot_index + 1) % self.slots.len();
        log::trace!(
            "Presented image {} from frame slot {}",
            image.index(),
            slot_index
        );

        if self.needs_rebuild && self.rebuild()? {
            rebuilt = true;
        }

        Ok(FrameStatus::Presented(FrameReport {
            slot_index,
            image_index: image.index(),
            generation: image.generation(),
            rebuilt,
        }))
    }

    /// Rebuild the swapchain and resize the slot array to match.
    ///
    /// Returns false when the surface has zero area. The rebuild stays
    /// pending in that case, and also when the rebuild fails.
    fn rebuild(&mut self) -> Result<bool, FrameError> {
        self.state = SchedulerState::Rebuilding;
        let result = self.rebuild_inner();
        self.state = SchedulerState::Running;
        result
    }

    fn rebuild_inner(&mut self) -> Result<bool, FrameError> {
        self.needs_rebuild = true;

        let extent = self.swapchain.surface_extent(self.requested_extent)?;
        if selection::is_zero_area(extent) {
            log::debug!("Surface extent is {:?}, rebuild deferred", extent);
            return Ok(false);
        }

        self.device.wait_idle()?;
        for slot in &mut self.slots {
            if slot.has_unwaited_semaphore() {
                unsafe {
                    // SAFE because the device is idle
                    slot.replace_unwaited_semaphores(&self.sync_pool)?;
                }
            }
        }

        if self.swapchain.is_built() {
            self.run_cleanup_hook()?;
        }

        let built = unsafe {
            // SAFE because the device is idle
            self.swapchain.build(
                self.config.buffering_depth,
                self.config.preferred_surface_format(),
                self.requested_extent,
            )?
        };
        let descriptor = match built {
            Some(descriptor) => descriptor,
            None => return Ok(false),
        };

        self.resize_slots(descriptor.image_count as usize)?;

        if let Some(on_prepare) = self.hooks.on_prepare.as_mut() {
            on_prepare(&descriptor)
                .context("Error in the swapchain prepare hook")
                .map_err(FrameError::Callback)?;
        }

        self.needs_rebuild = false;
        Ok(true)
    }

    /// Grow or shrink the slot array, keeping the slots which survive.
    fn resize_slots(&mut self, count: usize) -> Result<(), FrameError> {
        if count != self.slots.len() {
            log::debug!(
                "Resizing frame slots from {} to {}",
                self.slots.len(),
                count
            );
        }
        while self.slots.len() > count {
            if let Some(slot) = self.slots.pop() {
                unsafe {
                    // SAFE because rebuilds only happen while the device is
                    // idle
                    slot.destroy(&*self.device, &self.sync_pool);
                }
            }
        }
        while self.slots.len() < count {
            let index = self.slots.len();
            let slot = FrameSlot::new(&*self.device, &self.sync_pool, index)?;
            self.slots.push(slot);
        }
        if self.current_slot >= self.slots.len() {
            self.current_slot = 0;
        }
        Ok(())
    }

    fn run_cleanup_hook(&mut self) -> Result<(), FrameError> {
        if let Some(on_cleanup) = self.hooks.on_cleanup.as_mut() {
            on_cleanup()
                .context("Error in the swapchain cleanup hook")
                .map_err(FrameError::Callback)?;
        }
        Ok(())
    }
}

/// Convert an optional timeout to the nanosecond count used by fence waits
/// and image acquisition. `None` waits forever.
fn to_nanos(timeout: Option<Duration>) -> u64 {
    timeout
        .map(|timeout| u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(u64::MAX)
}
