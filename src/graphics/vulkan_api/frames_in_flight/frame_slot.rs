use {
    crate::graphics::{
        vulkan_api::{
            FenceWait, FrameSubmission, GpuDevice, SyncPrimitivePool,
        },
        FrameError,
    },
    ash::vk::{self, Handle},
    scopeguard::{guard, ScopeGuard},
};

/// All of the per-frame resources for one buffered frame.
#[derive(Debug)]
pub(super) struct FrameSlot {
    index: usize,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    reuse_fence: vk::Fence,
    acquire_semaphore: vk::Semaphore,
    release_semaphore: vk::Semaphore,

    /// Set when the reuse fence was seen signaled, cleared by `reset`.
    fence_observed: bool,

    /// Set by `reset`, cleared once the commands are submitted.
    recording: bool,

    /// Set when the acquire semaphore was signaled by an acquire whose
    /// submission never reached the queue.
    acquire_unwaited: bool,

    /// Set when the release semaphore was signaled by a submission that was
    /// never presented, so nothing will ever wait on it.
    release_unwaited: bool,
}

impl FrameSlot {
    /// Create synchronization and command resources for a single buffered
    /// frame.
    ///
    /// The reuse fence starts signaled so the first wait returns
    /// immediately. If any creation fails, the objects created so far are
    /// released before the error is returned.
    pub fn new<D: GpuDevice>(
        device: &D,
        pool: &SyncPrimitivePool<D>,
        index: usize,
    ) -> Result<Self, FrameError> {
        let reuse_fence = guard(pool.new_fence(true)?, |fence| unsafe {
            // SAFE because the fence was never submitted
            pool.destroy_fence(fence)
        });
        let acquire_semaphore =
            guard(pool.new_semaphore()?, |semaphore| {
                pool.recycle_semaphore(semaphore)
            });
        let release_semaphore =
            guard(pool.new_semaphore()?, |semaphore| {
                pool.recycle_semaphore(semaphore)
            });
        let command_pool =
            guard(device.create_command_pool()?, |command_pool| unsafe {
                device.destroy_command_pool(command_pool)
            });
        let command_buffer = device.allocate_command_buffer(*command_pool)?;

        let names = [
            (
                vk::ObjectType::FENCE,
                reuse_fence.as_raw(),
                "Reuse Fence",
            ),
            (
                vk::ObjectType::SEMAPHORE,
                acquire_semaphore.as_raw(),
                "Image Acquired Semaphore",
            ),
            (
                vk::ObjectType::SEMAPHORE,
                release_semaphore.as_raw(),
                "Render Complete Semaphore",
            ),
            (
                vk::ObjectType::COMMAND_POOL,
                command_pool.as_raw(),
                "Command Pool",
            ),
            (
                vk::ObjectType::COMMAND_BUFFER,
                command_buffer.as_raw(),
                "Command Buffer",
            ),
        ];
        for (object_type, raw_handle, name) in names {
            device.name_object(
                object_type,
                raw_handle,
                &format!("Frame {} {}", index, name),
            );
        }

        Ok(Self {
            index,
            command_pool: ScopeGuard::into_inner(command_pool),
            command_buffer,
            reuse_fence: ScopeGuard::into_inner(reuse_fence),
            acquire_semaphore: ScopeGuard::into_inner(acquire_semaphore),
            release_semaphore: ScopeGuard::into_inner(release_semaphore),
            fence_observed: false,
            recording: false,
            acquire_unwaited: false,
            release_unwaited: false,
        })
    }

    /// Wait for this slot's last submission to complete.
    ///
    /// A slot which was reset but never submitted has no GPU work to wait
    /// for, so it is reusable right away.
    pub fn wait_until_reusable<D: GpuDevice>(
        &mut self,
        device: &D,
        timeout_ns: u64,
    ) -> Result<FenceWait, FrameError> {
        if self.fence_observed || self.recording {
            self.fence_observed = true;
            return Ok(FenceWait::Signaled);
        }
        let wait = device.wait_for_fence(self.reuse_fence, timeout_ns)?;
        if wait == FenceWait::Signaled {
            self.fence_observed = true;
        } else {
            log::trace!("Frame slot {} is still in flight", self.index);
        }
        Ok(wait)
    }

    /// Reset the reuse fence and command pool, then begin the command
    /// buffer.
    ///
    /// Fails without touching any resource if the reuse fence has not been
    /// observed signaled since the last submission.
    pub fn reset<D: GpuDevice>(&mut self, device: &D) -> Result<(), FrameError> {
        if !self.fence_observed {
            return Err(FrameError::ProtocolViolation(format!(
                "frame slot {} was reset before its previous submission was \
                 observed complete",
                self.index
            )));
        }
        device.reset_fence(self.reuse_fence)?;
        self.fence_observed = false;
        self.recording = true;
        device.reset_command_pool(self.command_pool)?;
        device.begin_command_buffer(self.command_buffer)?;
        Ok(())
    }

    /// Throw away whatever was recorded and begin the command buffer again.
    pub fn discard_recording<D: GpuDevice>(
        &mut self,
        device: &D,
    ) -> Result<(), FrameError> {
        debug_assert!(self.recording);
        device.reset_command_pool(self.command_pool)?;
        device.begin_command_buffer(self.command_buffer)?;
        Ok(())
    }

    /// End the command buffer and submit it.
    ///
    /// The submission waits for the acquire semaphore at the color attachment
    /// output stage, then signals the release semaphore and the reuse fence.
    pub fn submit<D: GpuDevice>(
        &mut self,
        device: &D,
        queue: vk::Queue,
    ) -> Result<(), FrameError> {
        if !self.recording {
            return Err(FrameError::ProtocolViolation(format!(
                "frame slot {} was submitted without being reset",
                self.index
            )));
        }
        device.end_command_buffer(self.command_buffer)?;
        device.submit_frame(&self.submission(queue))?;
        self.recording = false;
        Ok(())
    }

    /// Record that an image was acquired with this slot's acquire semaphore
    /// but no submission waited on it.
    pub fn mark_acquire_unwaited(&mut self) {
        self.acquire_unwaited = true;
    }

    /// Record that the release semaphore was signaled but the image was not
    /// presented.
    pub fn mark_release_unwaited(&mut self) {
        self.release_unwaited = true;
    }

    /// True when either semaphore holds a signal nobody will wait on.
    pub fn has_unwaited_semaphore(&self) -> bool {
        self.acquire_unwaited || self.release_unwaited
    }

    /// Swap signaled semaphores for fresh ones. Signaled semaphores are
    /// destroyed rather than recycled.
    ///
    /// # Safety
    ///
    /// The device must be idle.
    pub unsafe fn replace_unwaited_semaphores<D: GpuDevice>(
        &mut self,
        pool: &SyncPrimitivePool<D>,
    ) -> Result<(), FrameError> {
        if self.acquire_unwaited {
            let fresh = pool.new_semaphore()?;
            pool.destroy_semaphore(self.acquire_semaphore);
            self.acquire_semaphore = fresh;
            self.acquire_unwaited = false;
        }
        if self.release_unwaited {
            let fresh = pool.new_semaphore()?;
            pool.destroy_semaphore(self.release_semaphore);
            self.release_semaphore = fresh;
            self.release_unwaited = false;
        }
        Ok(())
    }

    /// Destroy the slot's command pool. The fence and semaphores go back to
    /// the pool, except for semaphores which hold a signal nobody will wait
    /// on.
    ///
    /// # Safety
    ///
    /// The caller must wait for all graphics commands which reference this
    /// slot to complete before calling this function.
    pub unsafe fn destroy<D: GpuDevice>(
        self,
        device: &D,
        pool: &SyncPrimitivePool<D>,
    ) {
        device.destroy_command_pool(self.command_pool);
        // a slot which is still recording reset its fence without submitting
        pool.recycle_fence(self.reuse_fence, !self.recording);
        if self.acquire_unwaited {
            pool.destroy_semaphore(self.acquire_semaphore);
        } else {
            pool.recycle_semaphore(self.acquire_semaphore);
        }
        if self.release_unwaited {
            pool.destroy_semaphore(self.release_semaphore);
        } else {
            pool.recycle_semaphore(self.release_semaphore);
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn acquire_semaphore(&self) -> vk::Semaphore {
        self.acquire_semaphore
    }

    pub fn release_semaphore(&self) -> vk::Semaphore {
        self.release_semaphore
    }

    pub fn reuse_fence(&self) -> vk::Fence {
        self.reuse_fence
    }
}

// Private API
// -----------

impl FrameSlot {
    fn submission(&self, queue: vk::Queue) -> FrameSubmission {
        FrameSubmission {
            queue,
            command_buffer: self.command_buffer,
            wait_semaphore: self.acquire_semaphore,
            wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            signal_semaphore: self.release_semaphore,
            fence: self.reuse_fence,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::graphics::vulkan_api::mock_device::{
            Event, MockDevice, ObjectKind,
        },
        std::sync::Arc,
    };

    fn slot(
        device: &Arc<MockDevice>,
    ) -> (FrameSlot, SyncPrimitivePool<MockDevice>) {
        let pool = SyncPrimitivePool::new(device.clone());
        let slot = FrameSlot::new(&**device, &pool, 0).unwrap();
        (slot, pool)
    }

    #[test]
    fn test_reset_before_wait_is_a_protocol_violation() {
        let device = MockDevice::new();
        let (mut slot, pool) = slot(&device);

        let err = slot.reset(&*device).unwrap_err();

        assert!(matches!(err, FrameError::ProtocolViolation(_)));
        assert!(device.events().is_empty());
        unsafe { slot.destroy(&*device, &pool) };
    }

    #[test]
    fn test_reset_requires_a_fresh_fence_observation() {
        let device = MockDevice::new();
        device.set_latency(5);
        let (mut slot, pool) = slot(&device);
        let queue = device.graphics_queue();

        assert_eq!(
            slot.wait_until_reusable(&*device, u64::MAX).unwrap(),
            FenceWait::Signaled
        );
        slot.reset(&*device).unwrap();
        slot.submit(&*device, queue).unwrap();

        // the previous observation was consumed by the first reset
        assert!(matches!(
            slot.reset(&*device),
            Err(FrameError::ProtocolViolation(_))
        ));

        // the submission completes 5 ticks later
        assert_eq!(
            slot.wait_until_reusable(&*device, 2).unwrap(),
            FenceWait::TimedOut
        );
        assert_eq!(
            slot.wait_until_reusable(&*device, u64::MAX).unwrap(),
            FenceWait::Signaled
        );
        assert_eq!(device.state().clock, 5);
        slot.reset(&*device).unwrap();
        slot.submit(&*device, queue).unwrap();

        device.wait_idle().unwrap();
        unsafe {
            slot.destroy(&*device, &pool);
            pool.teardown();
        }
        assert_eq!(device.live_count(), 0);
    }

    #[test]
    fn test_submission_uses_the_slot_primitives() {
        let device = MockDevice::new();
        let (mut slot, pool) = slot(&device);
        let queue = device.graphics_queue();

        slot.wait_until_reusable(&*device, u64::MAX).unwrap();
        slot.reset(&*device).unwrap();
        slot.submit(&*device, queue).unwrap();

        let submissions = device.submissions();
        assert_eq!(submissions.len(), 1);
        let submission = submissions[0];
        assert_eq!(submission.wait_semaphore, slot.acquire_semaphore());
        assert_eq!(submission.signal_semaphore, slot.release_semaphore());
        assert_eq!(submission.fence, slot.reuse_fence());
        assert_eq!(submission.command_buffer, slot.command_buffer());
        assert_eq!(
            submission.wait_stage,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        );

        let events = device.events();
        let reset_at = events
            .iter()
            .position(|e| *e == Event::FenceReset(slot.reuse_fence()))
            .unwrap();
        let waited_at = events
            .iter()
            .position(|e| matches!(e, Event::FenceWaited { .. }))
            .unwrap();
        assert!(waited_at < reset_at);

        device.wait_idle().unwrap();
        unsafe { slot.destroy(&*device, &pool) };
    }

    #[test]
    fn test_unsubmitted_slot_is_immediately_reusable() {
        let device = MockDevice::new();
        let (mut slot, pool) = slot(&device);

        slot.wait_until_reusable(&*device, u64::MAX).unwrap();
        slot.reset(&*device).unwrap();

        // the fence is unsignaled but no work will ever signal it
        assert_eq!(
            slot.wait_until_reusable(&*device, u64::MAX).unwrap(),
            FenceWait::Signaled
        );
        slot.reset(&*device).unwrap();
        let fence = slot.reuse_fence();

        unsafe { slot.destroy(&*device, &pool) };

        // the reset fence goes back to the pool as unsignaled
        assert_eq!(pool.recycled_fences(), 1);
        let resets_before = device.events().len();
        assert_eq!(pool.new_fence(false).unwrap(), fence);
        assert_eq!(device.events().len(), resets_before);
    }

    #[test]
    fn test_partial_creation_is_cleaned_up() {
        let device = MockDevice::new();
        device.fail_nth(ObjectKind::CommandPool, 1);
        let pool = SyncPrimitivePool::new(device.clone());

        let err = FrameSlot::new(&*device, &pool, 0).unwrap_err();

        assert!(matches!(err, FrameError::ResourceExhausted(_)));
        assert_eq!(device.live_of(ObjectKind::Fence), 0);
        assert_eq!(pool.recycled_semaphores(), 2);

        unsafe { pool.teardown() };
        assert_eq!(device.live_count(), 0);
    }
}
