use {
    crate::graphics::vulkan_api::{GpuDevice, VulkanError},
    ash::vk,
    std::{
        cell::{Cell, RefCell},
        sync::Arc,
    },
};

/// A pool which allocates fences and binary semaphores and keeps released
/// primitives around for re-use.
///
/// Methods take `&self` so multi-step constructors can hold several cleanup
/// guards which all reference the pool at once.
pub struct SyncPrimitivePool<D: GpuDevice> {
    /// Each fence is stored with whether it is currently signaled.
    recycled_fences: RefCell<Vec<(vk::Fence, bool)>>,
    recycled_semaphores: RefCell<Vec<vk::Semaphore>>,
    live_fences: Cell<usize>,
    live_semaphores: Cell<usize>,
    device: Arc<D>,
}

// Public API
// ----------

impl<D: GpuDevice> SyncPrimitivePool<D> {
    /// Create a new, empty pool.
    pub fn new(device: Arc<D>) -> Self {
        Self {
            recycled_fences: RefCell::new(vec![]),
            recycled_semaphores: RefCell::new(vec![]),
            live_fences: Cell::new(0),
            live_semaphores: Cell::new(0),
            device,
        }
    }

    /// Get a fence in the requested state.
    ///
    /// Recycled fences in the same state are used first. A request for an
    /// unsignaled fence can also take a recycled signaled fence and reset it.
    /// Otherwise a new fence is created.
    pub fn new_fence(&self, signaled: bool) -> Result<vk::Fence, VulkanError> {
        let (matching, resettable) = {
            let recycled = self.recycled_fences.borrow();
            (
                recycled.iter().position(|&(_, state)| state == signaled),
                recycled.iter().position(|&(_, state)| state),
            )
        };
        if let Some(position) = matching {
            return Ok(self.recycled_fences.borrow_mut().remove(position).0);
        }
        if let (false, Some(position)) = (signaled, resettable) {
            let (fence, _) = self.recycled_fences.borrow_mut().remove(position);
            if let Err(err) = self.device.reset_fence(fence) {
                self.recycled_fences.borrow_mut().push((fence, true));
                return Err(err);
            }
            return Ok(fence);
        }
        let fence = self.device.create_fence(signaled)?;
        self.live_fences.set(self.live_fences.get() + 1);
        Ok(fence)
    }

    /// Get a semaphore from the pool, or create a new one if none are
    /// available.
    pub fn new_semaphore(&self) -> Result<vk::Semaphore, VulkanError> {
        if let Some(recycled) = self.recycled_semaphores.borrow_mut().pop() {
            return Ok(recycled);
        }
        let semaphore = self.device.create_semaphore()?;
        self.live_semaphores.set(self.live_semaphores.get() + 1);
        Ok(semaphore)
    }

    /// Destroy a fence created by this pool.
    ///
    /// # Safety
    ///
    /// The fence must not be referenced by any pending submission.
    pub unsafe fn destroy_fence(&self, fence: vk::Fence) {
        self.device.destroy_fence(fence);
        self.live_fences.set(self.live_fences.get() - 1);
    }

    /// Destroy a semaphore created by this pool.
    ///
    /// # Safety
    ///
    /// The semaphore must not be referenced by any pending GPU operation.
    pub unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.device.destroy_semaphore(semaphore);
        self.live_semaphores.set(self.live_semaphores.get() - 1);
    }

    /// Return a fence to the pool for future use.
    ///
    /// # Params
    ///
    /// * `signaled` - the fence's current state
    ///
    /// # Safety
    ///
    /// The fence must not be referenced by any pending submission.
    pub unsafe fn recycle_fence(&self, fence: vk::Fence, signaled: bool) {
        self.recycled_fences.borrow_mut().push((fence, signaled));
    }

    /// Return a semaphore to the pool for future use.
    ///
    /// The semaphore must be unsignaled and have no pending wait operation,
    /// otherwise the next owner would observe a stale signal.
    pub fn recycle_semaphore(&self, semaphore: vk::Semaphore) {
        self.recycled_semaphores.borrow_mut().push(semaphore);
    }

    /// The number of fences created by this pool which have not been
    /// destroyed.
    pub fn live_fences(&self) -> usize {
        self.live_fences.get()
    }

    /// The number of semaphores created by this pool which have not been
    /// destroyed. Recycled semaphores are still live.
    pub fn live_semaphores(&self) -> usize {
        self.live_semaphores.get()
    }

    /// The number of fences waiting to be re-used.
    pub fn recycled_fences(&self) -> usize {
        self.recycled_fences.borrow().len()
    }

    /// The number of semaphores waiting to be re-used.
    pub fn recycled_semaphores(&self) -> usize {
        self.recycled_semaphores.borrow().len()
    }

    /// Destroy every recycled fence and semaphore.
    ///
    /// # Safety
    ///
    /// Recycled primitives are never referenced by the GPU, but the caller
    /// must not hand out primitives from this pool while tearing it down.
    pub unsafe fn teardown(&self) {
        let fences: Vec<(vk::Fence, bool)> =
            self.recycled_fences.borrow_mut().drain(..).collect();
        for (fence, _) in fences {
            self.destroy_fence(fence);
        }
        let recycled: Vec<vk::Semaphore> =
            self.recycled_semaphores.borrow_mut().drain(..).collect();
        for semaphore in recycled {
            self.destroy_semaphore(semaphore);
        }
        if self.live_fences() > 0 || self.live_semaphores() > 0 {
            log::warn!(
                "Sync pool torn down with {} fences and {} semaphores still \
                 live",
                self.live_fences(),
                self.live_semaphores()
            );
        }
    }
}
