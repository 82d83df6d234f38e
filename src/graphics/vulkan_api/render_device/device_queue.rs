use ash::vk;

/// A Vulkan queue and the family it was retrieved from.
#[derive(Debug, Clone, Copy)]
pub struct DeviceQueue {
    queue: vk::Queue,
    family_index: u32,
    queue_index: u32,
}

impl DeviceQueue {
    /// Wrap a queue retrieved by the device setup code.
    pub fn from_raw(
        queue: vk::Queue,
        family_index: u32,
        queue_index: u32,
    ) -> Self {
        Self {
            queue,
            family_index,
            queue_index,
        }
    }

    /// The raw queue handle.
    pub fn raw(&self) -> vk::Queue {
        self.queue
    }

    /// The family this queue belongs to.
    pub fn family_index(&self) -> u32 {
        self.family_index
    }

    /// The index of this queue within its family.
    pub fn queue_index(&self) -> u32 {
        self.queue_index
    }

    /// The distinct queue families which need access to swapchain images
    /// rendered on this queue and presented on `present_queue`.
    pub fn swapchain_family_indices(&self, present_queue: &Self) -> Vec<u32> {
        if self.family_index == present_queue.family_index {
            vec![self.family_index]
        } else {
            vec![self.family_index, present_queue.family_index]
        }
    }
}
