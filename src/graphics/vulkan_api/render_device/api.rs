use {
    super::{
        FenceWait, FrameSubmission, GpuDevice, RenderDevice,
        SwapchainParameters,
    },
    crate::graphics::vulkan_api::VulkanError,
    ash::{prelude::VkResult, vk},
    std::ffi::CString,
};

impl GpuDevice for RenderDevice {
    fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue.raw()
    }

    fn present_queue(&self) -> vk::Queue {
        self.present_queue.raw()
    }

    fn swapchain_queue_family_indices(&self) -> Vec<u32> {
        self.graphics_queue
            .swapchain_family_indices(&self.present_queue)
    }

    fn wait_idle(&self) -> Result<(), VulkanError> {
        unsafe {
            self.logical_device
                .device_wait_idle()
                .map_err(VulkanError::UnableToWaitForDeviceToIdle)
        }
    }

    fn name_object(
        &self,
        object_type: vk::ObjectType,
        raw_handle: u64,
        name: &str,
    ) {
        let Some(debug_utils) = self.debug_utils.as_ref() else {
            return;
        };
        let Ok(cname) = CString::new(name) else {
            log::warn!("Debug name {:?} contains a nul byte", name);
            return;
        };
        let name_info = vk::DebugUtilsObjectNameInfoEXT {
            object_type,
            object_handle: raw_handle,
            p_object_name: cname.as_ptr(),
            ..Default::default()
        };
        let result = unsafe {
            debug_utils.set_debug_utils_object_name(
                self.logical_device.handle(),
                &name_info,
            )
        };
        if let Err(err) = result {
            log::warn!("Unable to set debug name {:?}: {:?}", name, err);
        }
    }

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence, VulkanError> {
        let create_info = vk::FenceCreateInfo {
            flags: if signaled {
                vk::FenceCreateFlags::SIGNALED
            } else {
                vk::FenceCreateFlags::empty()
            },
            ..Default::default()
        };
        unsafe {
            self.logical_device
                .create_fence(&create_info, None)
                .map_err(VulkanError::UnableToCreateFence)
        }
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        self.logical_device.destroy_fence(fence, None)
    }

    fn wait_for_fence(
        &self,
        fence: vk::Fence,
        timeout_ns: u64,
    ) -> Result<FenceWait, VulkanError> {
        let result = unsafe {
            self.logical_device
                .wait_for_fences(&[fence], true, timeout_ns)
        };
        match result {
            Ok(()) => Ok(FenceWait::Signaled),
            Err(vk::Result::TIMEOUT) => Ok(FenceWait::TimedOut),
            Err(err) => Err(VulkanError::UnexpectedFenceWaitError(err)),
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<(), VulkanError> {
        unsafe {
            self.logical_device
                .reset_fences(&[fence])
                .map_err(VulkanError::UnexpectedFenceResetError)
        }
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore, VulkanError> {
        let create_info = vk::SemaphoreCreateInfo::default();
        unsafe {
            self.logical_device
                .create_semaphore(&create_info, None)
                .map_err(VulkanError::UnableToCreateSemaphore)
        }
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.logical_device.destroy_semaphore(semaphore, None)
    }

    fn create_command_pool(&self) -> Result<vk::CommandPool, VulkanError> {
        let create_info = vk::CommandPoolCreateInfo {
            flags: vk::CommandPoolCreateFlags::TRANSIENT,
            queue_family_index: self.graphics_queue.family_index(),
            ..Default::default()
        };
        unsafe {
            self.logical_device
                .create_command_pool(&create_info, None)
                .map_err(VulkanError::UnableToCreateCommandPool)
        }
    }

    unsafe fn destroy_command_pool(&self, command_pool: vk::CommandPool) {
        self.logical_device.destroy_command_pool(command_pool, None)
    }

    fn allocate_command_buffer(
        &self,
        command_pool: vk::CommandPool,
    ) -> Result<vk::CommandBuffer, VulkanError> {
        let allocate_info = vk::CommandBufferAllocateInfo {
            command_pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: 1,
            ..Default::default()
        };
        let command_buffers = unsafe {
            self.logical_device
                .allocate_command_buffers(&allocate_info)
                .map_err(VulkanError::UnableToAllocateCommandBuffer)?
        };
        command_buffers.first().copied().ok_or(
            VulkanError::UnableToAllocateCommandBuffer(
                vk::Result::ERROR_UNKNOWN,
            ),
        )
    }

    fn reset_command_pool(
        &self,
        command_pool: vk::CommandPool,
    ) -> Result<(), VulkanError> {
        unsafe {
            self.logical_device
                .reset_command_pool(
                    command_pool,
                    vk::CommandPoolResetFlags::empty(),
                )
                .map_err(VulkanError::UnableToResetCommandPool)
        }
    }

    fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError> {
        let begin_info = vk::CommandBufferBeginInfo {
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            ..Default::default()
        };
        unsafe {
            self.logical_device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::UnableToBeginCommandBuffer)
        }
    }

    fn end_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError> {
        unsafe {
            self.logical_device
                .end_command_buffer(command_buffer)
                .map_err(VulkanError::UnableToEndCommandBuffer)
        }
    }

    fn submit_frame(
        &self,
        submission: &FrameSubmission,
    ) -> Result<(), VulkanError> {
        let submit_info = vk::SubmitInfo {
            wait_semaphore_count: 1,
            p_wait_semaphores: &submission.wait_semaphore,
            p_wait_dst_stage_mask: &submission.wait_stage,
            command_buffer_count: 1,
            p_command_buffers: &submission.command_buffer,
            signal_semaphore_count: 1,
            p_signal_semaphores: &submission.signal_semaphore,
            ..Default::default()
        };
        unsafe {
            self.logical_device
                .queue_submit(
                    submission.queue,
                    &[submit_info],
                    submission.fence,
                )
                .map_err(VulkanError::UnableToSubmitCommands)
        }
    }

    fn surface_capabilities(
        &self,
    ) -> Result<vk::SurfaceCapabilitiesKHR, VulkanError> {
        self.window_surface.capabilities(self.physical_device)
    }

    fn surface_formats(&self) -> Result<Vec<vk::SurfaceFormatKHR>, VulkanError> {
        self.window_surface.formats(self.physical_device)
    }

    fn present_modes(&self) -> Result<Vec<vk::PresentModeKHR>, VulkanError> {
        self.window_surface.present_modes(self.physical_device)
    }

    fn create_swapchain(
        &self,
        parameters: &SwapchainParameters,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<vk::SwapchainKHR, VulkanError> {
        let indices = self.swapchain_queue_family_indices();
        let mut create_info = vk::SwapchainCreateInfoKHR {
            surface: self.window_surface.raw(),

            // image settings
            image_format: parameters.surface_format.format,
            image_color_space: parameters.surface_format.color_space,
            image_extent: parameters.extent,
            min_image_count: parameters.min_image_count,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,

            // window system presentation settings
            present_mode: parameters.present_mode,
            composite_alpha: parameters.composite_alpha,
            pre_transform: parameters.pre_transform,
            old_swapchain,
            clipped: vk::TRUE,

            ..Default::default()
        };
        if indices.len() == 1 {
            create_info.image_sharing_mode = vk::SharingMode::EXCLUSIVE;
        } else {
            create_info.image_sharing_mode = vk::SharingMode::CONCURRENT;
            create_info.p_queue_family_indices = indices.as_ptr();
            create_info.queue_family_index_count = indices.len() as u32;
        }
        unsafe {
            self.swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(VulkanError::UnableToCreateSwapchain)
        }
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        self.swapchain_loader.destroy_swapchain(swapchain, None)
    }

    fn swapchain_images(
        &self,
        swapchain: vk::SwapchainKHR,
    ) -> Result<Vec<vk::Image>, VulkanError> {
        unsafe {
            self.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::UnableToGetSwapchainImages)
        }
    }

    fn create_image_view(
        &self,
        image: vk::Image,
        format: vk::Format,
    ) -> Result<vk::ImageView, VulkanError> {
        let create_info = vk::ImageViewCreateInfo {
            image,
            format,
            view_type: vk::ImageViewType::TYPE_2D,
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
            components: vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            },
            ..Default::default()
        };
        unsafe {
            self.logical_device
                .create_image_view(&create_info, None)
                .map_err(VulkanError::UnableToCreateImageView)
        }
    }

    unsafe fn destroy_image_view(&self, image_view: vk::ImageView) {
        self.logical_device.destroy_image_view(image_view, None)
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        image_view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> Result<vk::Framebuffer, VulkanError> {
        let create_info = vk::FramebufferCreateInfo {
            render_pass,
            attachment_count: 1,
            p_attachments: &image_view,
            width: extent.width,
            height: extent.height,
            layers: 1,
            ..Default::default()
        };
        unsafe {
            self.logical_device
                .create_framebuffer(&create_info, None)
                .map_err(VulkanError::UnableToCreateFramebuffer)
        }
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.logical_device.destroy_framebuffer(framebuffer, None)
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout_ns: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        unsafe {
            self.swapchain_loader.acquire_next_image(
                swapchain,
                timeout_ns,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    fn queue_present(
        &self,
        queue: vk::Queue,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool> {
        let present_info = vk::PresentInfoKHR {
            wait_semaphore_count: 1,
            p_wait_semaphores: &wait_semaphore,
            swapchain_count: 1,
            p_swapchains: &swapchain,
            p_image_indices: &image_index,
            ..Default::default()
        };
        unsafe { self.swapchain_loader.queue_present(queue, &present_info) }
    }
}
