use std::{slice, sync::Arc};

use ash::{prelude::VkResult, vk};

use crate::{RendererError, Result};

use super::Device;

/// The two semaphores ordering acquire, draw and present. Reused every frame.
pub struct FrameSync {
    pub image_acquired: vk::Semaphore,
    pub draw_complete: vk::Semaphore,
}

impl FrameSync {
    pub fn new(device: &Device) -> VkResult<Self> {
        let image_acquired = device.create_semaphore()?;
        let draw_complete = match device.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(err) => {
                unsafe { device.destroy_semaphore(image_acquired, None) };
                return Err(err);
            }
        };
        Ok(Self {
            image_acquired,
            draw_complete,
        })
    }

    pub fn destroy(&mut self, device: &Device) {
        unsafe {
            device.destroy_semaphore(self.image_acquired, None);
            device.destroy_semaphore(self.draw_complete, None);
        }
    }
}

/// Command pool, descriptor pool and frame semaphores, created together and
/// released in reverse on drop. Command buffers and descriptor sets allocated
/// from the pools go with them.
pub struct FramePools {
    pub command_pool: vk::CommandPool,
    pub descriptor_pool: vk::DescriptorPool,
    pub sync: FrameSync,
    device: Arc<Device>,
}

impl FramePools {
    /// Sizes the descriptor pool for one uniform buffer set per swapchain image.
    pub fn new(device: &Arc<Device>, image_count: u32) -> Result<Self> {
        // Null handles are valid to destroy, so Drop can clean up a partial build.
        let mut this = Self {
            command_pool: vk::CommandPool::null(),
            descriptor_pool: vk::DescriptorPool::null(),
            sync: FrameSync {
                image_acquired: vk::Semaphore::null(),
                draw_complete: vk::Semaphore::null(),
            },
            device: device.clone(),
        };

        this.command_pool = unsafe {
            device.create_command_pool(
                &vk::CommandPoolCreateInfo::default().queue_family_index(device.queue_family_idx),
                None,
            )?
        };

        let pool_size = vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(image_count);
        this.descriptor_pool = unsafe {
            device.create_descriptor_pool(
                &vk::DescriptorPoolCreateInfo::default()
                    .pool_sizes(slice::from_ref(&pool_size))
                    .max_sets(image_count),
                None,
            )?
        };

        this.sync = FrameSync::new(device)?;
        Ok(this)
    }

    pub fn allocate_command_buffers(&self, count: u32) -> VkResult<Vec<vk::CommandBuffer>> {
        unsafe {
            self.device.allocate_command_buffers(
                &vk::CommandBufferAllocateInfo::default()
                    .command_pool(self.command_pool)
                    .command_buffer_count(count)
                    .level(vk::CommandBufferLevel::PRIMARY),
            )
        }
    }
}

impl Drop for FramePools {
    fn drop(&mut self) {
        self.sync.destroy(&self.device);
        unsafe {
            self.device.destroy_descriptor_pool(self.descriptor_pool, None);
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    CommandsRecorded,
    Acquiring,
    Submitted,
    Presented,
}

/// Tracks where the renderer is in the record → acquire → submit → present cycle.
#[derive(Debug)]
pub struct FrameDriver {
    state: FrameState,
    image_idx: u32,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            state: FrameState::Idle,
            image_idx: 0,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    fn ensure(&self, operation: &'static str, allowed: &[FrameState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RendererError::FrameOrder {
                operation,
                state: self.state,
            })
        }
    }

    /// Command buffers are recorded exactly once.
    pub fn record(&mut self) -> Result<()> {
        self.ensure("record", &[FrameState::Idle])?;
        self.state = FrameState::CommandsRecorded;
        Ok(())
    }

    pub fn acquire(&mut self) -> Result<()> {
        self.ensure(
            "acquire",
            &[FrameState::CommandsRecorded, FrameState::Presented],
        )?;
        self.state = FrameState::Acquiring;
        Ok(())
    }

    pub fn submit(&mut self, image_idx: u32) -> Result<()> {
        self.ensure("submit", &[FrameState::Acquiring])?;
        self.image_idx = image_idx;
        self.state = FrameState::Submitted;
        Ok(())
    }

    /// Returns the image submitted last, which is the one to present.
    pub fn present(&mut self) -> Result<u32> {
        self.ensure("present", &[FrameState::Submitted])?;
        self.state = FrameState::Presented;
        Ok(self.image_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_repeats() {
        let mut driver = FrameDriver::new();
        assert_eq!(driver.state(), FrameState::Idle);
        driver.record().unwrap();

        for image_idx in [0, 1, 2, 0, 1] {
            driver.acquire().unwrap();
            assert_eq!(driver.state(), FrameState::Acquiring);
            driver.submit(image_idx).unwrap();
            assert_eq!(driver.state(), FrameState::Submitted);
            assert_eq!(driver.present().unwrap(), image_idx);
            assert_eq!(driver.state(), FrameState::Presented);
        }
    }

    #[test]
    fn rendering_before_recording_fails() {
        let mut driver = FrameDriver::new();
        let err = driver.acquire().unwrap_err();
        assert!(matches!(
            err,
            RendererError::FrameOrder {
                operation: "acquire",
                state: FrameState::Idle
            }
        ));
    }

    #[test]
    fn commands_are_recorded_once() {
        let mut driver = FrameDriver::new();
        driver.record().unwrap();
        assert!(driver.record().is_err());
        driver.acquire().unwrap();
        driver.submit(0).unwrap();
        driver.present().unwrap();
        assert!(driver.record().is_err());
    }

    #[test]
    fn present_requires_a_submit() {
        let mut driver = FrameDriver::new();
        driver.record().unwrap();
        assert!(driver.present().is_err());

        driver.acquire().unwrap();
        assert!(driver.present().is_err());
        assert!(driver.acquire().is_err());

        driver.submit(2).unwrap();
        assert!(driver.submit(2).is_err());
        assert_eq!(driver.present().unwrap(), 2);
        assert!(driver.present().is_err());
    }
}
