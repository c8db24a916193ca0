use std::sync::Arc;

use ash::vk;

use crate::{RendererError, Result};

use super::Device;

/// A buffer backed by its own host-visible, host-coherent allocation.
pub struct Buffer {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: u64,
    pub(super) device: Arc<Device>,
}

impl Buffer {
    /// Creates a buffer of exactly `size` bytes and uploads `data` into it if given.
    /// A `size` of zero is rejected before anything is created.
    pub fn new(
        device: &Arc<Device>,
        usage: vk::BufferUsageFlags,
        data: Option<&[u8]>,
        size: u64,
    ) -> Result<Self> {
        if size == 0 {
            return Err(RendererError::EmptyBuffer { usage });
        }
        let buffer = unsafe {
            device.create_buffer(
                &vk::BufferCreateInfo::default()
                    .size(size)
                    .usage(usage)
                    .sharing_mode(vk::SharingMode::EXCLUSIVE),
                None,
            )?
        };
        let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory_type_index = match device.find_memory_type(
            mem_requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        ) {
            Ok(index) => index,
            Err(err) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(err);
            }
        };

        let allocate_info = vk::MemoryAllocateInfo::default()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);
        let memory = match unsafe { device.allocate_memory(&allocate_info, None) } {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(err.into());
            }
        };

        // From here on Drop cleans up both handles.
        let mut this = Self {
            buffer,
            memory,
            size,
            device: device.clone(),
        };
        unsafe { device.bind_buffer_memory(buffer, memory, 0)? };

        if let Some(data) = data {
            this.buffer_data(data)?;
        }
        Ok(this)
    }

    /// Overwrites the first `data.len()` bytes.
    ///
    /// Nothing waits for the GPU here. The caller must make sure no submitted
    /// work still reads the range.
    pub fn buffer_data(&mut self, data: &[u8]) -> Result<()> {
        let len = data.len() as u64;
        if len > self.size {
            return Err(RendererError::BufferOverflow {
                len,
                capacity: self.size,
            });
        }
        if len == 0 {
            return Ok(());
        }
        unsafe {
            let ptr = self
                .device
                .map_memory(self.memory, 0, len, vk::MemoryMapFlags::empty())?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.cast::<u8>(), data.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Copies the whole buffer back to the host.
    pub fn read_back(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.size as usize];
        if out.is_empty() {
            return Ok(out);
        }
        unsafe {
            let ptr = self
                .device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())?;
            std::ptr::copy_nonoverlapping(ptr.cast::<u8>(), out.as_mut_ptr(), out.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(out)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.free_memory(self.memory, None);
            self.device.destroy_buffer(self.buffer, None);
        }
    }
}
