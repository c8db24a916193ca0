use std::ffi::CStr;

use ash::{khr, prelude::VkResult, vk};
use log::{debug, info};

use crate::{select_preferred, utils, Limits, RendererError, Result, SelectionPolicy};

use super::{Instance, Surface};

pub struct Device {
    pub physical_device: vk::PhysicalDevice,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub device_properties: vk::PhysicalDeviceProperties,
    pub queue_family_idx: u32,
    pub queue: vk::Queue,
    pub device: ash::Device,
}

impl std::ops::Deref for Device {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

impl Device {
    /// Picks an adapter and a queue family through `policy` and opens a
    /// logical device with one queue and the swapchain extension.
    pub fn new(instance: &Instance, policy: &SelectionPolicy, limits: &Limits) -> Result<Self> {
        let physical_devices = utils::bounded(
            unsafe { instance.enumerate_physical_devices() }?,
            limits.max_adapters,
            "adapters",
        );
        let adapter_props: Vec<_> = physical_devices
            .iter()
            .map(|&pdevice| unsafe { instance.get_physical_device_properties(pdevice) })
            .collect();
        let adapter_idx = select_preferred(&adapter_props, policy.adapter, "adapters")?;
        let physical_device = physical_devices[adapter_idx];
        let device_properties = adapter_props[adapter_idx];

        let queue_families = utils::bounded(
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) },
            limits.max_queue_families,
            "queue families",
        );
        let queue_family_idx =
            select_preferred(&queue_families, policy.queue_family, "queue families")? as u32;
        debug!(
            "Queue family {queue_family_idx}: {:?}",
            queue_families[queue_family_idx as usize].queue_flags
        );

        let memory_properties =
            unsafe { instance.get_physical_device_memory_properties(physical_device) };

        let priorities = [0.0];
        let queue_info = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(queue_family_idx)
            .queue_priorities(&priorities);

        #[allow(unused_mut)]
        let mut extensions = vec![khr::swapchain::NAME.as_ptr()];
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        extensions.push(khr::portability_subset::NAME.as_ptr());

        let device_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(std::slice::from_ref(&queue_info))
            .enabled_extension_names(&extensions);
        let device = unsafe { instance.create_device(physical_device, &device_info, None) }?;
        let queue = unsafe { device.get_device_queue(queue_family_idx, 0) };

        let this = Self {
            physical_device,
            memory_properties,
            device_properties,
            queue_family_idx,
            queue,
            device,
        };
        info!("{}", this.get_info());
        Ok(this)
    }

    /// Fails unless the chosen queue family can present to `surface`.
    pub fn check_present_support(&self, surface: &Surface) -> Result<()> {
        if surface.get_device_surface_support(self.physical_device, self.queue_family_idx)? {
            Ok(())
        } else {
            Err(RendererError::PresentUnsupported {
                queue_family: self.queue_family_idx,
            })
        }
    }

    pub fn find_memory_type(
        &self,
        type_bits: u32,
        flags: vk::MemoryPropertyFlags,
    ) -> Result<u32> {
        utils::find_memory_type_index(&self.memory_properties, type_bits, flags)
            .ok_or(RendererError::NoSuitableMemoryType { type_bits, flags })
    }

    pub fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
        unsafe {
            self.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
        }
    }

    pub fn create_2d_view(&self, image: &vk::Image, format: vk::Format) -> VkResult<vk::ImageView> {
        unsafe {
            self.create_image_view(
                &vk::ImageViewCreateInfo::default()
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .image(*image)
                    .format(format)
                    .components(vk::ComponentMapping::default())
                    .subresource_range(super::BASE_IMAGE_RANGE),
                None,
            )
        }
    }

    pub fn get_info(&self) -> RendererInfo {
        RendererInfo {
            device_name: self.get_device_name().unwrap_or("<invalid utf-8>").to_string(),
            device_type: self.get_device_type().to_string(),
            vendor_name: self.get_vendor_name().to_string(),
        }
    }
    pub fn get_device_name(&self) -> Result<&str, std::str::Utf8Error> {
        unsafe { CStr::from_ptr(self.device_properties.device_name.as_ptr()) }.to_str()
    }
    pub fn get_device_type(&self) -> &str {
        device_type_name(self.device_properties.device_type)
    }
    pub fn get_vendor_name(&self) -> &str {
        vendor_name(self.device_properties.vendor_id)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe { self.device.destroy_device(None) };
    }
}

fn device_type_name(device_type: vk::PhysicalDeviceType) -> &'static str {
    match device_type {
        vk::PhysicalDeviceType::CPU => "CPU",
        vk::PhysicalDeviceType::INTEGRATED_GPU => "INTEGRATED_GPU",
        vk::PhysicalDeviceType::DISCRETE_GPU => "DISCRETE_GPU",
        vk::PhysicalDeviceType::VIRTUAL_GPU => "VIRTUAL_GPU",
        _ => "OTHER",
    }
}

fn vendor_name(vendor_id: u32) -> &'static str {
    match vendor_id {
        0x1002 => "AMD",
        0x1010 => "ImgTec",
        0x10DE => "NVIDIA Corporation",
        0x13B5 => "ARM",
        0x5143 => "Qualcomm",
        0x8086 => "INTEL Corporation",
        _ => "Unknown vendor",
    }
}

#[derive(Debug)]
pub struct RendererInfo {
    pub device_name: String,
    pub device_type: String,
    pub vendor_name: String,
}

impl std::fmt::Display for RendererInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Adapter: {} ({}, {})",
            self.device_name, self.device_type, self.vendor_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vendors_are_named() {
        assert_eq!(vendor_name(0x10DE), "NVIDIA Corporation");
        assert_eq!(vendor_name(0x8086), "INTEL Corporation");
        assert_eq!(vendor_name(0xdead), "Unknown vendor");
    }

    #[test]
    fn info_prints_on_one_line() {
        let info = RendererInfo {
            device_name: "llvmpipe".into(),
            device_type: device_type_name(vk::PhysicalDeviceType::CPU).into(),
            vendor_name: vendor_name(0x10005).into(),
        };
        assert_eq!(info.to_string(), "Adapter: llvmpipe (CPU, Unknown vendor)");
    }
}
