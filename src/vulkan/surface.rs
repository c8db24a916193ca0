use std::ops::Deref;

use ash::{khr, prelude::VkResult, vk};
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::Result;

use super::Instance;

pub struct Surface {
    pub loader: khr::surface::Instance,
    pub inner: vk::SurfaceKHR,
}

impl Deref for Surface {
    type Target = vk::SurfaceKHR;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceInfo {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
}

impl Surface {
    pub fn new(
        instance: &Instance,
        handle: &(impl HasDisplayHandle + HasWindowHandle),
    ) -> Result<Self> {
        let inner = unsafe {
            ash_window::create_surface(
                &instance.entry,
                instance,
                handle.display_handle()?.as_raw(),
                handle.window_handle()?.as_raw(),
                None,
            )?
        };

        let loader = khr::surface::Instance::new(&instance.entry, instance);

        Ok(Surface { inner, loader })
    }

    pub fn get_device_surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> VkResult<bool> {
        unsafe {
            self.loader.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                self.inner,
            )
        }
    }

    pub fn info(&self, physical_device: vk::PhysicalDevice) -> VkResult<SurfaceInfo> {
        let formats = unsafe {
            self.loader
                .get_physical_device_surface_formats(physical_device, self.inner)?
        };
        let capabilities = unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, self.inner)?
        };

        Ok(SurfaceInfo {
            capabilities,
            formats,
        })
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe { self.loader.destroy_surface(self.inner, None) };
    }
}
