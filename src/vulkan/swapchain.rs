use std::{slice, sync::Arc};

use ash::{khr, prelude::VkResult, vk};
use log::{debug, warn};

use crate::{select_preferred, utils, Limits, Result, SelectionPolicy};

use super::{Device, Instance, Surface};

pub struct Swapchain {
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub framebuffers: Vec<vk::Framebuffer>,
    pub views: Vec<vk::ImageView>,
    pub images: Vec<vk::Image>,
    pub loader: khr::swapchain::Device,
    pub inner: vk::SwapchainKHR,
    device: Arc<Device>,
}

/// Whether the surface caps allow a swapchain of `count` images.
/// A `max_image_count` of zero means no upper bound.
pub fn image_count_supported(capabilities: &vk::SurfaceCapabilitiesKHR, count: u32) -> bool {
    count >= capabilities.min_image_count
        && (capabilities.max_image_count == 0 || count <= capabilities.max_image_count)
}

/// The configured count is always what gets requested. Caps that cannot
/// satisfy it are reported, not corrected.
pub fn requested_image_count(capabilities: &vk::SurfaceCapabilitiesKHR, configured: u32) -> u32 {
    if !image_count_supported(capabilities, configured) {
        warn!(
            "Surface supports {}..={} images, requesting {configured} anyway",
            capabilities.min_image_count,
            match capabilities.max_image_count {
                0 => "unbounded".to_string(),
                max => max.to_string(),
            }
        );
    }
    configured
}

/// The surface's current extent, or the window size if the surface leaves it
/// to the swapchain.
pub fn surface_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    let max = capabilities.max_image_extent;
    let min = capabilities.min_image_extent;
    vk::Extent2D {
        width: window_extent.width.clamp(min.width, max.width.max(min.width)),
        height: window_extent
            .height
            .clamp(min.height, max.height.max(min.height)),
    }
}

impl Swapchain {
    pub fn format(&self) -> vk::Format {
        self.format.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.extent.width as f32 / self.extent.height as f32
    }

    pub fn new(
        instance: &Instance,
        device: &Arc<Device>,
        surface: &Surface,
        window_extent: vk::Extent2D,
        image_count: u32,
        policy: &SelectionPolicy,
        limits: &Limits,
    ) -> Result<Self> {
        let surface_info = surface.info(device.physical_device)?;

        let formats = utils::bounded(
            surface_info.formats,
            limits.max_surface_formats,
            "surface formats",
        );
        let format = formats[select_preferred(&formats, policy.surface_format, "surface formats")?];
        debug!("Swapchain format: {:?}", format);

        let capabilities = surface_info.capabilities;

        let extent = surface_extent(&capabilities, window_extent);
        debug!("Swapchain extent: {:?}", extent);

        let image_count = requested_image_count(&capabilities, image_count);
        debug!("Swapchain image count: {:?}", image_count);

        let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.inner)
            .image_format(format.format)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_extent(extent)
            .image_color_space(format.color_space)
            .min_image_count(image_count)
            .image_array_layers(1)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true);
        let loader = khr::swapchain::Device::new(instance, device);
        let swapchain = unsafe { loader.create_swapchain(&swapchain_create_info, None)? };

        let images = unsafe { loader.get_swapchain_images(swapchain)? };
        if images.len() != image_count as usize {
            warn!(
                "Asked for {image_count} swapchain images, driver returned {}",
                images.len()
            );
        }

        let views = images
            .iter()
            .map(|img| device.create_2d_view(img, format.format))
            .collect::<VkResult<Vec<_>>>()?;

        Ok(Self {
            device: device.clone(),
            loader,
            inner: swapchain,
            extent,
            format,
            framebuffers: vec![],
            images,
            views,
        })
    }

    /// One framebuffer per swapchain image with its view as the single color attachment.
    pub fn create_framebuffers(&mut self, render_pass: vk::RenderPass) -> VkResult<()> {
        for &view in &self.views {
            let info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(slice::from_ref(&view))
                .width(self.extent.width)
                .height(self.extent.height)
                .layers(1);
            let framebuffer = unsafe { self.device.create_framebuffer(&info, None)? };
            self.framebuffers.push(framebuffer);
        }
        Ok(())
    }

    /// Blocks until an image is free. A suboptimal image counts as a failure.
    pub fn acquire_next_image(&self, image_acquired: vk::Semaphore) -> VkResult<u32> {
        match unsafe {
            self.loader.acquire_next_image(
                self.inner,
                u64::MAX,
                image_acquired,
                vk::Fence::null(),
            )
        } {
            Ok((idx, false)) => Ok(idx),
            Ok((_, true)) => Err(vk::Result::SUBOPTIMAL_KHR),
            Err(e) => Err(e),
        }
    }

    pub fn present(&self, image_idx: u32, draw_complete: vk::Semaphore) -> VkResult<()> {
        let image_indices = [image_idx];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(slice::from_ref(&draw_complete))
            .swapchains(slice::from_ref(&self.inner))
            .image_indices(&image_indices);

        match unsafe { self.loader.queue_present(self.device.queue, &present_info) } {
            Ok(false) => Ok(()),
            Ok(true) => Err(vk::Result::SUBOPTIMAL_KHR),
            Err(e) => Err(e),
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.views.iter().for_each(|&view| {
                self.device.destroy_image_view(view, None);
            });
            self.framebuffers.iter().for_each(|&framebuffer| {
                self.device.destroy_framebuffer(framebuffer, None);
            });
            self.loader.destroy_swapchain(self.inner, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            ..Default::default()
        }
    }

    #[test]
    fn configured_count_is_always_requested() {
        for (min, max) in [(1, 8), (2, 2), (4, 8), (1, 0), (3, 3), (0, 1)] {
            assert_eq!(requested_image_count(&caps(min, max), 3), 3);
        }
    }

    #[test]
    fn unsupported_counts_are_detected() {
        assert!(image_count_supported(&caps(2, 3), 3));
        assert!(image_count_supported(&caps(1, 0), 3));
        assert!(!image_count_supported(&caps(4, 8), 3));
        assert!(!image_count_supported(&caps(1, 2), 3));
    }

    #[test]
    fn current_extent_wins_when_defined() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 480,
                height: 270,
            },
            ..Default::default()
        };
        let window = vk::Extent2D {
            width: 1000,
            height: 1000,
        };
        assert_eq!(surface_extent(&caps, window), caps.current_extent);
    }

    #[test]
    fn undefined_extent_falls_back_to_window() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 200,
            },
            ..Default::default()
        };
        let window = vk::Extent2D {
            width: 480,
            height: 270,
        };
        assert_eq!(
            surface_extent(&caps, window),
            vk::Extent2D {
                width: 480,
                height: 200
            }
        );
    }
}
