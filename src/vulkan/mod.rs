mod buffers;
mod context;
mod device;
mod frame;
mod instance;
mod pipeline;
mod shader;
mod surface;
mod swapchain;

use ash::vk;

pub use buffers::Buffer;
pub use context::GraphicsContext;
pub use device::*;
pub use frame::*;
pub use instance::Instance;
pub use pipeline::*;
pub use shader::*;
pub use surface::*;
pub use swapchain::*;

pub const BASE_IMAGE_RANGE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};
