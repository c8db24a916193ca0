use std::mem::offset_of;

use ash::vk;

/// Position plus packed 8-bit RGBA color, the only vertex layout the pipeline accepts.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [u8; 4],
}

impl Vertex {
    pub const STRIDE: usize = size_of::<Self>();

    pub const fn new(pos: [f32; 3], color: [u8; 4]) -> Self {
        Self { pos, color }
    }

    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription::default()
            .binding(0)
            .stride(Self::STRIDE as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        [
            vk::VertexInputAttributeDescription::default()
                .binding(0)
                .location(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(offset_of!(Self, pos) as u32),
            vk::VertexInputAttributeDescription::default()
                .binding(0)
                .location(1)
                .format(vk::Format::R8G8B8A8_UNORM)
                .offset(offset_of!(Self, color) as u32),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 16);
        assert_eq!(Vertex::binding_description().stride, 16);

        let [pos, color] = Vertex::attribute_descriptions();
        assert_eq!((pos.location, pos.offset), (0, 0));
        assert_eq!((color.location, color.offset), (1, 12));
        assert_eq!(color.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn casts_to_bytes_in_field_order() {
        let vertex = Vertex::new([1.0, 0.0, 0.0], [10, 20, 30, 255]);
        let bytes = bytemuck::bytes_of(&vertex);
        assert_eq!(&bytes[..4], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[12..], &[10, 20, 30, 255]);
    }
}
