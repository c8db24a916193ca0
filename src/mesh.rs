use std::sync::Arc;

use ash::vk;

use crate::{
    vulkan::{Buffer, Device},
    Result, Vertex,
};

const FRONT: [u8; 4] = [0, 0, 255, 255];
const RIGHT: [u8; 4] = [255, 0, 0, 255];
const BACK: [u8; 4] = [0, 0, 128, 255];
const LEFT: [u8; 4] = [128, 0, 0, 255];
const TOP: [u8; 4] = [0, 255, 0, 255];
const BOTTOM: [u8; 4] = [0, 128, 0, 255];

/// Unit cube spanning -1..1 on every axis, four vertices per face so each
/// face keeps its own solid color. Corners go bottom-left, top-left,
/// top-right, bottom-right as seen from outside.
pub const CUBE_VERTICES: [Vertex; 24] = [
    // -z
    Vertex::new([-1., -1., -1.], FRONT),
    Vertex::new([-1., 1., -1.], FRONT),
    Vertex::new([1., 1., -1.], FRONT),
    Vertex::new([1., -1., -1.], FRONT),
    // +x
    Vertex::new([1., -1., -1.], RIGHT),
    Vertex::new([1., 1., -1.], RIGHT),
    Vertex::new([1., 1., 1.], RIGHT),
    Vertex::new([1., -1., 1.], RIGHT),
    // +z
    Vertex::new([1., -1., 1.], BACK),
    Vertex::new([1., 1., 1.], BACK),
    Vertex::new([-1., 1., 1.], BACK),
    Vertex::new([-1., -1., 1.], BACK),
    // -x
    Vertex::new([-1., -1., 1.], LEFT),
    Vertex::new([-1., 1., 1.], LEFT),
    Vertex::new([-1., 1., -1.], LEFT),
    Vertex::new([-1., -1., -1.], LEFT),
    // +y
    Vertex::new([-1., 1., -1.], TOP),
    Vertex::new([-1., 1., 1.], TOP),
    Vertex::new([1., 1., 1.], TOP),
    Vertex::new([1., 1., -1.], TOP),
    // -y
    Vertex::new([-1., -1., 1.], BOTTOM),
    Vertex::new([-1., -1., -1.], BOTTOM),
    Vertex::new([1., -1., -1.], BOTTOM),
    Vertex::new([1., -1., 1.], BOTTOM),
];

pub const CUBE_INDICES: [u16; 36] = cube_indices();

const fn cube_indices() -> [u16; 36] {
    let mut indices = [0; 36];
    let mut face = 0;
    while face < 6 {
        let base = face as u16 * 4;
        let i = face * 6;
        indices[i] = base;
        indices[i + 1] = base + 1;
        indices[i + 2] = base + 2;
        indices[i + 3] = base;
        indices[i + 4] = base + 2;
        indices[i + 5] = base + 3;
        face += 1;
    }
    indices
}

pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex::new([0., -0.5, 0.], [255, 0, 0, 255]),
    Vertex::new([0.5, 0.5, 0.], [0, 255, 0, 255]),
    Vertex::new([-0.5, 0.5, 0.], [0, 0, 255, 255]),
];

pub const TRIANGLE_INDICES: [u16; 3] = [0, 1, 2];

/// A vertex and an index buffer drawn together.
///
/// Teardown is explicit: [`Mesh::destroy`] has to run before the mesh is
/// dropped, and dropping a mesh that still holds buffers panics.
#[derive(Default)]
pub struct Mesh {
    vertex_buffer: Option<Buffer>,
    index_buffer: Option<Buffer>,
    vertex_count: u32,
    index_count: u32,
}

impl Mesh {
    pub fn create(device: &Arc<Device>, vertices: &[Vertex], indices: &[u16]) -> Result<Self> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let vertex_buffer = Buffer::new(
            device,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            Some(vertex_bytes),
            vertex_bytes.len() as u64,
        )?;
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);
        let index_buffer = Buffer::new(
            device,
            vk::BufferUsageFlags::INDEX_BUFFER,
            Some(index_bytes),
            index_bytes.len() as u64,
        )?;

        Ok(Self {
            vertex_buffer: Some(vertex_buffer),
            index_buffer: Some(index_buffer),
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
        })
    }

    pub fn create_cube(device: &Arc<Device>) -> Result<Self> {
        Self::create(device, &CUBE_VERTICES, &CUBE_INDICES)
    }

    pub fn create_triangle(device: &Arc<Device>) -> Result<Self> {
        Self::create(device, &TRIANGLE_VERTICES, &TRIANGLE_INDICES)
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn is_live(&self) -> bool {
        self.vertex_buffer.is_some() || self.index_buffer.is_some()
    }

    pub fn vertex_buffer(&self) -> Option<vk::Buffer> {
        self.vertex_buffer.as_ref().map(|b| b.buffer)
    }

    pub fn index_buffer(&self) -> Option<vk::Buffer> {
        self.index_buffer.as_ref().map(|b| b.buffer)
    }

    /// Releases both buffers. Panics if they were already released.
    pub fn destroy(&mut self) {
        assert!(
            self.vertex_buffer.is_some() && self.index_buffer.is_some(),
            "Mesh::destroy called on a mesh without buffers"
        );
        self.index_buffer = None;
        self.vertex_buffer = None;
        self.vertex_count = 0;
        self.index_count = 0;
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        if self.is_live() && !std::thread::panicking() {
            panic!("Mesh dropped before its destroy() method was called!");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_and_36_indices() {
        assert_eq!(CUBE_VERTICES.len(), 24);
        assert_eq!(CUBE_INDICES.len(), 36);
        assert!(CUBE_INDICES.iter().all(|&i| i <= 23));
        assert_eq!(&CUBE_INDICES[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&CUBE_INDICES[30..], &[20, 21, 22, 20, 22, 23]);
    }

    #[test]
    fn cube_faces_are_flat_and_solid() {
        for face in CUBE_VERTICES.chunks(4) {
            assert!(face.iter().all(|v| v.color == face[0].color));

            // Exactly one axis is constant across the face, at +-1.
            let flat_axes: Vec<usize> = (0..3)
                .filter(|&axis| face.iter().all(|v| v.pos[axis] == face[0].pos[axis]))
                .collect();
            assert_eq!(flat_axes.len(), 1);
            assert_eq!(face[0].pos[flat_axes[0]].abs(), 1.);
        }
        assert!(CUBE_VERTICES
            .iter()
            .flat_map(|v| v.pos)
            .all(|c| c == 1. || c == -1.));
    }

    #[test]
    fn every_cube_face_has_its_own_color() {
        let mut colors: Vec<[u8; 4]> = CUBE_VERTICES.chunks(4).map(|f| f[0].color).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), 6);
        assert_eq!(CUBE_VERTICES[0].color, FRONT);
        assert_eq!(CUBE_VERTICES[4].color, RIGHT);
    }

    #[test]
    fn triangle_indices_are_in_range() {
        assert!(TRIANGLE_INDICES
            .iter()
            .all(|&i| (i as usize) < TRIANGLE_VERTICES.len()));
    }

    #[test]
    fn mesh_without_buffers_drops_silently() {
        let mesh = Mesh::default();
        assert!(!mesh.is_live());
        assert_eq!(mesh.index_count(), 0);
        drop(mesh);
    }

    #[test]
    #[should_panic(expected = "without buffers")]
    fn destroying_an_empty_mesh_panics() {
        let mut mesh = Mesh::default();
        mesh.destroy();
    }
}
