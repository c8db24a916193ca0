use std::{ffi::NulError, io, path::PathBuf};

use ash::vk;
use winit::raw_window_handle::HandleError;

use crate::FrameState;

pub type Result<T, E = RendererError> = std::result::Result<T, E>;

/// Everything that can go wrong while standing up or driving the renderer.
///
/// The graphics layer never halts on its own; errors travel up to the caller,
/// which decides whether the process dies.
#[derive(thiserror::Error, Debug)]
pub enum RendererError {
    #[error("Vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),

    #[error("Failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("Window handle unavailable: {0}")]
    WindowHandle(#[from] HandleError),

    #[error("Application name contains a NUL byte")]
    InvalidAppName(#[from] NulError),

    #[error("A graphics context is already live in this process")]
    ContextAlreadyExists,

    #[error("No {0} available to choose from")]
    NoCandidates(&'static str),

    #[error("Selection policy picked {what} #{index} out of {len}")]
    SelectionOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Queue family {queue_family} cannot present to the window surface")]
    PresentUnsupported { queue_family: u32 },

    #[error("No memory type matches bits {type_bits:#b} with {flags:?}")]
    NoSuitableMemoryType {
        type_bits: u32,
        flags: vk::MemoryPropertyFlags,
    },

    #[error("Failed to read shader {path:?}: {source}")]
    ShaderRead { path: PathBuf, source: io::Error },

    #[error("Shader {path:?} is not valid SPIR-V: {source}")]
    ShaderBytecode { path: PathBuf, source: io::Error },

    #[error("Cannot create an empty {usage:?} buffer")]
    EmptyBuffer { usage: vk::BufferUsageFlags },

    #[error("Upload of {len} bytes does not fit in a {capacity} byte buffer")]
    BufferOverflow { len: u64, capacity: u64 },

    #[error("Frame operation `{operation}` is not allowed in state {state:?}")]
    FrameOrder {
        operation: &'static str,
        state: FrameState,
    },
}
