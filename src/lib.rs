#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]

pub mod config;
mod error;
mod mesh;
mod renderer;
mod select;
mod uniforms;
mod utils;
mod vertex;
pub mod vulkan;

pub use self::{
    config::{AppConfig, Limits, MeshKind, RendererConfig, WindowConfig},
    error::{RendererError, Result},
    mesh::*,
    renderer::Renderer,
    select::{select_preferred, take_first, SelectFn, SelectionPolicy},
    uniforms::{FrameClock, UniformMatrices},
    utils::*,
    vertex::Vertex,
    vulkan::{Buffer, Device, FrameState, GraphicsContext},
};
