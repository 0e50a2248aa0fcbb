//! WebGPU rendering module
//!
//! `scene` turns a snapshot into a flat-colored triangle list in viewport
//! pixels; `pipeline` uploads and draws it.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

use thiserror::Error;

pub use pipeline::{RenderState, to_ndc};
pub use scene::build_scene;
pub use vertex::Vertex;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
