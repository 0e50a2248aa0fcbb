//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const WATER_TOP: [f32; 4] = [0.16, 0.55, 0.78, 1.0];
    pub const WATER_BOTTOM: [f32; 4] = [0.03, 0.18, 0.38, 1.0];
    pub const SAND: [f32; 4] = [0.86, 0.76, 0.5, 1.0];
    pub const PIPE: [f32; 4] = [0.22, 0.7, 0.36, 1.0];
    pub const PIPE_LIP: [f32; 4] = [0.15, 0.52, 0.26, 1.0];
    pub const FISH_BODY: [f32; 4] = [1.0, 0.55, 0.15, 1.0];
    pub const FISH_TAIL: [f32; 4] = [0.95, 0.4, 0.1, 1.0];
    pub const FISH_EYE: [f32; 4] = [0.05, 0.05, 0.08, 1.0];
    pub const DIM_OVERLAY: [f32; 4] = [0.0, 0.0, 0.0, 0.45];
    pub const BACKGROUND: [f32; 4] = [0.02, 0.1, 0.2, 1.0];
}
