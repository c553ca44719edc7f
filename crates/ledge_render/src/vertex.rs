#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl SpriteVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, position) as wgpu::BufferAddress,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // tex_coords
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, tex_coords) as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // color
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, color) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }

    /// Corners of an axis-aligned quad, counter-clockwise from bottom-left.
    /// `uv` is `[u0, v0, u1, v1]` with `v0` at the top of the image.
    pub fn quad(center: [f32; 2], size: [f32; 2], uv: [f32; 4], color: [f32; 4]) -> [Self; 4] {
        let half_w = size[0] * 0.5;
        let half_h = size[1] * 0.5;
        let [u0, v0, u1, v1] = uv;
        let [x, y] = center;
        [
            Self {
                position: [x - half_w, y - half_h],
                tex_coords: [u0, v1],
                color,
            },
            Self {
                position: [x + half_w, y - half_h],
                tex_coords: [u1, v1],
                color,
            },
            Self {
                position: [x + half_w, y + half_h],
                tex_coords: [u1, v0],
                color,
            },
            Self {
                position: [x - half_w, y + half_h],
                tex_coords: [u0, v0],
                color,
            },
        ]
    }

    /// Two triangles over the four corners produced by [`SpriteVertex::quad`].
    pub fn quad_indices(base: u32) -> [u32; 6] {
        [base, base + 1, base + 2, base, base + 2, base + 3]
    }
}
