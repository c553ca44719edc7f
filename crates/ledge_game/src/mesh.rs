//! CPU-side sprite mesh rebuilt every frame from the world's sprite views.
//!
//! Quads are appended in draw order; consecutive quads that share a texture
//! collapse into a single `draw_indexed` call.

use crate::entity::{SpriteView, TextureHandle};
use glam::Vec2;
use ledge_render::SpriteVertex;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BOUNDS_COLOR: [f32; 4] = [0.2, 1.0, 0.3, 0.8];
const BOUNDS_THICKNESS: f32 = 0.03;

/// A contiguous run of indices drawn with one texture binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub texture: TextureHandle,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Default)]
pub struct SpriteMesh {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl SpriteMesh {
    /// Sprites in order, then (when `bounds` names a solid texture) an outline
    /// of every sprite's box on top.
    pub fn build(sprites: &[SpriteView], bounds: Option<TextureHandle>) -> Self {
        let quads = sprites.len() * if bounds.is_some() { 5 } else { 1 };
        let mut mesh = Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
            draw_calls: Vec::new(),
        };
        for sprite in sprites {
            mesh.push_quad(
                sprite.texture,
                sprite.center,
                sprite.size,
                sprite.sheet.uv_rect(sprite.cell),
                WHITE,
            );
        }
        if let Some(texture) = bounds {
            for sprite in sprites {
                mesh.push_outline(texture, sprite.center, sprite.size);
            }
        }
        mesh
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Bind-group switches needed to draw the mesh in order.
    pub fn texture_binds(&self) -> usize {
        let mut binds = 0;
        let mut current = None;
        for draw in &self.draw_calls {
            if current != Some(draw.texture) {
                current = Some(draw.texture);
                binds += 1;
            }
        }
        binds
    }

    fn push_quad(
        &mut self,
        texture: TextureHandle,
        center: Vec2,
        size: Vec2,
        uv: [f32; 4],
        color: [f32; 4],
    ) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&SpriteVertex::quad(
            center.to_array(),
            size.to_array(),
            uv,
            color,
        ));
        let index_start = self.indices.len() as u32;
        self.indices
            .extend_from_slice(&SpriteVertex::quad_indices(base));
        self.push_draw_call(texture, index_start, 6);
    }

    fn push_outline(&mut self, texture: TextureHandle, center: Vec2, size: Vec2) {
        let half = size * 0.5;
        let t = BOUNDS_THICKNESS;
        let full_uv = [0.0, 0.0, 1.0, 1.0];
        let edges = [
            (center + Vec2::new(0.0, half.y), Vec2::new(size.x, t)),
            (center - Vec2::new(0.0, half.y), Vec2::new(size.x, t)),
            (center - Vec2::new(half.x, 0.0), Vec2::new(t, size.y)),
            (center + Vec2::new(half.x, 0.0), Vec2::new(t, size.y)),
        ];
        for (edge_center, edge_size) in edges {
            self.push_quad(texture, edge_center, edge_size, full_uv, BOUNDS_COLOR);
        }
    }

    fn push_draw_call(&mut self, texture: TextureHandle, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if last.texture == texture && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture,
            index_start,
            index_count,
        });
    }
}
