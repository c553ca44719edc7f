use glam::{Mat4, Vec2, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic camera measured in world units rather than pixels: the
/// visible region is `position ± half_extents` regardless of window size.
pub struct Camera2D {
    pub position: Vec2,
    pub half_extents: Vec2,
}

impl Camera2D {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            half_extents: Vec2::new(half_width, half_height),
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(
            -self.half_extents.x,
            self.half_extents.x,
            -self.half_extents.y,
            self.half_extents.y,
            -1.0,
            1.0,
        )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(-self.position.x, -self.position.y, 0.0))
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: (self.projection() * self.view()).to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn corners_of_visible_region_map_to_clip_edges() {
        let camera = Camera2D::new(5.0, 3.75);
        let view_proj = Mat4::from_cols_array_2d(&camera.build_uniform().view_proj);

        let top_right = view_proj * Vec4::new(5.0, 3.75, 0.0, 1.0);
        assert!((top_right.x - 1.0).abs() < 1e-6);
        assert!((top_right.y - 1.0).abs() < 1e-6);

        let bottom_left = view_proj * Vec4::new(-5.0, -3.75, 0.0, 1.0);
        assert!((bottom_left.x + 1.0).abs() < 1e-6);
        assert!((bottom_left.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn camera_position_recenters_view() {
        let mut camera = Camera2D::new(5.0, 3.75);
        camera.position = Vec2::new(2.0, 1.0);
        let view_proj = Mat4::from_cols_array_2d(&camera.build_uniform().view_proj);
        let center = view_proj * Vec4::new(2.0, 1.0, 0.0, 1.0);
        assert!(center.x.abs() < 1e-6);
        assert!(center.y.abs() < 1e-6);
    }
}
