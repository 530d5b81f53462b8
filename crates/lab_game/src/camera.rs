use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Top-left anchored view over the map, in map pixels (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub viewport: Vec2,
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            viewport: Vec2::new(viewport_width as f32, viewport_height as f32),
        }
    }

    /// Centre on a sprite, then keep the view inside the map when its size
    /// is known. Maps smaller than the view pin to the origin.
    pub fn follow(&mut self, target: Vec2, target_size: Vec2, map_size: Option<Vec2>) {
        let mut position = target + target_size / 2.0 - self.viewport / 2.0;
        if let Some(map_size) = map_size {
            let max = (map_size - self.viewport).max(Vec2::ZERO);
            position = position.clamp(Vec2::ZERO, max);
        }
        self.position = position;
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let proj = Mat4::orthographic_rh(
            self.position.x,
            self.position.x + self.viewport.x,
            self.position.y + self.viewport.y,
            self.position.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}
