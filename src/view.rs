use glam::Vec2;

use crate::particle::SpawnArea;

pub const MIN_ZOOM: f32 = 0.01;
pub const MAX_ZOOM: f32 = 10.0;

/// Uniform block read by `render.wgsl`.
#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct ViewUniform {
    pub screen_size: Vec2,
    pub offset: Vec2,
    pub zoom: f32,
    _padding: [f32; 3],
}

/// Pan and zoom over the particle field, in field units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Centered camera zoomed so the whole spawn area is visible.
    pub fn fit(area: SpawnArea, screen_size: Vec2) -> Self {
        let extent = area.half_extents() * 2.0;
        let zoom = (screen_size / extent).min_element();

        Self {
            offset: Vec2::ZERO,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Moves the view by a cursor delta given in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta * Vec2::new(1.0, -1.0) / self.zoom;
    }

    /// Zooms by a scroll amount, proportionally to the current zoom.
    pub fn zoom_by(&mut self, scroll: f32) {
        let delta = scroll * 0.05 * self.zoom;
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn uniform(&self, screen_size: Vec2) -> ViewUniform {
        ViewUniform {
            screen_size,
            offset: self.offset,
            zoom: self.zoom,
            _padding: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::default();
        for _ in 0..1_000 {
            camera.zoom_by(10.0);
        }
        assert_eq!(camera.zoom, MAX_ZOOM);

        for _ in 0..1_000 {
            camera.zoom_by(-10.0);
        }
        assert_eq!(camera.zoom, MIN_ZOOM);
    }

    #[test]
    fn pan_is_scaled_by_zoom_and_flips_y() {
        let mut camera = Camera {
            offset: Vec2::ZERO,
            zoom: 2.0,
        };
        camera.pan(Vec2::new(10.0, 10.0));
        assert_eq!(camera.offset, Vec2::new(5.0, -5.0));
    }

    #[test]
    fn fit_shows_the_whole_spawn_area() {
        let area = SpawnArea::new(1800.0, 1200.0).unwrap();
        let camera = Camera::fit(area, Vec2::new(1800.0, 1200.0));
        assert_eq!(camera.zoom, 0.5);
        assert_eq!(camera.offset, Vec2::ZERO);
    }

    #[test]
    fn uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<ViewUniform>(), 32);

        let uniform = Camera::default().uniform(Vec2::new(800.0, 600.0));
        assert_eq!(uniform.screen_size, Vec2::new(800.0, 600.0));
        assert_eq!(uniform.zoom, 1.0);
    }

    #[test]
    fn uniform_matches_render_shader() {
        use std::mem::{offset_of, size_of};

        let camera = crate::utils::wgsl_struct(include_str!("render.wgsl"), "Camera");
        assert!(camera.size as usize <= size_of::<ViewUniform>());
        assert_eq!(
            camera.offsets,
            [
                offset_of!(ViewUniform, screen_size),
                offset_of!(ViewUniform, offset),
                offset_of!(ViewUniform, zoom),
            ]
            .map(|o| o as u32)
        );
    }
}
