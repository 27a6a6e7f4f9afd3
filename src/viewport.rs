use std::sync::Arc;

use glam::Vec2;
use parking_lot::RwLock;

/// Reports the drawable size pointer coordinates are measured against.
pub trait ViewportProvider: Send + Sync {
    fn viewport_size(&self) -> (u32, u32);

    fn aspect(&self) -> f32 {
        let (width, height) = self.viewport_size();
        width.max(1) as f32 / height.max(1) as f32
    }

    /// Converts a pixel position (origin top-left, y down) to normalised
    /// device coordinates in `[-1, 1]` with y up.
    fn to_ndc(&self, position: Vec2) -> Vec2 {
        let (width, height) = self.viewport_size();
        let size = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        let ndc = position / size * 2.0 - Vec2::ONE;
        Vec2::new(ndc.x, -ndc.y)
    }
}

/// Viewport with a fixed resolution, used by headless renders and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticViewport {
    pub width: u32,
    pub height: u32,
}

impl StaticViewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ViewportProvider for StaticViewport {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Window-backed viewport, updated from resize events.
#[derive(Debug)]
pub struct WindowViewport {
    size: RwLock<(u32, u32)>,
}

impl WindowViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: RwLock::new((width.max(1), height.max(1))),
        }
    }

    pub fn update(&self, width: u32, height: u32) {
        *self.size.write() = (width.max(1), height.max(1));
    }
}

impl ViewportProvider for WindowViewport {
    fn viewport_size(&self) -> (u32, u32) {
        *self.size.read()
    }
}

impl<T> ViewportProvider for Arc<T>
where
    T: ViewportProvider + ?Sized,
{
    fn viewport_size(&self) -> (u32, u32) {
        (**self).viewport_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_unit_square() {
        let viewport = StaticViewport::new(800, 600);
        assert_eq!(viewport.to_ndc(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0));
        assert_eq!(viewport.to_ndc(Vec2::new(800.0, 600.0)), Vec2::new(1.0, -1.0));
        assert_eq!(viewport.to_ndc(Vec2::new(400.0, 300.0)), Vec2::ZERO);
    }

    #[test]
    fn window_viewport_never_reports_zero() {
        let viewport = Arc::new(WindowViewport::new(640, 480));
        viewport.update(0, 0);
        assert_eq!(viewport.viewport_size(), (1, 1));
        assert!(viewport.to_ndc(Vec2::new(3.0, 3.0)).is_finite());
        viewport.update(1024, 512);
        assert_eq!(viewport.aspect(), 2.0);
    }
}
