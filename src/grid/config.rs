//! Layout configuration shared by the grid and every item
//!
//! `ItemConfig` is recomputed on every resize and handed to items through
//! `LayoutItem::update`. It is `#[repr(C)]` because custom items receive a
//! pointer to it across the plugin boundary.

/// Border between cells in canvas pixels
pub const DEFAULT_BORDER: f32 = 4.0;

/// Geometry of the grid inside the render target
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemConfig {
    /// Horizontal offset of the grid inside the viewport (window pixels)
    pub x: i32,
    /// Vertical offset of the grid inside the viewport (window pixels)
    pub y: i32,
    /// Grid reference width (canvas pixels)
    pub cx: i32,
    /// Grid reference height (canvas pixels), `cell_height * rows`
    pub cy: i32,
    /// Virtual canvas resolution the grid is laid out against
    pub canvas_width: i32,
    pub canvas_height: i32,
    /// Uniform canvas-to-window scale
    pub scale: f32,
    /// Border inset on each side of a cell
    pub border: f32,
    /// Twice the border, the total inset per axis
    pub border2: f32,
    pub cell_width: f32,
    pub cell_height: f32,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            cx: 0,
            cy: 0,
            canvas_width: 0,
            canvas_height: 0,
            scale: 1.0,
            border: DEFAULT_BORDER,
            border2: DEFAULT_BORDER * 2.0,
            cell_width: 0.0,
            cell_height: 0.0,
        }
    }
}

impl ItemConfig {
    /// Convert a window-pixel position to grid-local pixels.
    ///
    /// Rounds toward negative infinity so points left of or above the grid
    /// stay negative.
    pub fn window_to_grid(&self, x: i32, y: i32) -> (i32, i32) {
        if self.scale <= 0.0 {
            return (0, 0);
        }
        (
            ((x - self.x) as f32 / self.scale).floor() as i32,
            ((y - self.y) as f32 / self.scale).floor() as i32,
        )
    }

    /// Grid unit cell under a grid-local pixel position, if any
    pub fn cell_at(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        if self.cell_width <= 0.0 || self.cell_height <= 0.0 || x < 0 || y < 0 {
            return None;
        }
        Some(((x as f32 / self.cell_width) as i32, (y as f32 / self.cell_height) as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_border() {
        let cfg = ItemConfig::default();
        assert_eq!(cfg.border, 4.0);
        assert_eq!(cfg.border2, 8.0);
    }

    #[test]
    fn test_window_to_grid() {
        let cfg = ItemConfig { x: 100, y: 50, scale: 0.5, ..Default::default() };
        assert_eq!(cfg.window_to_grid(200, 150), (200, 200));
        assert_eq!(cfg.window_to_grid(100, 50), (0, 0));
    }

    #[test]
    fn test_points_outside_the_grid_stay_negative() {
        let cfg = ItemConfig { x: 100, y: 50, scale: 2.0, ..Default::default() };
        assert_eq!(cfg.window_to_grid(99, 49), (-1, -1));
        assert_eq!(cfg.window_to_grid(101, 51), (0, 0));
    }

    #[test]
    fn test_cell_at() {
        let cfg = ItemConfig { cell_width: 480.0, cell_height: 270.0, ..Default::default() };
        assert_eq!(cfg.cell_at(0, 0), Some((0, 0)));
        assert_eq!(cfg.cell_at(959, 271), Some((1, 1)));
        assert_eq!(cfg.cell_at(-1, 0), None);
    }
}
