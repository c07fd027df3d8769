//! Frame rendering
//!
//! Each item gets two clipped regions: the full cell for its border fill and
//! the inset cell for its content. The drag selection is outlined last.

use super::layout::Layout;
use super::ItemConfig;
use crate::host::{Color, GraphicsContext, Ortho, Viewport};

/// Region covering `(x, y, cx, cy)` in grid pixels, mapped to the window
fn region(cfg: &ItemConfig, x: f32, y: f32, cx: f32, cy: f32) -> (Viewport, Ortho) {
    let viewport = Viewport {
        x: (cfg.x as f32 + x * cfg.scale) as i32,
        y: (cfg.y as f32 + y * cfg.scale) as i32,
        cx: (cx * cfg.scale) as i32,
        cy: (cy * cfg.scale) as i32,
    };
    let ortho = Ortho { left: x, right: x + cx, top: y, bottom: y + cy };
    (viewport, ortho)
}

fn push_region(gfx: &mut dyn GraphicsContext, cfg: &ItemConfig, x: f32, y: f32, cx: f32, cy: f32) {
    let (viewport, ortho) = region(cfg, x, y, cx, cy);
    gfx.push_region(viewport, ortho);
}

/// Four bars just inside the selected rectangle
fn draw_selection(gfx: &mut dyn GraphicsContext, cfg: &ItemConfig, selection: super::Cell) {
    let (cw, ch, border) = (cfg.cell_width, cfg.cell_height, cfg.border);
    let (tx, ty) = (selection.col as f32, selection.row as f32);
    let (cx, cy) = (selection.w as f32, selection.h as f32);
    let color = Color::SELECTION_CYAN;

    gfx.draw_box(tx * cw, ty * ch - 1.0, cx * cw - 1.0, border + 1.0, color);
    gfx.draw_box(tx * cw, (ty + cy) * ch - border - 2.0, cx * cw - 1.0, border + 2.0, color);
    gfx.draw_box(tx * cw, ty * ch, border, cy * ch - 1.0, color);
    gfx.draw_box((tx + cx) * cw - border - 2.0, ty * ch, border + 1.0, cy * ch - 1.0, color);
}

impl Layout {
    /// Draw the whole grid. Canvas or viewport size changes trigger a
    /// resize first.
    pub fn render(&self, gfx: &mut dyn GraphicsContext, canvas_w: i32, canvas_h: i32, viewport_w: i32, viewport_h: i32) {
        let host = self.host();
        let mut s = self.state.lock();
        if s.canvas != (canvas_w, canvas_h) || s.viewport != (viewport_w, viewport_h) {
            s.resize(canvas_w, canvas_h, viewport_w, viewport_h);
        }
        let cfg = s.cfg;
        if cfg.scale <= 0.0 || cfg.cx <= 0 || cfg.cy <= 0 {
            return;
        }

        let (grid_w, grid_h) = (cfg.cx as f32, cfg.cy as f32);
        gfx.push_region(
            Viewport {
                x: cfg.x,
                y: cfg.y,
                cx: (grid_w * cfg.scale) as i32,
                cy: (grid_h * cfg.scale) as i32,
            },
            Ortho { left: 0.0, right: grid_w, top: 0.0, bottom: grid_h },
        );
        gfx.draw_box(0.0, 0.0, grid_w, grid_h, Color::BORDER_GRAY);

        for item in s.items.iter_mut() {
            let g = item.base().geometry;
            let fill = if item.hovered() { Color::HOVER_GREEN } else { item.fill_color(host) };
            let (left, top) = (g.rel_left as f32, g.rel_top as f32);

            gfx.push_matrix();
            gfx.translate(left, top);
            push_region(gfx, &cfg, left, top, g.width as f32, g.height as f32);
            gfx.draw_box(0.0, 0.0, g.width as f32, g.height as f32, fill);
            gfx.pop_region();
            gfx.pop_matrix();

            let (inner_left, inner_top) = (left + cfg.border, top + cfg.border);
            gfx.push_matrix();
            gfx.translate(inner_left, inner_top);
            push_region(gfx, &cfg, inner_left, inner_top, g.inner_width as f32, g.inner_height as f32);
            item.render(gfx, host, &cfg);
            gfx.pop_region();
            gfx.pop_matrix();
        }

        if s.dragging {
            draw_selection(gfx, &cfg, s.selection());
        }
        gfx.pop_region();
    }
}
