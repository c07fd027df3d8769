//! `GraphicsContext` backed by an egui painter
//!
//! egui has no viewport/projection stack, so `RegionStack` emulates one:
//! local coordinates go through the matrix stack, then the active
//! orthographic projection, then land in the active viewport. Each region
//! also becomes the clip rectangle for whatever is drawn inside it.

use egui::{Color32, FontId, Painter, Pos2, Rect, TextureId};
use glam::{Affine2, Vec2};

use super::{Color, GraphicsContext, Ortho, Viewport};

const FULL_UV: Rect = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));

/// Viewport/projection stack plus matrix stack, independent of any painter
#[derive(Debug, Clone)]
pub struct RegionStack {
    regions: Vec<(Viewport, Ortho)>,
    matrices: Vec<Affine2>,
    matrix: Affine2,
    base: Viewport,
}

impl RegionStack {
    /// Start with a single region covering `base` with a 1:1 projection
    pub fn new(base: Viewport) -> Self {
        Self {
            regions: Vec::new(),
            matrices: Vec::new(),
            matrix: Affine2::IDENTITY,
            base,
        }
    }

    fn current(&self) -> (Viewport, Ortho) {
        self.regions.last().copied().unwrap_or((
            self.base,
            Ortho {
                left: 0.0,
                right: self.base.cx as f32,
                top: 0.0,
                bottom: self.base.cy as f32,
            },
        ))
    }

    pub fn push_region(&mut self, viewport: Viewport, ortho: Ortho) {
        // Viewports are relative to the surface, not the parent region
        let viewport = Viewport {
            x: self.base.x + viewport.x,
            y: self.base.y + viewport.y,
            ..viewport
        };
        self.regions.push((viewport, ortho));
    }

    pub fn pop_region(&mut self) {
        if self.regions.pop().is_none() {
            tracing::warn!("pop_region without matching push_region");
        }
    }

    pub fn push_matrix(&mut self) {
        self.matrices.push(self.matrix);
    }

    pub fn pop_matrix(&mut self) {
        match self.matrices.pop() {
            Some(m) => self.matrix = m,
            None => tracing::warn!("pop_matrix without matching push_matrix"),
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.matrix = self.matrix * Affine2::from_translation(Vec2::new(x, y));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.matrix = self.matrix * Affine2::from_scale(Vec2::new(sx, sy));
    }

    /// Screen pixels per projection unit on each axis
    fn projection_scale(&self) -> Vec2 {
        let (vp, ortho) = self.current();
        let w = ortho.right - ortho.left;
        let h = ortho.bottom - ortho.top;
        Vec2::new(
            if w != 0.0 { vp.cx as f32 / w } else { 0.0 },
            if h != 0.0 { vp.cy as f32 / h } else { 0.0 },
        )
    }

    /// Map a local point to screen pixels
    pub fn to_screen(&self, x: f32, y: f32) -> Vec2 {
        let (vp, ortho) = self.current();
        let p = self.matrix.transform_point2(Vec2::new(x, y));
        let s = self.projection_scale();
        Vec2::new(
            vp.x as f32 + (p.x - ortho.left) * s.x,
            vp.y as f32 + (p.y - ortho.top) * s.y,
        )
    }

    /// Screen pixels per local unit, used to size text
    pub fn pixel_scale(&self) -> f32 {
        let a = self.to_screen(0.0, 0.0);
        let b = self.to_screen(0.0, 1.0);
        (b.y - a.y).abs()
    }

    /// Active clip rectangle as (min, max) in screen pixels
    pub fn clip(&self) -> (Vec2, Vec2) {
        let (vp, _) = self.current();
        let min = Vec2::new(vp.x as f32, vp.y as f32);
        (min, min + Vec2::new(vp.cx as f32, vp.cy as f32))
    }

    pub fn depth(&self) -> usize {
        self.regions.len()
    }
}

fn to_color32(color: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.red(), color.green(), color.blue(), color.alpha())
}

fn to_pos(v: Vec2) -> Pos2 {
    Pos2::new(v.x, v.y)
}

/// Resolves a source name to the texture holding its latest frame
pub type TextureLookup<'a> = Box<dyn Fn(&str) -> Option<TextureId> + 'a>;

/// Renders the multiview into an egui painter
pub struct EguiSurface<'a> {
    painter: Painter,
    stack: RegionStack,
    textures: TextureLookup<'a>,
    program: Option<TextureId>,
}

impl<'a> EguiSurface<'a> {
    /// Create a surface drawing into `rect` of `painter`
    pub fn new(painter: Painter, rect: Rect, textures: TextureLookup<'a>) -> Self {
        let base = Viewport {
            x: rect.min.x as i32,
            y: rect.min.y as i32,
            cx: rect.width() as i32,
            cy: rect.height() as i32,
        };
        Self {
            painter,
            stack: RegionStack::new(base),
            textures,
            program: None,
        }
    }

    /// Texture holding the program output
    pub fn with_program_texture(mut self, texture: TextureId) -> Self {
        self.program = Some(texture);
        self
    }

    fn clipped(&self) -> Painter {
        let (min, max) = self.stack.clip();
        self.painter.with_clip_rect(Rect::from_min_max(to_pos(min), to_pos(max)))
    }

    fn screen_rect(&self, x: f32, y: f32, cx: f32, cy: f32) -> Rect {
        let a = self.stack.to_screen(x, y);
        let b = self.stack.to_screen(x + cx, y + cy);
        Rect::from_two_pos(to_pos(a), to_pos(b))
    }

    fn draw_texture(&mut self, texture: Option<TextureId>, cx: f32, cy: f32) {
        let rect = self.screen_rect(0.0, 0.0, cx, cy);
        match texture {
            Some(id) => {
                self.clipped().image(id, rect, FULL_UV, Color32::WHITE);
            }
            None => {
                self.clipped().rect_filled(rect, 0.0, Color32::BLACK);
            }
        }
    }
}

impl GraphicsContext for EguiSurface<'_> {
    fn push_region(&mut self, viewport: Viewport, ortho: Ortho) {
        self.stack.push_region(viewport, ortho);
    }

    fn pop_region(&mut self) {
        self.stack.pop_region();
    }

    fn push_matrix(&mut self) {
        self.stack.push_matrix();
    }

    fn pop_matrix(&mut self) {
        self.stack.pop_matrix();
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.stack.translate(x, y);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.stack.scale(sx, sy);
    }

    fn draw_box(&mut self, x: f32, y: f32, cx: f32, cy: f32, color: Color) {
        if cx <= 0.0 || cy <= 0.0 || color.is_transparent() {
            return;
        }
        let rect = self.screen_rect(x, y, cx, cy);
        self.clipped().rect_filled(rect, 0.0, to_color32(color));
    }

    fn draw_source(&mut self, name: &str, cx: f32, cy: f32) {
        let texture = (self.textures)(name);
        self.draw_texture(texture, cx, cy);
    }

    fn draw_program(&mut self, cx: f32, cy: f32) {
        self.draw_texture(self.program, cx, cy);
    }

    fn label_size(&self, text: &str, size: f32) -> (f32, f32) {
        let px = self.stack.pixel_scale();
        if px <= 0.0 {
            return (0.0, 0.0);
        }
        let galley = self.painter.layout_no_wrap(
            text.to_string(),
            FontId::proportional(size * px),
            Color32::WHITE,
        );
        let s = galley.size();
        (s.x / px, s.y / px)
    }

    fn draw_label(&mut self, text: &str, size: f32, color: Color) {
        let px = self.stack.pixel_scale();
        if px <= 0.0 {
            return;
        }
        let color = to_color32(color);
        let galley = self
            .painter
            .layout_no_wrap(text.to_string(), FontId::proportional(size * px), color);
        let pos = to_pos(self.stack.to_screen(0.0, 0.0));
        self.clipped().galley(pos, galley, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, x: f32, y: f32) -> bool {
        (a.x - x).abs() < 1e-3 && (a.y - y).abs() < 1e-3
    }

    #[test]
    fn test_identity_without_regions() {
        let stack = RegionStack::new(Viewport { x: 10, y: 20, cx: 100, cy: 100 });
        assert!(approx(stack.to_screen(5.0, 5.0), 15.0, 25.0));
    }

    #[test]
    fn test_region_maps_ortho_to_viewport() {
        let mut stack = RegionStack::new(Viewport { x: 0, y: 0, cx: 800, cy: 600 });
        // Grid of 1920x1080 shown at half size, offset by (0, 75)
        stack.push_region(
            Viewport { x: 0, y: 75, cx: 960, cy: 540 },
            Ortho { left: 0.0, right: 1920.0, top: 0.0, bottom: 1080.0 },
        );
        assert!(approx(stack.to_screen(1920.0, 1080.0), 960.0, 615.0));
        assert!((stack.pixel_scale() - 0.5).abs() < 1e-6);
        stack.pop_region();
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_item_local_origin() {
        let mut stack = RegionStack::new(Viewport { x: 0, y: 0, cx: 1000, cy: 1000 });
        stack.push_matrix();
        stack.translate(100.0, 50.0);
        stack.push_region(
            Viewport { x: 100, y: 50, cx: 200, cy: 100 },
            Ortho { left: 100.0, right: 300.0, top: 50.0, bottom: 150.0 },
        );
        assert!(approx(stack.to_screen(0.0, 0.0), 100.0, 50.0));
        assert!(approx(stack.to_screen(200.0, 100.0), 300.0, 150.0));
        let (min, max) = stack.clip();
        assert!(approx(min, 100.0, 50.0));
        assert!(approx(max, 300.0, 150.0));
        stack.pop_region();
        stack.pop_matrix();
        assert!(approx(stack.to_screen(0.0, 0.0), 0.0, 0.0));
    }

    #[test]
    fn test_matrix_scale() {
        let mut stack = RegionStack::new(Viewport { x: 0, y: 0, cx: 100, cy: 100 });
        stack.translate(10.0, 0.0);
        stack.scale(2.0, 3.0);
        assert!(approx(stack.to_screen(1.0, 1.0), 12.0, 3.0));
    }

    #[test]
    fn test_unbalanced_pops_are_ignored() {
        let mut stack = RegionStack::new(Viewport { x: 0, y: 0, cx: 10, cy: 10 });
        stack.pop_region();
        stack.pop_matrix();
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_sources_draw_texture_or_black() {
        let camera = TextureId::User(7);
        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(200.0, 100.0));
            let painter = Painter::new(ctx.clone(), egui::LayerId::background(), rect);
            let mut surface =
                EguiSurface::new(painter, rect, Box::new(move |name| (name == "Camera").then_some(camera)));
            surface.draw_source("Camera", 100.0, 50.0);
            surface.draw_source("Offline", 100.0, 50.0);
        });

        let shapes: Vec<_> = output.shapes.iter().map(|c| &c.shape).collect();
        assert_eq!(shapes.iter().filter(|s| s.texture_id() == camera).count(), 1);
        assert!(shapes
            .iter()
            .any(|s| matches!(s, egui::Shape::Rect(r) if r.fill == Color32::BLACK)));
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(to_color32(Color::PROGRAM), Color32::from_rgb(0xD0, 0, 0));
    }
}
