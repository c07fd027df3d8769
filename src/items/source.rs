//! Single video source cell
//!
//! Shows one host source letterboxed (or stretched) into the cell, with an
//! optional name label, safe-area guides and a draggable volume meter.

use std::time::Instant;

use serde_json::{Map, Value};

use super::volume_meter::VolumeMeter;
use super::widget::{clamp_channel_width, clamp_font_scale, clamp_meter_height, ConfigWidget, SourceOptions};
use super::{
    draw_background, json_bool, json_f32, json_i32, json_str, kind, toggle_stretch, ContextMenu, ItemBase,
    ItemError, LayoutItem, MouseButtons, MouseData,
};
use crate::grid::{fit_and_center, Cell, ItemConfig};
use crate::host::{Color, Frontend, GraphicsContext};

pub const ACTION_SAFE_BORDERS: &str = "source.safe_borders";
pub const ACTION_LABEL: &str = "source.label";
pub const ACTION_VOLUME: &str = "source.volume";

const DEFAULT_METER_POS: i32 = 10;
/// Stored meter offsets beyond this are from a corrupt file
const METER_POS_MAX: i32 = 1 << 16;
/// Label plate sits this many label heights above the bottom edge
const LABEL_LIFT: f32 = 1.5;

/// Label font size for a canvas of the given height
pub fn label_font_size(canvas_height: i32, font_scale: f32) -> f32 {
    (canvas_height as f32 / 1.5 / 9.81).floor() * font_scale
}

#[derive(Debug, Clone)]
pub struct SourceItem {
    base: ItemBase,
    source: Option<String>,
    show_safe_borders: bool,
    show_label: bool,
    show_volume: bool,
    font_scale: f32,
    volume_meter_height: f32,
    volume_meter_x: i32,
    volume_meter_y: i32,
    channel_width: i32,
    meter: Option<VolumeMeter>,
    dragging_volume: bool,
    drag_offset: (i32, i32),
    volume_supported: bool,
}

impl SourceItem {
    pub fn new(cell: Cell) -> Self {
        Self {
            base: ItemBase::new(cell),
            source: None,
            show_safe_borders: false,
            show_label: true,
            show_volume: false,
            font_scale: 1.0,
            volume_meter_height: 0.5,
            volume_meter_x: DEFAULT_METER_POS,
            volume_meter_y: DEFAULT_METER_POS,
            channel_width: 2,
            meter: None,
            dragging_volume: false,
            drag_offset: (0, 0),
            volume_supported: true,
        }
    }

    /// Variant without the volume meter toggle
    pub(crate) fn without_volume(cell: Cell) -> Self {
        Self { volume_supported: false, ..Self::new(cell) }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: Option<String>) {
        self.source = source;
        self.rebuild_meter();
    }

    pub fn show_label(&self) -> bool {
        self.show_label
    }

    pub fn set_show_label(&mut self, show: bool) {
        self.show_label = show;
    }

    pub fn show_safe_borders(&self) -> bool {
        self.show_safe_borders
    }

    pub fn set_show_safe_borders(&mut self, show: bool) {
        self.show_safe_borders = show;
    }

    pub fn show_volume(&self) -> bool {
        self.show_volume
    }

    pub fn set_show_volume(&mut self, show: bool) {
        if let Some(meter) = &self.meter {
            self.volume_meter_x = meter.x();
            self.volume_meter_y = meter.y();
        }
        self.show_volume = show && self.volume_supported;
        self.rebuild_meter();
    }

    pub fn font_scale(&self) -> f32 {
        self.font_scale
    }

    pub fn set_font_scale(&mut self, scale: f32) {
        self.font_scale = clamp_font_scale(scale);
    }

    pub fn meter(&self) -> Option<&VolumeMeter> {
        self.meter.as_ref()
    }

    fn meter_pixel_height(&self) -> i32 {
        (self.base.geometry.inner_height as f32 * self.volume_meter_height) as i32
    }

    fn rebuild_meter(&mut self) {
        self.meter = match (&self.source, self.show_volume) {
            (Some(name), true) => Some(VolumeMeter::new(
                name.clone(),
                self.volume_meter_x,
                self.volume_meter_y,
                self.meter_pixel_height(),
                self.channel_width,
            )),
            _ => None,
        };
    }

    /// Offset and per-axis scale placing a `w` x `h` frame inside the cell
    pub(crate) fn content_transform(&self, w: f32, h: f32) -> (f32, f32, f32, f32) {
        let g = &self.base.geometry;
        if w <= 0.0 || h <= 0.0 {
            return (0.0, 0.0, 0.0, 0.0);
        }
        if self.base.stretch {
            (0.0, 0.0, g.inner_width as f32 / w, g.inner_height as f32 / h)
        } else {
            let fit = fit_and_center(w as i32, h as i32, g.inner_width, g.inner_height);
            (fit.x as f32, fit.y as f32, fit.scale, fit.scale)
        }
    }

    /// Name plate centered near the bottom of the content.
    ///
    /// Scaled like a canvas-sized frame in this cell so text stays
    /// proportional regardless of the source's own resolution.
    pub(crate) fn render_label(&self, gfx: &mut dyn GraphicsContext, cfg: &ItemConfig, text: &str, content_bottom: f32) {
        let size = label_font_size(cfg.canvas_height, self.font_scale);
        let text = format!(" {text} ");
        let (lw, lh) = gfx.label_size(&text, size);
        if lw <= 0.0 || lh <= 0.0 {
            return;
        }
        let g = &self.base.geometry;
        let label_scale = fit_and_center(cfg.canvas_width, cfg.canvas_height, g.inner_width, g.inner_height).scale;

        gfx.push_matrix();
        gfx.translate(
            (g.inner_width as f32 - lw * label_scale) / 2.0,
            content_bottom - lh * label_scale * LABEL_LIFT,
        );
        gfx.scale(label_scale, label_scale);
        gfx.draw_box(0.0, 0.0, lw, lh, Color::LABEL_BACKGROUND);
        gfx.translate(0.0, -(lh * 0.08));
        gfx.draw_label(&text, size, Color::WHITE);
        gfx.pop_matrix();
    }

    pub(crate) fn render_meter(&mut self, gfx: &mut dyn GraphicsContext, host: &dyn Frontend, cfg: &ItemConfig) {
        let Some(meter) = self.meter.as_mut() else {
            return;
        };
        let levels = host.audio_levels(meter.source());
        meter.set_cell_scale(cfg.scale);
        meter.render(gfx, levels.as_ref(), Instant::now());
    }

    fn toggle_volume_meter(&mut self) {
        let show = !self.show_volume;
        self.set_show_volume(show);
    }

    pub(crate) fn write_fields(&self, obj: &mut Map<String, Value>) {
        if let Some(source) = &self.source {
            obj.insert("source".into(), source.clone().into());
        }
        obj.insert("show_safe_borders".into(), self.show_safe_borders.into());
        obj.insert("show_label".into(), self.show_label.into());
        obj.insert("show_volume".into(), self.show_volume.into());
        obj.insert("font_scale".into(), f64::from(self.font_scale).into());
        obj.insert("volume_meter_channel_width".into(), self.channel_width.into());
        obj.insert("volume_meter_height".into(), f64::from(self.volume_meter_height).into());
        let (x, y) = match &self.meter {
            Some(meter) => (meter.x(), meter.y()),
            None => (self.volume_meter_x, self.volume_meter_y),
        };
        obj.insert("volume_meter_x".into(), x.into());
        obj.insert("volume_meter_y".into(), y.into());
    }

    pub(crate) fn read_fields(&mut self, obj: &Map<String, Value>) -> Result<(), ItemError> {
        self.show_safe_borders = json_bool(obj, "show_safe_borders")?.unwrap_or(false);
        self.show_label = json_bool(obj, "show_label")?.unwrap_or(true);
        self.show_volume = json_bool(obj, "show_volume")?.unwrap_or(false) && self.volume_supported;
        self.font_scale = clamp_font_scale(json_f32(obj, "font_scale")?.unwrap_or(1.0));
        self.channel_width = clamp_channel_width(json_i32(obj, "volume_meter_channel_width")?.unwrap_or(2));
        self.volume_meter_height = clamp_meter_height(json_f32(obj, "volume_meter_height")?.unwrap_or(0.5));
        let meter_pos = |field: &'static str| -> Result<i32, ItemError> {
            Ok(json_i32(obj, field)?.unwrap_or(DEFAULT_METER_POS).clamp(0, METER_POS_MAX))
        };
        self.volume_meter_x = meter_pos("volume_meter_x")?;
        self.volume_meter_y = meter_pos("volume_meter_y")?;
        self.source = json_str(obj, "source")?.map(str::to_string);
        self.rebuild_meter();
        Ok(())
    }

    pub(crate) fn add_menu_toggles(&self, menu: &mut ContextMenu) {
        menu.add_toggle(ACTION_SAFE_BORDERS, "Draw safe borders", self.show_safe_borders);
        menu.add_toggle(ACTION_LABEL, "Show label", self.show_label);
        if self.volume_supported {
            menu.add_toggle(ACTION_VOLUME, "Show volume meter", self.show_volume);
        }
    }

    pub(crate) fn apply_toggle(&mut self, action: &str) -> bool {
        match action {
            ACTION_SAFE_BORDERS => self.show_safe_borders = !self.show_safe_borders,
            ACTION_LABEL => self.show_label = !self.show_label,
            ACTION_VOLUME if self.volume_supported => self.toggle_volume_meter(),
            _ => return toggle_stretch(&mut self.base, action),
        }
        true
    }
}

/// Title/action safe guides over a `w` x `h` frame, in frame coordinates
pub fn render_safe_areas(gfx: &mut dyn GraphicsContext, w: f32, h: f32) {
    let color = Color::BORDER_GRAY;
    let t = (h / 540.0).max(1.0);
    let outline = |gfx: &mut dyn GraphicsContext, x: f32, y: f32, cx: f32, cy: f32| {
        gfx.draw_box(x, y, cx, t, color);
        gfx.draw_box(x, y + cy - t, cx, t, color);
        gfx.draw_box(x, y, t, cy, color);
        gfx.draw_box(x + cx - t, y, t, cy, color);
    };

    // Action safe 3.5%, graphics safe 5%
    for margin in [0.035, 0.05] {
        let (mx, my) = (w * margin, h * margin);
        outline(gfx, mx, my, w - 2.0 * mx, h - 2.0 * my);
    }

    // 4:3 guides inside the graphics safe height
    let four_by_three = h * 4.0 / 3.0;
    if four_by_three < w {
        let x = (w - four_by_three) / 2.0;
        let (y, cy) = (h * 0.05, h * 0.9);
        gfx.draw_box(x, y, t, cy, color);
        gfx.draw_box(x + four_by_three - t, y, t, cy, color);
    }

    // Center ticks on the left, top and right edges
    let tick_w = w * 0.035;
    let tick_h = h * 0.035;
    gfx.draw_box(0.0, h / 2.0, tick_w, t, color);
    gfx.draw_box(w / 2.0, 0.0, t, tick_h, color);
    gfx.draw_box(w - tick_w, h / 2.0, tick_w, t, color);
}

impl LayoutItem for SourceItem {
    fn base(&self) -> &ItemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    fn kind_id(&self) -> &str {
        kind::SOURCE
    }

    fn update(&mut self, cfg: &ItemConfig) {
        self.base.update(cfg);
        let height = self.meter_pixel_height();
        if let Some(meter) = self.meter.as_mut() {
            meter.set_height(height);
            meter.set_cell_scale(cfg.scale);
        }
    }

    fn render(&mut self, gfx: &mut dyn GraphicsContext, host: &dyn Frontend, cfg: &ItemConfig) {
        draw_background(&self.base, gfx);

        let Some(name) = self.source.clone() else {
            return;
        };
        let Some((w, h)) = host.source_size(&name) else {
            return;
        };
        let (w, h) = (w as f32, h as f32);
        let (ox, oy, sx, sy) = self.content_transform(w, h);

        gfx.push_matrix();
        gfx.translate(ox, oy);
        gfx.scale(sx, sy);
        gfx.draw_source(&name, w, h);
        if self.show_safe_borders {
            render_safe_areas(gfx, w, h);
        }
        gfx.pop_matrix();

        self.render_meter(gfx, host, cfg);

        if self.show_label {
            self.render_label(gfx, cfg, &name, oy + h * sy);
        }
    }

    fn mouse_event(&mut self, e: &MouseData, cfg: &ItemConfig, _host: &dyn Frontend) {
        self.base.mouse_event(e, cfg);
        let (mx, my) = self.base.mouse_pos();
        let (width, height) = (self.base.geometry.width, self.base.geometry.height);
        let hovered = self.base.hovered();
        let Some(meter) = self.meter.as_mut() else {
            return;
        };

        if e.buttons.contains(MouseButtons::LEFT) && hovered {
            if !self.dragging_volume && meter.mouse_over(mx, my) {
                self.dragging_volume = true;
                self.drag_offset = (mx - meter.x(), my - meter.y());
            }
            if self.dragging_volume {
                let x = (mx - self.drag_offset.0).min(width - meter.width()).max(0);
                let y = (my - self.drag_offset.1).min(height - meter.height()).max(0);
                meter.set_pos(x, y);
            }
        } else {
            self.dragging_volume = false;
        }
    }

    fn context_menu(&mut self, menu: &mut ContextMenu, _host: &dyn Frontend) {
        menu.add_toggle(super::ACTION_STRETCH, "Stretch to fill", self.base.stretch);
        self.add_menu_toggles(menu);
    }

    fn trigger_action(&mut self, action: &str, _host: &dyn Frontend) -> bool {
        self.apply_toggle(action)
    }

    fn write_to_json(&self, obj: &mut Map<String, Value>) {
        self.base.write_to_json(self.kind_id(), obj);
        self.write_fields(obj);
    }

    fn read_from_json(&mut self, obj: &Map<String, Value>) -> Result<(), ItemError> {
        self.base.read_from_json(obj)?;
        self.read_fields(obj)
    }

    fn config_widget(&self, host: &dyn Frontend) -> Option<ConfigWidget> {
        let mut sources = host.video_sources();
        sources.sort();
        Some(ConfigWidget::Source(SourceOptions {
            sources,
            selected: self.source.clone(),
            font_scale: self.font_scale,
            show_volume: self.show_volume,
            channel_width: self.channel_width,
            volume_meter_height: self.volume_meter_height,
        }))
    }

    fn load_config_from_widget(&mut self, widget: &ConfigWidget, _host: &dyn Frontend) {
        let ConfigWidget::Source(o) = widget else {
            return;
        };
        self.font_scale = clamp_font_scale(o.font_scale);
        self.channel_width = clamp_channel_width(o.channel_width);
        self.volume_meter_height = clamp_meter_height(o.volume_meter_height);
        self.volume_meter_x = DEFAULT_METER_POS;
        self.volume_meter_y = DEFAULT_METER_POS;
        self.show_volume = o.show_volume && self.volume_supported;
        self.set_source(o.selected.clone());
    }

    fn source_name(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Modifiers, MouseEventKind};
    use crate::test_support::{MockFrontend, RecordingSurface};

    fn cfg() -> ItemConfig {
        ItemConfig {
            cx: 1920,
            cy: 1080,
            canvas_width: 1920,
            canvas_height: 1080,
            cell_width: 480.0,
            cell_height: 270.0,
            ..Default::default()
        }
    }

    fn source_item(name: &str) -> SourceItem {
        let mut item = SourceItem::new(Cell::new(0, 0, 2, 2));
        item.set_source(Some(name.to_string()));
        item.update(&cfg());
        item
    }

    fn mouse(x: i32, y: i32, buttons: MouseButtons, kind: MouseEventKind) -> MouseData {
        MouseData { x, y, buttons, modifiers: Modifiers::default(), kind }
    }

    #[test]
    fn test_json_round_trip() {
        let mut item = source_item("Camera");
        item.base_mut().stretch = true;
        item.set_show_safe_borders(true);
        item.set_show_label(false);
        item.set_font_scale(1.25);
        item.set_show_volume(true);

        let mut obj = Map::new();
        item.write_to_json(&mut obj);

        let mut copy = SourceItem::new(Cell::zero());
        copy.read_from_json(&obj).unwrap();
        assert_eq!(copy.cell(), item.cell());
        assert!(copy.base().stretch);
        assert_eq!(copy.source(), Some("Camera"));
        assert!(copy.show_safe_borders());
        assert!(!copy.show_label());
        assert!(copy.show_volume());
        assert!((copy.font_scale() - 1.25).abs() < 1e-6);

        let mut again = Map::new();
        copy.write_to_json(&mut again);
        assert_eq!(obj, again);
    }

    #[test]
    fn test_out_of_range_fields_are_clamped() {
        let obj = serde_json::json!({
            "id": "SourceItem", "col": 0, "row": 0, "w": 1, "h": 1,
            "font_scale": 1e9,
            "volume_meter_channel_width": 2_000_000_000,
            "volume_meter_height": -3.0,
            "volume_meter_x": -50,
            "volume_meter_y": 2_000_000_000,
        });
        let mut item = SourceItem::new(Cell::zero());
        item.read_from_json(obj.as_object().unwrap()).unwrap();
        assert_eq!(item.font_scale(), 5.0);

        let mut saved = Map::new();
        item.write_to_json(&mut saved);
        assert_eq!(saved["volume_meter_channel_width"], 32);
        assert!((saved["volume_meter_height"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(saved["volume_meter_x"], 0);
        assert_eq!(saved["volume_meter_y"], 1 << 16);
    }

    #[test]
    fn test_missing_flags_default() {
        let obj = serde_json::json!({ "id": "SourceItem", "col": 0, "row": 0, "w": 1, "h": 1 });
        let mut item = SourceItem::new(Cell::zero());
        item.read_from_json(obj.as_object().unwrap()).unwrap();
        assert!(item.show_label());
        assert!(!item.show_volume());
        assert!(!item.show_safe_borders());
        assert_eq!(item.source(), None);
        assert!(item.meter().is_none());
    }

    #[test]
    fn test_render_letterboxes_source() {
        let host = MockFrontend::default();
        host.add_video_source("Camera");
        let mut item = source_item("Camera");
        let mut gfx = RecordingSurface::default();
        item.render(&mut gfx, &host, &cfg());
        assert_eq!(gfx.sources(), vec!["Camera".to_string()]);
        assert_eq!(gfx.labels(), vec![" Camera ".to_string()]);
        assert_eq!(gfx.matrix_depth, 0);

        let (ox, oy, sx, sy) = item.content_transform(1920.0, 1080.0);
        assert_eq!(sx, sy);
        assert!(ox >= 0.0 && oy >= 0.0);
    }

    #[test]
    fn test_missing_source_draws_background_only() {
        let host = MockFrontend::default();
        let mut item = source_item("Gone");
        let mut gfx = RecordingSurface::default();
        item.render(&mut gfx, &host, &cfg());
        assert!(gfx.sources().is_empty());
        assert_eq!(gfx.boxes_with(Color::BLACK), 1);
    }

    #[test]
    fn test_stretch_uses_independent_axes() {
        let mut item = source_item("Camera");
        item.base_mut().stretch = true;
        let (_, _, sx, sy) = item.content_transform(1000.0, 1000.0);
        assert!((sx - 952.0 / 1000.0).abs() < 1e-6);
        assert!((sy - 532.0 / 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_context_menu_toggles() {
        let host = MockFrontend::default();
        let mut item = source_item("Camera");
        let mut menu = ContextMenu::new("Options");
        item.context_menu(&mut menu, &host);
        assert_eq!(
            menu.action_ids(),
            vec![super::super::ACTION_STRETCH, ACTION_SAFE_BORDERS, ACTION_LABEL, ACTION_VOLUME]
        );

        assert!(item.trigger_action(ACTION_VOLUME, &host));
        assert!(item.meter().is_some());
        assert!(item.trigger_action(ACTION_LABEL, &host));
        assert!(!item.show_label());
        assert!(!item.trigger_action("scene.indicator.icon", &host));
    }

    #[test]
    fn test_volume_meter_drag_is_clamped() {
        let host = MockFrontend::default();
        let mut item = source_item("Camera");
        item.set_show_volume(true);
        item.update(&cfg());
        let meter_height = item.meter().map(|m| m.height()).unwrap_or(0);
        assert_eq!(meter_height, 266);

        item.mouse_event(&mouse(12, 12, MouseButtons::NONE, MouseEventKind::Move), &cfg(), &host);
        item.mouse_event(&mouse(12, 12, MouseButtons::LEFT, MouseEventKind::Press), &cfg(), &host);
        item.mouse_event(&mouse(959, 539, MouseButtons::LEFT, MouseEventKind::Move), &cfg(), &host);

        let meter = item.meter().unwrap();
        assert_eq!(meter.x(), 960 - meter.width());
        assert_eq!(meter.y(), 540 - meter.height());

        item.mouse_event(&mouse(0, 0, MouseButtons::NONE, MouseEventKind::Release), &cfg(), &host);
        let mut obj = Map::new();
        item.write_to_json(&mut obj);
        assert_eq!(obj["volume_meter_y"], serde_json::json!(540 - 266));
    }

    #[test]
    fn test_widget_primes_item() {
        let host = MockFrontend::default();
        host.add_video_source("Zeta");
        host.add_video_source("Alpha");
        let mut item = SourceItem::new(Cell::unit(0, 0));
        let Some(ConfigWidget::Source(mut options)) = item.config_widget(&host) else {
            panic!("source items offer a source widget");
        };
        assert_eq!(options.sources, vec!["Alpha".to_string(), "Zeta".to_string()]);
        options.selected = Some("Zeta".into());
        options.show_volume = true;
        item.load_config_from_widget(&ConfigWidget::Source(options), &host);
        assert_eq!(item.source_name(), Some("Zeta"));
        assert!(item.meter().is_some());
    }

    #[test]
    fn test_label_font_size() {
        assert_eq!(label_font_size(1080, 1.0), 73.0);
        assert_eq!(label_font_size(1080, 2.0), 146.0);
    }
}
