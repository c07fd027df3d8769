//! Preview or program output cell

use serde_json::{Map, Value};

use super::source::{render_safe_areas, SourceItem};
use super::widget::{ConfigWidget, PreviewProgramOptions};
use super::{draw_background, json_bool, kind, ContextMenu, ItemBase, ItemError, LayoutItem, MouseData};
use crate::grid::{Cell, ItemConfig};
use crate::host::{Frontend, GraphicsContext};

/// Mirrors the host's main output.
///
/// Outside studio mode there is no separate preview, so both flavors show
/// the program feed.
#[derive(Debug, Clone)]
pub struct PreviewProgramItem {
    inner: SourceItem,
    is_program: bool,
}

impl PreviewProgramItem {
    pub fn new(cell: Cell) -> Self {
        Self { inner: SourceItem::without_volume(cell), is_program: false }
    }

    pub fn preview(cell: Cell) -> Self {
        let mut item = Self::new(cell);
        item.inner.set_show_safe_borders(true);
        item
    }

    pub fn program(cell: Cell) -> Self {
        Self { is_program: true, ..Self::new(cell) }
    }

    pub fn is_program(&self) -> bool {
        self.is_program
    }

    pub fn set_program(&mut self, program: bool) {
        self.is_program = program;
    }

    pub fn source_item(&self) -> &SourceItem {
        &self.inner
    }

    fn title(&self) -> &'static str {
        if self.is_program {
            "Program"
        } else {
            "Preview"
        }
    }
}

impl LayoutItem for PreviewProgramItem {
    fn base(&self) -> &ItemBase {
        self.inner.base()
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        self.inner.base_mut()
    }

    fn kind_id(&self) -> &str {
        kind::PREVIEW_PROGRAM
    }

    fn update(&mut self, cfg: &ItemConfig) {
        self.inner.update(cfg);
    }

    fn render(&mut self, gfx: &mut dyn GraphicsContext, host: &dyn Frontend, cfg: &ItemConfig) {
        draw_background(self.base(), gfx);

        let (w, h) = (cfg.canvas_width as f32, cfg.canvas_height as f32);
        let (ox, oy, sx, sy) = self.inner.content_transform(w, h);

        gfx.push_matrix();
        gfx.translate(ox, oy);
        gfx.scale(sx, sy);
        if self.is_program || !host.studio_mode() {
            gfx.draw_program(w, h);
        } else if let Some(scene) = host.preview_scene() {
            gfx.draw_source(&scene, w, h);
        }
        if self.inner.show_safe_borders() {
            render_safe_areas(gfx, w, h);
        }
        gfx.pop_matrix();

        if self.inner.show_label() {
            self.inner.render_label(gfx, cfg, self.title(), oy + h * sy);
        }
    }

    fn mouse_event(&mut self, e: &MouseData, cfg: &ItemConfig, _host: &dyn Frontend) {
        self.base_mut().mouse_event(e, cfg);
    }

    fn context_menu(&mut self, menu: &mut ContextMenu, host: &dyn Frontend) {
        self.inner.context_menu(menu, host);
    }

    fn trigger_action(&mut self, action: &str, _host: &dyn Frontend) -> bool {
        self.inner.apply_toggle(action)
    }

    fn write_to_json(&self, obj: &mut Map<String, Value>) {
        self.base().write_to_json(self.kind_id(), obj);
        self.inner.write_fields(obj);
        obj.insert("is_program".into(), self.is_program.into());
    }

    fn read_from_json(&mut self, obj: &Map<String, Value>) -> Result<(), ItemError> {
        self.base_mut().read_from_json(obj)?;
        self.inner.read_fields(obj)?;
        self.is_program = json_bool(obj, "is_program")?.unwrap_or(false);
        Ok(())
    }

    fn config_widget(&self, _host: &dyn Frontend) -> Option<ConfigWidget> {
        Some(ConfigWidget::PreviewProgram(PreviewProgramOptions {
            program: self.is_program,
            font_scale: self.inner.font_scale(),
        }))
    }

    fn load_config_from_widget(&mut self, widget: &ConfigWidget, _host: &dyn Frontend) {
        let ConfigWidget::PreviewProgram(o) = widget else {
            return;
        };
        self.is_program = o.program;
        self.inner.set_font_scale(o.font_scale);
        if !o.program {
            self.inner.set_show_safe_borders(true);
        }
    }
}
