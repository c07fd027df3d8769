//! Scene cell with preview/program indicator
//!
//! Renders like a source item, tints its border (or draws a small square)
//! when the scene is on preview or program, and switches scenes on click.

use serde_json::{Map, Value};

use super::source::SourceItem;
use super::widget::{ConfigWidget, SceneOptions};
use super::{json_i32, kind, ContextMenu, ItemBase, ItemError, LayoutItem, MouseButtons, MouseData, MouseEventKind};
use crate::grid::{Cell, ItemConfig};
use crate::host::{Color, Frontend, GraphicsContext};

pub const ACTION_INDICATOR_NONE: &str = "scene.indicator.none";
pub const ACTION_INDICATOR_BORDER: &str = "scene.indicator.border";
pub const ACTION_INDICATOR_ICON: &str = "scene.indicator.icon";
/// Prefix of the scene picker actions, followed by the scene name
pub const ACTION_SELECT_PREFIX: &str = "scene.select:";

/// How a scene shows that it is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    None = 0,
    #[default]
    Border = 1,
    Icon = 2,
}

impl Indicator {
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Indicator::None),
            1 => Some(Indicator::Border),
            2 => Some(Indicator::Icon),
            _ => None,
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone)]
pub struct SceneItem {
    inner: SourceItem,
    indicator: Indicator,
}

impl SceneItem {
    pub fn new(cell: Cell) -> Self {
        Self { inner: SourceItem::new(cell), indicator: Indicator::default() }
    }

    /// Scene cell as created by the default layout and bulk fills
    pub fn with_scene(cell: Cell, scene: &str) -> Self {
        let mut item = Self::new(cell);
        item.inner.set_source(Some(scene.to_string()));
        item.inner.set_show_label(true);
        item
    }

    pub fn scene(&self) -> Option<&str> {
        self.inner.source()
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn set_indicator(&mut self, indicator: Indicator) {
        self.indicator = indicator;
    }

    pub fn source_item(&self) -> &SourceItem {
        &self.inner
    }

    /// Red on program, green on preview in studio mode, transparent otherwise
    pub fn indicator_color(&self, host: &dyn Frontend) -> Color {
        let Some(scene) = self.scene() else {
            return Color::TRANSPARENT;
        };
        if host.program_scene().as_deref() == Some(scene) {
            Color::PROGRAM
        } else if host.preview_scene().as_deref() == Some(scene) {
            if host.studio_mode() {
                Color::PREVIEW
            } else {
                Color::PROGRAM
            }
        } else {
            Color::TRANSPARENT
        }
    }

    fn switch_scene(&self, e: &MouseData, host: &dyn Frontend) {
        let Some(scene) = self.scene() else {
            return;
        };
        let settings = host.settings();
        let studio = host.studio_mode();

        match e.kind {
            MouseEventKind::DoubleClick => {
                if !(studio && settings.transition_on_double_click && settings.switch_on_click) {
                    return;
                }
                if host.program_scene().as_deref() != Some(scene) {
                    host.set_program_scene(scene);
                }
            }
            MouseEventKind::Press if studio => {
                if settings.switch_on_click && host.preview_scene().as_deref() != Some(scene) {
                    host.set_preview_scene(scene);
                }
            }
            MouseEventKind::Press => {
                if settings.switch_on_click && host.program_scene().as_deref() != Some(scene) {
                    host.set_program_scene(scene);
                }
            }
            _ => {}
        }
    }
}

impl LayoutItem for SceneItem {
    fn base(&self) -> &ItemBase {
        self.inner.base()
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        self.inner.base_mut()
    }

    fn kind_id(&self) -> &str {
        kind::SCENE
    }

    fn update(&mut self, cfg: &ItemConfig) {
        self.inner.update(cfg);
    }

    fn render(&mut self, gfx: &mut dyn GraphicsContext, host: &dyn Frontend, cfg: &ItemConfig) {
        self.inner.render(gfx, host, cfg);

        if self.indicator == Indicator::Icon {
            let color = self.indicator_color(host);
            if !color.is_transparent() {
                let size = (cfg.cx / 32) as f32;
                gfx.push_matrix();
                gfx.translate((cfg.cx / 16) as f32, (cfg.cy / 16) as f32);
                gfx.draw_box(0.0, 0.0, size, size, color);
                gfx.pop_matrix();
            }
        }
    }

    fn mouse_event(&mut self, e: &MouseData, cfg: &ItemConfig, host: &dyn Frontend) {
        self.inner.mouse_event(e, cfg, host);
        if e.buttons.contains(MouseButtons::LEFT) && self.hovered() {
            self.switch_scene(e, host);
        }
    }

    fn context_menu(&mut self, menu: &mut ContextMenu, host: &dyn Frontend) {
        self.inner.context_menu(menu, host);

        let mut indicator = ContextMenu::new("Indicator");
        indicator.add_toggle(ACTION_INDICATOR_NONE, "None", self.indicator == Indicator::None);
        indicator.add_toggle(ACTION_INDICATOR_BORDER, "Border", self.indicator == Indicator::Border);
        indicator.add_toggle(ACTION_INDICATOR_ICON, "Icon", self.indicator == Indicator::Icon);
        menu.add_submenu("Indicator", indicator);

        let mut scenes = ContextMenu::new("Select scene");
        for scene in host.scenes() {
            let checked = self.scene() == Some(scene.name.as_str());
            scenes.add_toggle(format!("{ACTION_SELECT_PREFIX}{}", scene.name), scene.name, checked);
        }
        if !scenes.is_empty() {
            menu.add_submenu("Select scene", scenes);
        }
    }

    fn trigger_action(&mut self, action: &str, host: &dyn Frontend) -> bool {
        match action {
            ACTION_INDICATOR_NONE => self.indicator = Indicator::None,
            ACTION_INDICATOR_BORDER => self.indicator = Indicator::Border,
            ACTION_INDICATOR_ICON => self.indicator = Indicator::Icon,
            _ => {
                if let Some(scene) = action.strip_prefix(ACTION_SELECT_PREFIX) {
                    if !host.scenes().iter().any(|s| s.name == scene) {
                        return false;
                    }
                    self.inner.set_source(Some(scene.to_string()));
                    return true;
                }
                return self.inner.trigger_action(action, host);
            }
        }
        true
    }

    fn write_to_json(&self, obj: &mut Map<String, Value>) {
        self.base().write_to_json(self.kind_id(), obj);
        self.inner.write_fields(obj);
        obj.insert("border_for_indicator".into(), self.indicator.index().into());
    }

    fn read_from_json(&mut self, obj: &Map<String, Value>) -> Result<(), ItemError> {
        self.base_mut().read_from_json(obj)?;
        self.inner.read_fields(obj)?;
        self.indicator = json_i32(obj, "border_for_indicator")?
            .and_then(Indicator::from_index)
            .unwrap_or_default();
        Ok(())
    }

    fn fill_color(&self, host: &dyn Frontend) -> Color {
        if self.indicator == Indicator::Border {
            let color = self.indicator_color(host);
            if !color.is_transparent() {
                return color;
            }
        }
        Color::BORDER_GRAY
    }

    fn config_widget(&self, host: &dyn Frontend) -> Option<ConfigWidget> {
        let mut scenes: Vec<String> = host.scenes().into_iter().map(|s| s.name).collect();
        scenes.sort();
        Some(ConfigWidget::Scene(SceneOptions {
            scenes,
            selected: self.scene().map(str::to_string),
            font_scale: self.inner.font_scale(),
            indicator: self.indicator,
        }))
    }

    fn load_config_from_widget(&mut self, widget: &ConfigWidget, _host: &dyn Frontend) {
        let ConfigWidget::Scene(o) = widget else {
            return;
        };
        self.inner.set_font_scale(o.font_scale);
        self.inner.set_source(o.selected.clone());
        self.indicator = o.indicator;
    }

    fn source_name(&self) -> Option<&str> {
        self.scene()
    }
}
