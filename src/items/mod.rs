//! Layout items
//!
//! Everything that can occupy a cell of the grid implements `LayoutItem`:
//! - `PlaceholderItem` - empty filler, keeps the grid fully tiled
//! - `SourceItem` - one video source with label, safe areas and volume meter
//! - `SceneItem` - a scene with preview/program indicator and click switching
//! - `PreviewProgramItem` - the host's preview or program output
//! - `AudioMixerItem` - fader strip for all active audio sources
//! - `CustomItem` - behavior supplied by an external plugin (see `bridge`)
//!
//! Shared state (cell, hover, pixel geometry, stretch flag) lives in
//! `ItemBase`; variants embed it and override only what they change.

pub mod audio_mixer;
pub mod custom;
pub mod menu;
pub mod placeholder;
pub mod preview_program;
pub mod scene;
pub mod source;
pub mod volume_meter;
pub mod widget;

pub use audio_mixer::AudioMixerItem;
pub use custom::CustomItem;
pub use menu::{ContextMenu, MenuAction, MenuEntry};
pub use placeholder::PlaceholderItem;
pub use preview_program::PreviewProgramItem;
pub use scene::{Indicator, SceneItem};
pub use source::SourceItem;
pub use volume_meter::VolumeMeter;
pub use widget::ConfigWidget;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::bridge::BridgeError;
use crate::grid::{Cell, ItemConfig};
use crate::host::{Color, Frontend, GraphicsContext};

/// Serialized type identifiers
pub mod kind {
    pub const PLACEHOLDER: &str = "PlaceholderItem";
    pub const SOURCE: &str = "SourceItem";
    pub const SCENE: &str = "SceneItem";
    pub const PREVIEW_PROGRAM: &str = "PreviewProgramItem";
    pub const AUDIO_MIXER: &str = "AudioMixerItem";
    /// Shared by every external kind; `custom_id` names the real one
    pub const CUSTOM: &str = "CustomItem";
}

/// Menu action id of the stretch toggle every item except the placeholder has
pub const ACTION_STRETCH: &str = "item.stretch";

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("field '{field}' has the wrong type")]
    InvalidField { field: &'static str },
    #[error("custom item '{id}' rejected its stored data")]
    CustomLoad { id: String },
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Pointer buttons, same bit values as the host's button mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtons(pub u32);

impl MouseButtons {
    pub const NONE: MouseButtons = MouseButtons(0);
    pub const LEFT: MouseButtons = MouseButtons(0x1);
    pub const RIGHT: MouseButtons = MouseButtons(0x2);
    pub const MIDDLE: MouseButtons = MouseButtons(0x4);

    pub fn contains(self, other: MouseButtons) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl std::ops::BitOr for MouseButtons {
    type Output = MouseButtons;

    fn bitor(self, rhs: Self) -> Self {
        MouseButtons(self.0 | rhs.0)
    }
}

/// Keyboard modifier mask, passed through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Move,
    Press,
    Release,
    DoubleClick,
}

/// Pointer event in grid-local pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseData {
    pub x: i32,
    pub y: i32,
    /// Buttons held after the event
    pub buttons: MouseButtons,
    pub modifiers: Modifiers,
    pub kind: MouseEventKind,
}

/// Pixel geometry of an item, recomputed by `update`.
///
/// `#[repr(C)]` so custom items can read it through the bridge.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemGeometry {
    /// Absolute position inside the whole display
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    /// Position relative to the grid origin
    pub rel_left: i32,
    pub rel_top: i32,
    pub rel_right: i32,
    pub rel_bottom: i32,
    pub width: i32,
    pub height: i32,
    /// Size left after the border inset
    pub inner_width: i32,
    pub inner_height: i32,
}

/// State every item carries
#[derive(Debug, Clone, Default)]
pub struct ItemBase {
    pub cell: Cell,
    /// Unit cell under the pointer; a spanning item may cover many
    pub hovered_cell: Cell,
    pub stretch: bool,
    pub geometry: ItemGeometry,
    hovered: bool,
    mouse_x: i32,
    mouse_y: i32,
}

impl ItemBase {
    pub fn new(cell: Cell) -> Self {
        Self { cell, ..Default::default() }
    }

    pub fn update(&mut self, cfg: &ItemConfig) {
        let c = self.cell;
        let g = &mut self.geometry;
        g.rel_left = (cfg.cell_width * c.col as f32) as i32;
        g.left = cfg.x + g.rel_left;
        g.rel_right = (cfg.cell_width * c.right() as f32) as i32;
        g.right = cfg.x + g.rel_right;
        g.rel_top = (cfg.cell_height * c.row as f32) as i32;
        g.top = cfg.y + g.rel_top;
        g.rel_bottom = (cfg.cell_height * c.bottom() as f32) as i32;
        g.bottom = cfg.y + g.rel_bottom;
        g.width = (cfg.cell_width * c.w as f32) as i32;
        g.height = (cfg.cell_height * c.h as f32) as i32;
        g.inner_width = (g.width as f32 - cfg.border2) as i32;
        g.inner_height = (g.height as f32 - cfg.border2) as i32;
    }

    /// Hover tracking shared by all variants
    pub fn mouse_event(&mut self, e: &MouseData, cfg: &ItemConfig) {
        if e.kind == MouseEventKind::Move {
            self.hovered = self.is_over(e.x, e.y);
        }
        self.mouse_x = e.x - self.geometry.rel_left;
        self.mouse_y = e.y - self.geometry.rel_top;
        if self.hovered {
            if let Some((col, row)) = cfg.cell_at(e.x, e.y) {
                self.hovered_cell = Cell::unit(col, row);
            }
        }
    }

    pub fn is_over(&self, x: i32, y: i32) -> bool {
        let g = &self.geometry;
        x >= g.rel_left && x < g.rel_right && y >= g.rel_top && y < g.rel_bottom
    }

    pub fn hovered(&self) -> bool {
        self.hovered
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Pointer position relative to the item's top-left corner
    pub fn mouse_pos(&self) -> (i32, i32) {
        (self.mouse_x, self.mouse_y)
    }

    pub fn write_to_json(&self, kind_id: &str, obj: &mut Map<String, Value>) {
        obj.insert("col".into(), self.cell.col.into());
        obj.insert("row".into(), self.cell.row.into());
        obj.insert("w".into(), self.cell.w.into());
        obj.insert("h".into(), self.cell.h.into());
        obj.insert("stretch".into(), self.stretch.into());
        obj.insert("id".into(), kind_id.into());
    }

    pub fn read_from_json(&mut self, obj: &Map<String, Value>) -> Result<(), ItemError> {
        self.cell = Cell::new(
            json_i32(obj, "col")?.unwrap_or(0),
            json_i32(obj, "row")?.unwrap_or(0),
            json_i32(obj, "w")?.unwrap_or(0),
            json_i32(obj, "h")?.unwrap_or(0),
        );
        self.stretch = json_bool(obj, "stretch")?.unwrap_or(false);
        Ok(())
    }
}

/// Polymorphic grid content.
///
/// The layout owns every item and calls these from the render and input
/// paths. `render` draws in item-local coordinates: the caller has already
/// clipped to the inner rectangle and placed its top-left corner at (0, 0).
pub trait LayoutItem: Send {
    fn base(&self) -> &ItemBase;
    fn base_mut(&mut self) -> &mut ItemBase;

    /// Serialized type identifier
    fn kind_id(&self) -> &str;

    /// Recompute pixel geometry; idempotent
    fn update(&mut self, cfg: &ItemConfig) {
        self.base_mut().update(cfg);
    }

    fn render(&mut self, gfx: &mut dyn GraphicsContext, _host: &dyn Frontend, _cfg: &ItemConfig) {
        draw_background(self.base(), gfx);
    }

    fn mouse_event(&mut self, e: &MouseData, cfg: &ItemConfig, _host: &dyn Frontend) {
        self.base_mut().mouse_event(e, cfg);
    }

    fn context_menu(&mut self, menu: &mut ContextMenu, _host: &dyn Frontend) {
        menu.add_toggle(ACTION_STRETCH, "Stretch to fill", self.base().stretch);
    }

    /// Apply a menu action this item contributed; false if it isn't ours
    fn trigger_action(&mut self, action: &str, _host: &dyn Frontend) -> bool {
        toggle_stretch(self.base_mut(), action)
    }

    fn write_to_json(&self, obj: &mut Map<String, Value>) {
        self.base().write_to_json(self.kind_id(), obj);
    }

    fn read_from_json(&mut self, obj: &Map<String, Value>) -> Result<(), ItemError> {
        self.base_mut().read_from_json(obj)
    }

    /// Border color while not hovered
    fn fill_color(&self, _host: &dyn Frontend) -> Color {
        Color::BORDER_GRAY
    }

    fn config_widget(&self, _host: &dyn Frontend) -> Option<ConfigWidget> {
        None
    }

    fn load_config_from_widget(&mut self, _widget: &ConfigWidget, _host: &dyn Frontend) {}

    /// Name of the source or scene shown, if any
    fn source_name(&self) -> Option<&str> {
        None
    }

    fn cell(&self) -> Cell {
        self.base().cell
    }

    fn set_cell(&mut self, cell: Cell) {
        self.base_mut().cell = cell;
    }

    fn hovered(&self) -> bool {
        self.base().hovered()
    }
}

/// Opaque black background sized to the inner rectangle
pub fn draw_background(base: &ItemBase, gfx: &mut dyn GraphicsContext) {
    let g = &base.geometry;
    gfx.draw_box(0.0, 0.0, g.inner_width as f32, g.inner_height as f32, Color::BLACK);
}

pub(crate) fn toggle_stretch(base: &mut ItemBase, action: &str) -> bool {
    if action == ACTION_STRETCH {
        base.stretch = !base.stretch;
        return true;
    }
    false
}

pub(crate) fn json_i32(obj: &Map<String, Value>, field: &'static str) -> Result<Option<i32>, ItemError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|v| i32::try_from(v).ok())
            .map(Some)
            .ok_or(ItemError::InvalidField { field }),
        Some(_) => Err(ItemError::InvalidField { field }),
    }
}

pub(crate) fn json_f32(obj: &Map<String, Value>, field: &'static str) -> Result<Option<f32>, ItemError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|v| Some(v as f32))
            .ok_or(ItemError::InvalidField { field }),
        Some(_) => Err(ItemError::InvalidField { field }),
    }
}

pub(crate) fn json_bool(obj: &Map<String, Value>, field: &'static str) -> Result<Option<bool>, ItemError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ItemError::InvalidField { field }),
    }
}

pub(crate) fn json_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<Option<&'a str>, ItemError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ItemError::InvalidField { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg() -> ItemConfig {
        ItemConfig {
            x: 10,
            y: 20,
            cell_width: 480.0,
            cell_height: 270.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_base_update_geometry() {
        let mut base = ItemBase::new(Cell::new(1, 1, 2, 1));
        base.update(&cfg());
        let g = base.geometry;
        assert_eq!((g.rel_left, g.rel_top, g.rel_right, g.rel_bottom), (480, 270, 1440, 540));
        assert_eq!((g.left, g.top), (490, 290));
        assert_eq!((g.width, g.height), (960, 270));
        assert_eq!((g.inner_width, g.inner_height), (952, 262));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut base = ItemBase::new(Cell::new(0, 2, 1, 2));
        base.update(&cfg());
        let first = base.geometry;
        base.update(&cfg());
        assert_eq!(first, base.geometry);
    }

    #[test]
    fn test_hover_tracks_sub_cell() {
        let mut base = ItemBase::new(Cell::new(0, 0, 2, 2));
        base.update(&cfg());
        let e = MouseData {
            x: 500,
            y: 300,
            buttons: MouseButtons::NONE,
            modifiers: Modifiers::default(),
            kind: MouseEventKind::Move,
        };
        base.mouse_event(&e, &cfg());
        assert!(base.hovered());
        assert_eq!(base.hovered_cell, Cell::unit(1, 1));
        assert_eq!(base.mouse_pos(), (500, 300));

        let away = MouseData { x: 2000, ..e };
        base.mouse_event(&away, &cfg());
        assert!(!base.hovered());
    }

    #[test]
    fn test_press_keeps_hover_state() {
        let mut base = ItemBase::new(Cell::unit(0, 0));
        base.update(&cfg());
        base.set_hovered(true);
        let e = MouseData {
            x: 5000,
            y: 5000,
            buttons: MouseButtons::LEFT,
            modifiers: Modifiers::default(),
            kind: MouseEventKind::Press,
        };
        base.mouse_event(&e, &cfg());
        assert!(base.hovered());
    }

    #[test]
    fn test_base_json() {
        let mut base = ItemBase::new(Cell::new(1, 2, 3, 1));
        base.stretch = true;
        let mut obj = Map::new();
        base.write_to_json(kind::SOURCE, &mut obj);
        assert_eq!(obj["id"], json!("SourceItem"));

        let mut other = ItemBase::default();
        other.read_from_json(&obj).unwrap();
        assert_eq!(other.cell, base.cell);
        assert!(other.stretch);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let obj = json!({ "col": 1, "row": 1 });
        let mut base = ItemBase::default();
        base.read_from_json(obj.as_object().unwrap()).unwrap();
        assert_eq!(base.cell, Cell::new(1, 1, 0, 0));
        assert!(!base.stretch);
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let obj = json!({ "col": "one" });
        let mut base = ItemBase::default();
        assert!(matches!(
            base.read_from_json(obj.as_object().unwrap()),
            Err(ItemError::InvalidField { field: "col" })
        ));
    }

    #[test]
    fn test_mouse_buttons() {
        let held = MouseButtons::LEFT | MouseButtons::RIGHT;
        assert!(held.contains(MouseButtons::RIGHT));
        assert!(!MouseButtons::LEFT.contains(MouseButtons::RIGHT));
        assert!(!held.contains(MouseButtons::NONE));
    }
}
