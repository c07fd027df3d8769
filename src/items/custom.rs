//! Item backed by a plugin's callback table

use std::ffi::{c_int, c_void, CStr};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{draw_background, kind, ContextMenu, ItemBase, ItemError, ItemGeometry, LayoutItem, MouseData};
use crate::bridge::{CustomData, CustomKind, RenderTarget};
use crate::grid::{Cell, ItemConfig};
use crate::host::{Color, Frontend, GraphicsContext};

/// Custom item instance.
///
/// `init` runs on construction and `destroy` on drop, each exactly once.
pub struct CustomItem {
    /// Boxed so the handle given to `init` stays valid after the item moves
    base: Box<ItemBase>,
    kind: Arc<CustomKind>,
    data: *mut c_void,
}

// Plugin data is only touched by the thread that owns the layout
unsafe impl Send for CustomItem {}

impl CustomItem {
    pub fn new(kind: Arc<CustomKind>, cell: Cell) -> Self {
        let mut item = Self { base: Box::new(ItemBase::new(cell)), kind, data: std::ptr::null_mut() };
        if let Some(init) = item.kind.callbacks.init {
            // SAFETY: the handle is valid for the duration of the call
            item.data = unsafe { init(item.handle()) };
        }
        item
    }

    /// Identifier of the plugin kind, stored as `custom_id`
    pub fn custom_id(&self) -> &str {
        &self.kind.id
    }

    pub fn display_name(&self) -> &str {
        &self.kind.name
    }

    /// Same address for the item's whole lifetime
    fn handle(&self) -> *const ItemGeometry {
        &self.base.geometry
    }

    #[cfg(test)]
    pub(crate) fn private_data(&self) -> *mut c_void {
        self.data
    }
}

impl std::fmt::Debug for CustomItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomItem")
            .field("custom_id", &self.kind.id)
            .field("cell", &self.base.cell)
            .finish()
    }
}

impl Drop for CustomItem {
    fn drop(&mut self) {
        if let Some(destroy) = self.kind.callbacks.destroy {
            // SAFETY: data came from this kind's init and is released exactly once
            unsafe { destroy(self.handle(), self.data) };
        }
    }
}

impl LayoutItem for CustomItem {
    fn base(&self) -> &ItemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    fn kind_id(&self) -> &str {
        kind::CUSTOM
    }

    fn update(&mut self, cfg: &ItemConfig) {
        self.base.update(cfg);
        if let Some(update) = self.kind.callbacks.update {
            let c = self.base.cell;
            // SAFETY: every pointer outlives the call
            unsafe { update(self.handle(), self.data, cfg, c.col, c.row, c.w, c.h) };
        }
    }

    fn render(&mut self, gfx: &mut dyn GraphicsContext, _host: &dyn Frontend, cfg: &ItemConfig) {
        draw_background(&self.base, gfx);
        let Some(render) = self.kind.callbacks.render else {
            return;
        };
        let handle = self.handle();
        let mut target = RenderTarget::new(gfx);
        // SAFETY: target lives on this stack frame until the callback returns
        unsafe { render(handle, self.data, cfg, target.as_raw()) };
    }

    fn mouse_event(&mut self, e: &MouseData, cfg: &ItemConfig, _host: &dyn Frontend) {
        self.base.mouse_event(e, cfg);
        if let Some(mouse_event) = self.kind.callbacks.mouse_event {
            // SAFETY: every pointer outlives the call
            unsafe {
                mouse_event(
                    self.handle(),
                    self.data,
                    cfg,
                    e.x,
                    e.y,
                    e.buttons.0 as c_int,
                    e.modifiers.0 as c_int,
                )
            };
        }
    }

    fn context_menu(&mut self, menu: &mut ContextMenu, _host: &dyn Frontend) {
        menu.add_toggle(super::ACTION_STRETCH, "Stretch to fill", self.base.stretch);
        if let Some(context_menu) = self.kind.callbacks.context_menu {
            // SAFETY: the menu pointer is only used through the exported menu functions
            unsafe { context_menu(self.handle(), self.data, menu as *mut ContextMenu as *mut c_void) };
        }
    }

    fn write_to_json(&self, obj: &mut Map<String, Value>) {
        self.base.write_to_json(self.kind_id(), obj);
        obj.insert("custom_id".into(), self.kind.id.clone().into());

        let Some(save) = self.kind.callbacks.save else {
            return;
        };
        // SAFETY: the returned text stays valid until the next call on this item
        let text = unsafe { save(self.handle(), self.data) };
        if text.is_null() {
            return;
        }
        // SAFETY: non-null and NUL-terminated per the save contract
        match CustomData::from_document(unsafe { CStr::from_ptr(text) }) {
            Ok(data) => {
                obj.insert("custom_data".into(), data.into_value());
            }
            Err(e) => tracing::error!(id = %self.kind.id, error = %e, "Failed to write custom item data"),
        }
    }

    fn read_from_json(&mut self, obj: &Map<String, Value>) -> Result<(), ItemError> {
        self.base.read_from_json(obj)?;
        let (Some(load), Some(value)) = (self.kind.callbacks.load, obj.get("custom_data")) else {
            return Ok(());
        };
        let document = CustomData::from_value(value)
            .and_then(|data| data.to_document())
            .map_err(|e| {
                tracing::error!(id = %self.kind.id, error = %e, "Failed to load custom item data");
                ItemError::CustomLoad { id: self.kind.id.clone() }
            })?;
        // SAFETY: the document outlives the call
        unsafe { load(self.handle(), self.data, document.as_ptr()) };
        Ok(())
    }

    fn fill_color(&self, _host: &dyn Frontend) -> Color {
        match self.kind.callbacks.fill_color {
            // SAFETY: every pointer outlives the call
            Some(fill_color) => Color(unsafe { fill_color(self.handle(), self.data) }),
            None => Color::BORDER_GRAY,
        }
    }
}
