//! Empty filler cell

use super::{kind, ContextMenu, ItemBase, LayoutItem};
use crate::grid::Cell;
use crate::host::Frontend;

/// Renders only the black background; inserted by the re-tile pass
#[derive(Debug, Clone, Default)]
pub struct PlaceholderItem {
    base: ItemBase,
}

impl PlaceholderItem {
    pub fn new(cell: Cell) -> Self {
        Self { base: ItemBase::new(cell) }
    }
}

impl LayoutItem for PlaceholderItem {
    fn base(&self) -> &ItemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    fn kind_id(&self) -> &str {
        kind::PLACEHOLDER
    }

    fn context_menu(&mut self, _menu: &mut ContextMenu, _host: &dyn Frontend) {}

    fn trigger_action(&mut self, _action: &str, _host: &dyn Frontend) -> bool {
        false
    }
}
