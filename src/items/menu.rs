//! Context menu model
//!
//! Items and the layout describe their menu entries here; the UI layer turns
//! the model into real widgets and reports the chosen action id back through
//! `Layout::trigger_menu_action`.

use std::fmt;
use std::sync::Arc;

/// Callback attached to an action, used by externally registered items
pub type ActionHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct MenuAction {
    pub id: String,
    pub label: String,
    pub checkable: bool,
    pub checked: bool,
    pub enabled: bool,
    pub handler: Option<ActionHandler>,
}

impl fmt::Debug for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("checkable", &self.checkable)
            .field("checked", &self.checked)
            .field("enabled", &self.enabled)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum MenuEntry {
    Action(MenuAction),
    Separator,
    Submenu { label: String, menu: ContextMenu },
}

#[derive(Debug, Clone, Default)]
pub struct ContextMenu {
    pub title: String,
    pub entries: Vec<MenuEntry>,
}

impl ContextMenu {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), entries: Vec::new() }
    }

    pub fn add_action(&mut self, id: impl Into<String>, label: impl Into<String>) {
        self.push_action(MenuAction {
            id: id.into(),
            label: label.into(),
            checkable: false,
            checked: false,
            enabled: true,
            handler: None,
        })
    }

    pub fn add_toggle(&mut self, id: impl Into<String>, label: impl Into<String>, checked: bool) {
        self.push_action(MenuAction {
            id: id.into(),
            label: label.into(),
            checkable: true,
            checked,
            enabled: true,
            handler: None,
        })
    }

    /// Action that runs `handler` when chosen
    pub fn add_handler(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn() + Send + Sync + 'static,
    ) {
        self.push_action(MenuAction {
            id: id.into(),
            label: label.into(),
            checkable: false,
            checked: false,
            enabled: true,
            handler: Some(Arc::new(handler)),
        })
    }

    fn push_action(&mut self, action: MenuAction) {
        self.entries.push(MenuEntry::Action(action));
    }

    pub fn add_separator(&mut self) {
        // No leading or doubled separators
        if matches!(self.entries.last(), None | Some(MenuEntry::Separator)) {
            return;
        }
        self.entries.push(MenuEntry::Separator);
    }

    pub fn add_submenu(&mut self, label: impl Into<String>, menu: ContextMenu) {
        self.entries.push(MenuEntry::Submenu { label: label.into(), menu });
    }

    /// Find an action by id, searching submenus depth-first
    pub fn find(&self, id: &str) -> Option<&MenuAction> {
        self.entries.iter().find_map(|entry| match entry {
            MenuEntry::Action(a) if a.id == id => Some(a),
            MenuEntry::Submenu { menu, .. } => menu.find(id),
            _ => None,
        })
    }

    /// All action ids, submenus flattened
    pub fn action_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for entry in &self.entries {
            match entry {
                MenuEntry::Action(a) => ids.push(a.id.clone()),
                MenuEntry::Submenu { menu, .. } => ids.extend(menu.action_ids()),
                MenuEntry::Separator => {}
            }
        }
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
