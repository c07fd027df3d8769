//! Item registry
//!
//! Catalog of every item kind the layout can construct, used by the "add
//! item" flow and to rebuild items from saved JSON. Built-in kinds are
//! registered at startup; plugins add theirs through `bridge`.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::bridge::{BridgeError, CustomKind, ItemCallbacks};
use crate::grid::Cell;
use crate::items::{
    kind, AudioMixerItem, CustomItem, ItemError, LayoutItem, PlaceholderItem, PreviewProgramItem, SceneItem,
    SourceItem,
};

/// Builds a fresh item of one kind at the given cell
pub type ItemFactory = Arc<dyn Fn(Cell) -> Box<dyn LayoutItem> + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("item has no 'id' field")]
    MissingId,
    #[error("unknown item kind '{id}'")]
    UnknownKind { id: String },
    #[error(transparent)]
    Item(#[from] ItemError),
}

#[derive(Clone)]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    factory: ItemFactory,
    custom: bool,
}

impl RegistryEntry {
    pub fn create(&self, cell: Cell) -> Box<dyn LayoutItem> {
        (self.factory)(cell)
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("custom", &self.custom)
            .finish()
    }
}

/// Registered item kinds.
///
/// The placeholder always sits at index 0; later built-ins are inserted
/// right after it so the most recently registered built-in is listed first,
/// and custom kinds are appended.
#[derive(Default)]
pub struct ItemRegistry {
    entries: Mutex<Vec<RegistryEntry>>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(kind::PLACEHOLDER, "Empty", |cell| Box::new(PlaceholderItem::new(cell)));
        registry.register(kind::PREVIEW_PROGRAM, "Preview/Program", |cell| {
            Box::new(PreviewProgramItem::new(cell))
        });
        registry.register(kind::SOURCE, "Source", |cell| Box::new(SourceItem::new(cell)));
        registry.register(kind::AUDIO_MIXER, "Audio mixer", |cell| Box::new(AudioMixerItem::new(cell)));
        registry.register(kind::SCENE, "Scene", |cell| Box::new(SceneItem::new(cell)));
        registry
    }

    pub fn register<F>(&self, id: &str, name: &str, factory: F)
    where
        F: Fn(Cell) -> Box<dyn LayoutItem> + Send + Sync + 'static,
    {
        let entry = RegistryEntry { id: id.to_string(), name: name.to_string(), factory: Arc::new(factory), custom: false };
        let mut entries = self.entries.lock();
        if entries.is_empty() {
            entries.push(entry);
        } else {
            entries.insert(1, entry);
        }
    }

    /// Validate a plugin's table and add its kind
    pub fn register_custom(&self, callbacks: &ItemCallbacks) -> Result<(), BridgeError> {
        let custom = Arc::new(CustomKind::validate(callbacks)?);
        let mut entries = self.entries.lock();
        if entries.iter().any(|e| e.id == custom.id) {
            return Err(BridgeError::AlreadyRegistered { id: custom.id.clone() });
        }

        tracing::info!(id = %custom.id, name = %custom.name, "Registered custom item");
        let factory_kind = custom.clone();
        entries.push(RegistryEntry {
            id: custom.id.clone(),
            name: custom.name.clone(),
            factory: Arc::new(move |cell: Cell| -> Box<dyn LayoutItem> {
                Box::new(CustomItem::new(factory_kind.clone(), cell))
            }),
            custom: true,
        });
        Ok(())
    }

    /// Drop every plugin kind, e.g. before the plugin code is unloaded
    pub fn remove_custom(&self) {
        self.entries.lock().retain(|e| !e.custom);
    }

    pub fn entry_by_id(&self, id: &str) -> Option<RegistryEntry> {
        self.entries.lock().iter().find(|e| e.id == id).cloned()
    }

    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Build a fresh item of a registered kind
    pub fn create(&self, id: &str, cell: Cell) -> Option<Box<dyn LayoutItem>> {
        // Factories run unlocked so plugin init may call back into the registry
        self.entry_by_id(id).map(|entry| entry.create(cell))
    }

    /// Rebuild an item from its saved object. Custom items are looked up by
    /// their `custom_id`.
    pub fn make_item(&self, obj: &Map<String, Value>) -> Result<Box<dyn LayoutItem>, RegistryError> {
        let mut id = obj.get("id").and_then(Value::as_str).ok_or(RegistryError::MissingId)?;
        if id == kind::CUSTOM {
            id = obj.get("custom_id").and_then(Value::as_str).unwrap_or_default();
        }
        let mut item = self
            .create(id, Cell::zero())
            .ok_or_else(|| RegistryError::UnknownKind { id: id.to_string() })?;
        item.read_from_json(obj)?;
        Ok(item)
    }
}
