//! Host lifecycle
//!
//! `MultiviewPlugin` ties the layout to the layout store and the host's
//! frontend events:
//! - `load` once the frontend has finished loading
//! - `scene_collection_changed` when the user switches collections
//! - `unload` on exit, which tears the layout down before custom kinds are
//!   removed so plugin `destroy` callbacks still run

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bridge::CustomItemProcedure;
use crate::grid::Layout;
use crate::host::Frontend;
use crate::registry::ItemRegistry;
use crate::settings::{LayoutStore, SettingsError};

pub struct MultiviewPlugin {
    registry: Arc<ItemRegistry>,
    host: Arc<dyn Frontend>,
    store: Arc<Mutex<LayoutStore>>,
    collection: Arc<Mutex<String>>,
    layout: Option<Arc<Layout>>,
}

impl MultiviewPlugin {
    pub fn new(host: Arc<dyn Frontend>, store: LayoutStore) -> Self {
        Self {
            registry: Arc::new(ItemRegistry::with_defaults()),
            host,
            store: Arc::new(Mutex::new(store)),
            collection: Arc::new(Mutex::new(String::new())),
            layout: None,
        }
    }

    /// Open the store in the config directory, starting empty if it can't
    /// be read
    pub fn with_default_store(host: Arc<dyn Frontend>) -> Result<Self, SettingsError> {
        let path = LayoutStore::default_path().ok_or(SettingsError::NoConfigDir)?;
        let store = LayoutStore::open(&path).unwrap_or_else(|e| {
            tracing::error!(error = %e, path = %path.display(), "Failed to read layout file, starting empty");
            LayoutStore::empty(&path)
        });
        Ok(Self::new(host, store))
    }

    pub fn registry(&self) -> &Arc<ItemRegistry> {
        &self.registry
    }

    /// Registration entry point handed to other plugins
    pub fn procedure(&self) -> CustomItemProcedure {
        CustomItemProcedure::new(self.registry.clone())
    }

    pub fn layout(&self) -> Option<&Arc<Layout>> {
        self.layout.as_ref()
    }

    /// Build the layout for the active scene collection
    pub fn load(&mut self) -> Arc<Layout> {
        let layout = Arc::new(Layout::new(self.registry.clone(), self.host.clone()));

        // Installed first so a freshly built default layout is written too
        let store = self.store.clone();
        let collection = self.collection.clone();
        layout.set_save_hook(move |doc| {
            let name = collection.lock().clone();
            let mut store = store.lock();
            store.store_layout(&name, doc.clone());
            if let Err(e) = store.flush() {
                tracing::error!(error = %e, "Failed to save layout");
            }
        });
        self.restore(&layout);

        tracing::info!(collection = %self.collection.lock(), "Multiview loaded");
        self.layout = Some(layout.clone());
        layout
    }

    fn restore(&self, layout: &Layout) {
        let name = self.host.scene_collection();
        let stored = self.store.lock().load_layout(&name).cloned();
        *self.collection.lock() = name;
        match stored {
            Some(doc) => {
                layout.load(&doc);
            }
            None => layout.create_default_layout(),
        }
    }

    /// Write the current layout under the active collection
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(layout) = &self.layout else {
            return Ok(());
        };
        let doc = layout.save();
        let name = self.collection.lock().clone();
        let mut store = self.store.lock();
        store.store_layout(&name, doc);
        store.flush()
    }

    /// Keep the old collection's layout and switch to the new one's
    pub fn scene_collection_changed(&mut self) -> Result<(), SettingsError> {
        let saved = self.save();
        if let Some(layout) = &self.layout {
            self.restore(layout);
        }
        saved
    }

    /// Save, drop every item, then forget plugin kinds
    pub fn unload(&mut self) -> Result<(), SettingsError> {
        let saved = self.save();
        if let Some(layout) = self.layout.take() {
            layout.delete_layout();
        }
        self.registry.remove_custom();
        tracing::info!("Multiview unloaded");
        saved
    }
}
