//! Stored layouts
//!
//! One JSON file under the user's config directory maps each scene
//! collection to an array of layout documents. The first entry is the
//! active layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("layout file {0} does not hold a JSON object")]
    NotAnObject(PathBuf),
    #[error("could not find config directory")]
    NoConfigDir,
}

/// The layout file, held in memory and written back by `flush`
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: PathBuf,
    doc: Map<String, Value>,
}

impl LayoutStore {
    /// `<config dir>/multiview/layout.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("multiview");
            p.push("layout.json");
            p
        })
    }

    pub fn open_default() -> Result<Self, SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoConfigDir)?;
        Self::open(path)
    }

    /// Read the file at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::empty(path));
        }
        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str(&contents)? {
            Value::Object(doc) => Ok(Self { path, doc }),
            _ => Err(SettingsError::NotAnObject(path)),
        }
    }

    /// Store that will create `path` on the first flush
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), doc: Map::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn collections(&self) -> Vec<String> {
        self.doc.keys().cloned().collect()
    }

    /// Active layout for a scene collection
    pub fn load_layout(&self, collection: &str) -> Option<&Value> {
        self.doc.get(collection)?.as_array()?.first()
    }

    pub fn store_layout(&mut self, collection: &str, layout: Value) {
        self.doc.insert(collection.to_string(), Value::Array(vec![layout]));
    }

    /// Write the file, creating the config folder if needed
    pub fn flush(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.doc)?;
        fs::write(&self.path, text)?;
        tracing::debug!(path = %self.path.display(), "Wrote layout file");
        Ok(())
    }
}
