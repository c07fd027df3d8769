//! Layout documents
//!
//! ```json
//! { "cols": 4, "rows": 4, "locked": false, "items": [ { "id": "SceneItem", ... } ] }
//! ```
//!
//! Loading never fails as a whole: entries that can't be rebuilt are logged
//! and dropped, and the re-tile pass covers whatever they left uncovered.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::layout::{check_grid_size, Layout, DEFAULT_GRID_SIZE};
use super::Cell;
use crate::items::LayoutItem;

fn default_grid_size() -> i32 {
    DEFAULT_GRID_SIZE
}

/// Stored form of a layout
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutDocument {
    #[serde(default = "default_grid_size")]
    pub cols: i32,
    #[serde(default = "default_grid_size")]
    pub rows: i32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}

/// What a load kept and what it threw away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub dropped: usize,
    /// The document yielded nothing and the default layout was built instead
    pub used_default: bool,
}

impl Layout {
    pub fn save(&self) -> Value {
        let s = self.state.lock();
        let items: Vec<Value> = s
            .items
            .iter()
            .map(|item| {
                let mut obj = Map::new();
                item.write_to_json(&mut obj);
                Value::Object(obj)
            })
            .collect();
        json!({
            "cols": s.cols,
            "rows": s.rows,
            "locked": s.locked,
            "items": items,
        })
    }

    /// Replace the current items with the ones stored in `doc`
    pub fn load(&self, doc: &Value) -> LoadReport {
        let document = match LayoutDocument::deserialize(doc) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(error = %e, "Layout document is malformed, using the default layout");
                self.state.lock().build_default(self.host(), self.scene_count());
                return LoadReport { used_default: true, ..Default::default() };
            }
        };

        let (cols, rows) = match check_grid_size(document.cols, document.rows) {
            Ok(()) => (document.cols, document.rows),
            Err(e) => {
                tracing::warn!(error = %e, "Stored grid size rejected, using the default");
                (DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE)
            }
        };

        let mut report = LoadReport::default();
        {
            let mut s = self.state.lock();
            s.items.clear();
            s.cols = cols;
            s.rows = rows;
            s.locked = document.locked;
            s.clear_selection_state();
            s.recompute_config();

            for raw in &document.items {
                let Some(obj) = raw.as_object() else {
                    tracing::error!(item = %raw, "Dropped layout item that is not an object");
                    report.dropped += 1;
                    continue;
                };
                let item = match self.registry().make_item(obj) {
                    Ok(item) => item,
                    Err(e) => {
                        tracing::error!(error = %e, item = %raw, "Dropped layout item");
                        report.dropped += 1;
                        continue;
                    }
                };
                let cell = item.cell();
                if !cell.fits_in(cols, rows) || collides(&s.items, &cell) {
                    tracing::warn!(?cell, kind = item.kind_id(), "Dropped layout item outside the grid or overlapping another");
                    report.dropped += 1;
                    continue;
                }
                s.insert(item);
                report.loaded += 1;
            }

            if report.loaded > 0 {
                s.retile();
            } else {
                s.build_default(self.host(), self.scene_count());
                report.used_default = true;
            }
        }

        tracing::info!(loaded = report.loaded, dropped = report.dropped, cols, rows, "Loaded layout");
        report
    }
}

fn collides(items: &[Box<dyn LayoutItem>], cell: &Cell) -> bool {
    items.iter().any(|item| item.cell().overlaps(cell))
}
