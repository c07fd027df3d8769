//! Grid layout engine
//!
//! - `cell` - integer cell rectangles
//! - `scale` - letterbox fitting of the grid into the window
//! - `config` - per-resize geometry handed to every item
//! - `layout` - the item collection and its structural operations
//! - `input`, `render`, `persist` - the rest of `Layout`'s surface

pub mod cell;
pub mod config;
pub mod input;
pub mod layout;
pub mod persist;
pub mod render;
pub mod scale;

pub use cell::Cell;
pub use config::{ItemConfig, DEFAULT_BORDER};
pub use input::PointerEvent;
pub use layout::{
    ItemSummary, Layout, LayoutError, MenuOutcome, Placement, SaveHook, DEFAULT_GRID_SIZE, DEFAULT_SCENE_COUNT,
    MAX_GRID_SIZE,
};
pub use persist::{LayoutDocument, LoadReport};
pub use scale::{fit_and_center, fit_window_to_content, Letterbox};
