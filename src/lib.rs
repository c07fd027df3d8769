//! Multiview
//!
//! A grid of live video cells (scenes, sources, preview/program, audio mixer
//! strips and plugin-defined items) composited into one window, with
//! mouse-driven placement and a persisted layout per scene collection.

pub mod bridge;
pub mod grid;
pub mod host;
pub mod items;
pub mod plugin;
pub mod registry;
pub mod settings;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{CustomItemProcedure, ItemCallbacks, CUSTOM_ITEM_API_VERSION};
pub use grid::{Cell, ItemConfig, Layout, LayoutError, MenuOutcome, PointerEvent};
pub use host::{Color, Frontend, GraphicsContext};
pub use items::{ConfigWidget, LayoutItem};
pub use plugin::MultiviewPlugin;
pub use registry::ItemRegistry;
pub use settings::{LayoutStore, SettingsError};
