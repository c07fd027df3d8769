//! Grid state and structural operations
//!
//! Every structural change (placement, eviction, reshape, load) runs under
//! the state lock and ends with a re-tile pass, so the items always cover
//! the `cols` x `rows` grid exactly once.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use super::{fit_and_center, fit_window_to_content, Cell, ItemConfig};
use crate::host::Frontend;
use crate::items::{kind, ConfigWidget, ContextMenu, LayoutItem, PlaceholderItem, PreviewProgramItem, SceneItem};
use crate::registry::ItemRegistry;

pub const MAX_GRID_SIZE: i32 = 16;
pub const DEFAULT_GRID_SIZE: i32 = 4;
/// Scenes the default layout shows below preview and program
pub const DEFAULT_SCENE_COUNT: usize = 8;

pub const ACTION_SET_WIDGET: &str = "layout.set_widget";
pub const ACTION_CONFIGURE: &str = "layout.configure";
pub const ACTION_LOCK: &str = "layout.lock";
pub const ACTION_CLEAR_SELECTION: &str = "layout.clear_selection";
pub const ACTION_FILL_SCENES: &str = "layout.fill_scenes";

/// Receives the saved document after every structural change
pub type SaveHook = Box<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout is locked")]
    Locked,
    #[error("unknown item kind '{0}'")]
    UnknownItemKind(String),
    #[error("cell {cell:?} lies outside the {cols}x{rows} grid")]
    OutOfBounds { cell: Cell, cols: i32, rows: i32 },
    #[error("grid size {cols}x{rows} is out of range")]
    InvalidGridSize { cols: i32, rows: i32 },
}

/// What the UI should do after a menu action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Handled,
    /// Nobody claimed the action
    Ignored,
    ShowNewItemDialog,
    ShowLayoutConfigDialog,
}

/// Result of placing one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub cell: Cell,
    /// Items removed because they overlapped
    pub evicted: usize,
    /// Placeholders added by the re-tile pass
    pub backfilled: usize,
}

/// Read-only view of one item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    pub cell: Cell,
    pub kind: String,
    pub source: Option<String>,
    pub stretch: bool,
}

pub(crate) fn check_grid_size(cols: i32, rows: i32) -> Result<(), LayoutError> {
    let range = 1..=MAX_GRID_SIZE;
    if range.contains(&cols) && range.contains(&rows) {
        Ok(())
    } else {
        Err(LayoutError::InvalidGridSize { cols, rows })
    }
}

pub(crate) struct LayoutState {
    pub(crate) cols: i32,
    pub(crate) rows: i32,
    pub(crate) cfg: ItemConfig,
    pub(crate) items: Vec<Box<dyn LayoutItem>>,
    pub(crate) hovered_cell: Cell,
    pub(crate) selection_start: Cell,
    pub(crate) selection_end: Cell,
    pub(crate) dragging: bool,
    pub(crate) locked: bool,
    pub(crate) canvas: (i32, i32),
    pub(crate) viewport: (i32, i32),
    /// Last menu handed out and the cell of the item it was built for
    pub(crate) open_menu: Option<(Cell, ContextMenu)>,
}

impl LayoutState {
    fn new(cols: i32, rows: i32) -> Self {
        let mut state = Self {
            cols,
            rows,
            cfg: ItemConfig::default(),
            items: Vec::new(),
            hovered_cell: Cell::default(),
            selection_start: Cell::zero(),
            selection_end: Cell::zero(),
            dragging: false,
            locked: false,
            canvas: (0, 0),
            viewport: (0, 0),
            open_menu: None,
        };
        state.retile();
        state
    }

    pub(crate) fn resize(&mut self, canvas_w: i32, canvas_h: i32, viewport_w: i32, viewport_h: i32) {
        self.canvas = (canvas_w, canvas_h);
        self.viewport = (viewport_w, viewport_h);
        self.recompute_config();
    }

    /// Cells keep the canvas aspect ratio, so the grid height follows the
    /// row count rather than the canvas height
    pub(crate) fn recompute_config(&mut self) {
        let (canvas_w, canvas_h) = self.canvas;
        if canvas_w > 0 && canvas_h > 0 {
            let cell_width = canvas_w as f32 / self.cols as f32;
            let cell_height = cell_width * canvas_h as f32 / canvas_w as f32;
            let grid_height = (cell_height * self.rows as f32) as i32;
            let fit = fit_and_center(canvas_w, grid_height, self.viewport.0, self.viewport.1);
            self.cfg = ItemConfig {
                x: fit.x,
                y: fit.y,
                cx: canvas_w,
                cy: grid_height,
                canvas_width: canvas_w,
                canvas_height: canvas_h,
                scale: fit.scale,
                cell_width,
                cell_height,
                ..self.cfg
            };
        }
        self.update_items();
    }

    fn update_items(&mut self) {
        let cfg = self.cfg;
        for item in &mut self.items {
            item.update(&cfg);
        }
    }

    pub(crate) fn selection(&self) -> Cell {
        Cell::span(&self.selection_start, &self.selection_end)
    }

    /// The drag selection while dragging, otherwise the hovered unit cell
    fn target_cell(&self) -> Cell {
        if self.dragging {
            self.selection()
        } else {
            self.hovered_cell
        }
    }

    pub(crate) fn clear_selection_state(&mut self) {
        self.selection_start.clear();
        self.selection_end.clear();
        self.dragging = false;
    }

    /// Remove every item overlapping `target`
    fn evict(&mut self, target: &Cell) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !target.overlaps(&item.cell()));
        before - self.items.len()
    }

    /// Drop items that no longer fit the grid
    fn truncate(&mut self) -> usize {
        let (cols, rows) = (self.cols, self.rows);
        let before = self.items.len();
        self.items.retain(|item| item.cell().fits_in(cols, rows));
        before - self.items.len()
    }

    /// Fill every uncovered unit cell with a placeholder
    pub(crate) fn retile(&mut self) -> usize {
        self.open_menu = None;
        let mut added = 0;
        for col in 0..self.cols {
            for row in 0..self.rows {
                let unit = Cell::unit(col, row);
                if self.items.iter().any(|item| item.cell().overlaps(&unit)) {
                    continue;
                }
                self.insert(Box::new(PlaceholderItem::new(unit)));
                added += 1;
            }
        }
        if added > 0 {
            tracing::debug!(added, "Backfilled grid with placeholders");
        }
        added
    }

    pub(crate) fn insert(&mut self, mut item: Box<dyn LayoutItem>) {
        item.update(&self.cfg);
        self.items.push(item);
    }

    fn place(&mut self, item: Box<dyn LayoutItem>) -> Placement {
        let cell = item.cell();
        let evicted = self.evict(&cell);
        self.insert(item);
        let backfilled = self.retile();
        Placement { cell, evicted, backfilled }
    }

    /// Truncate to the current bounds, recompute geometry and re-tile
    pub(crate) fn refresh(&mut self) {
        let dropped = self.truncate();
        if dropped > 0 {
            tracing::debug!(dropped, cols = self.cols, rows = self.rows, "Dropped items outside the grid");
        }
        self.clear_selection_state();
        self.recompute_config();
        self.retile();
    }

    pub(crate) fn build_default(&mut self, host: &dyn Frontend, scene_count: usize) {
        self.items.clear();
        self.cols = DEFAULT_GRID_SIZE;
        self.rows = DEFAULT_GRID_SIZE;
        self.clear_selection_state();
        self.recompute_config();

        self.insert(Box::new(PreviewProgramItem::preview(Cell::new(0, 0, 2, 2))));
        self.insert(Box::new(PreviewProgramItem::program(Cell::new(2, 0, 2, 2))));

        let cols = self.cols;
        let slots = (2..self.rows).flat_map(move |row| (0..cols).map(move |col| Cell::unit(col, row)));
        let scenes = host.scenes().into_iter().filter(|s| !s.hidden_in_multiview).take(scene_count);
        for (cell, scene) in slots.zip(scenes) {
            self.insert(Box::new(SceneItem::with_scene(cell, &scene.name)));
        }
        self.retile();
        tracing::info!(items = self.items.len(), "Created default layout");
    }

    pub(crate) fn summaries(&self) -> Vec<ItemSummary> {
        self.items
            .iter()
            .map(|item| ItemSummary {
                cell: item.cell(),
                kind: item.kind_id().to_string(),
                source: item.source_name().map(str::to_string),
                stretch: item.base().stretch,
            })
            .collect()
    }
}

/// Grid of layout items.
///
/// Methods take `&self`: one `Arc<Layout>` is shared between the render
/// callback and UI input, and the item collection sits behind one mutex.
pub struct Layout {
    pub(crate) state: Mutex<LayoutState>,
    registry: Arc<ItemRegistry>,
    host: Arc<dyn Frontend>,
    save_hook: Mutex<Option<SaveHook>>,
    scene_count: usize,
}

impl Layout {
    /// 4x4 grid of placeholders
    pub fn new(registry: Arc<ItemRegistry>, host: Arc<dyn Frontend>) -> Self {
        Self {
            state: Mutex::new(LayoutState::new(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE)),
            registry,
            host,
            save_hook: Mutex::new(None),
            scene_count: DEFAULT_SCENE_COUNT,
        }
    }

    pub fn with_size(
        registry: Arc<ItemRegistry>,
        host: Arc<dyn Frontend>,
        cols: i32,
        rows: i32,
    ) -> Result<Self, LayoutError> {
        check_grid_size(cols, rows)?;
        let layout = Self::new(registry, host);
        *layout.state.lock() = LayoutState::new(cols, rows);
        Ok(layout)
    }

    pub fn with_default_scene_count(mut self, count: usize) -> Self {
        self.scene_count = count;
        self
    }

    pub fn set_save_hook(&self, hook: impl Fn(&Value) + Send + Sync + 'static) {
        *self.save_hook.lock() = Some(Box::new(hook));
    }

    /// Hand the current document to the save hook. Must not be called with
    /// the state lock held.
    pub(crate) fn persist(&self) {
        let hook = self.save_hook.lock();
        if let Some(hook) = hook.as_ref() {
            hook(&self.save());
        }
    }

    pub(crate) fn scene_count(&self) -> usize {
        self.scene_count
    }

    pub(crate) fn host(&self) -> &dyn Frontend {
        self.host.as_ref()
    }

    pub fn registry(&self) -> &Arc<ItemRegistry> {
        &self.registry
    }

    pub fn grid_size(&self) -> (i32, i32) {
        let s = self.state.lock();
        (s.cols, s.rows)
    }

    pub fn config(&self) -> ItemConfig {
        self.state.lock().cfg
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    pub fn set_locked(&self, locked: bool) {
        self.state.lock().locked = locked;
        self.persist();
    }

    pub fn hovered_cell(&self) -> Cell {
        self.state.lock().hovered_cell
    }

    /// Normalized drag selection, if a drag is active
    pub fn selection(&self) -> Option<Cell> {
        let s = self.state.lock();
        s.dragging.then(|| s.selection())
    }

    /// Select the rectangle spanned by two corner cells
    pub fn set_selection(&self, start: Cell, end: Cell) {
        let mut s = self.state.lock();
        s.selection_start = start;
        s.selection_end = end;
        s.dragging = true;
    }

    pub fn items(&self) -> Vec<ItemSummary> {
        self.state.lock().summaries()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Recompute the configuration for a new canvas or viewport size
    pub fn resize(&self, canvas_w: i32, canvas_h: i32, viewport_w: i32, viewport_h: i32) {
        self.state.lock().resize(canvas_w, canvas_h, viewport_w, viewport_h);
    }

    /// Window size that shows the grid without letterbox bars
    pub fn content_window_size(&self, window_w: i32, window_h: i32) -> (i32, i32) {
        let cfg = self.config();
        fit_window_to_content(cfg.cx, cfg.cy, window_w, window_h)
    }

    /// Pre-populated options for the "add item" dialog
    pub fn new_item_widget(&self, kind_id: &str) -> Result<Option<ConfigWidget>, LayoutError> {
        let entry = self
            .registry
            .entry_by_id(kind_id)
            .ok_or_else(|| LayoutError::UnknownItemKind(kind_id.to_string()))?;
        if entry.is_custom() {
            return Ok(None);
        }
        Ok(entry.create(Cell::zero()).config_widget(self.host()))
    }

    /// Place a new item on the drag selection, or on the hovered cell
    pub fn add_widget(&self, kind_id: &str, widget: Option<&ConfigWidget>) -> Result<Placement, LayoutError> {
        let placement = {
            let mut s = self.state.lock();
            if s.locked {
                return Err(LayoutError::Locked);
            }
            let target = s.target_cell();
            let placement = self.place_new(&mut s, kind_id, target, widget)?;
            s.clear_selection_state();
            placement
        };
        self.persist();
        Ok(placement)
    }

    pub fn add_widget_at(
        &self,
        kind_id: &str,
        cell: Cell,
        widget: Option<&ConfigWidget>,
    ) -> Result<Placement, LayoutError> {
        let placement = {
            let mut s = self.state.lock();
            if s.locked {
                return Err(LayoutError::Locked);
            }
            self.place_new(&mut s, kind_id, cell, widget)?
        };
        self.persist();
        Ok(placement)
    }

    fn place_new(
        &self,
        s: &mut LayoutState,
        kind_id: &str,
        cell: Cell,
        widget: Option<&ConfigWidget>,
    ) -> Result<Placement, LayoutError> {
        if !cell.fits_in(s.cols, s.rows) {
            return Err(LayoutError::OutOfBounds { cell, cols: s.cols, rows: s.rows });
        }
        let mut item = self
            .registry
            .create(kind_id, cell)
            .ok_or_else(|| LayoutError::UnknownItemKind(kind_id.to_string()))?;
        if let Some(widget) = widget {
            let mut widget = widget.clone();
            widget.sanitize();
            item.load_config_from_widget(&widget, self.host());
        }
        let placement = s.place(item);
        tracing::debug!(kind = kind_id, ?cell, evicted = placement.evicted, "Placed item");
        Ok(placement)
    }

    pub fn set_grid_size(&self, cols: i32, rows: i32) -> Result<(), LayoutError> {
        check_grid_size(cols, rows)?;
        {
            let mut s = self.state.lock();
            if s.locked {
                return Err(LayoutError::Locked);
            }
            s.cols = cols;
            s.rows = rows;
            s.refresh();
        }
        self.persist();
        Ok(())
    }

    /// Re-apply the current grid size: drop out-of-bounds items and re-tile
    pub fn refresh_grid(&self) {
        self.state.lock().refresh();
    }

    /// Replace everything under the selection with placeholders
    pub fn clear_selection(&self) -> Result<usize, LayoutError> {
        let evicted = {
            let mut s = self.state.lock();
            if s.locked {
                return Err(LayoutError::Locked);
            }
            let target = s.target_cell();
            let evicted = s.evict(&target);
            s.retile();
            s.clear_selection_state();
            evicted
        };
        self.persist();
        Ok(evicted)
    }

    /// Fill the selection with one scene cell per host scene that isn't
    /// shown yet. Returns how many scenes were placed.
    pub fn fill_selection_with_scenes(&self) -> Result<usize, LayoutError> {
        let placed = {
            let mut s = self.state.lock();
            if s.locked {
                return Err(LayoutError::Locked);
            }
            let target = s.target_cell();
            s.evict(&target);

            let shown: HashSet<String> = s
                .items
                .iter()
                .filter(|item| item.kind_id() == kind::SCENE)
                .filter_map(|item| item.source_name().map(str::to_string))
                .collect();
            let scenes = self
                .host
                .scenes()
                .into_iter()
                .filter(|scene| !scene.hidden_in_multiview && !shown.contains(&scene.name));

            let mut placed = 0;
            for (cell, scene) in target.unit_cells().zip(scenes) {
                s.insert(Box::new(SceneItem::with_scene(cell, &scene.name)));
                placed += 1;
            }
            s.retile();
            s.clear_selection_state();
            placed
        };
        self.persist();
        Ok(placed)
    }

    /// Preview and program on top, scenes below
    pub fn create_default_layout(&self) {
        self.state.lock().build_default(self.host(), self.scene_count);
        self.persist();
    }

    /// Drop every item, e.g. before the registry goes away
    pub fn delete_layout(&self) {
        let mut s = self.state.lock();
        s.items.clear();
        s.open_menu = None;
        s.clear_selection_state();
    }

    /// Menu for the item under the pointer, `None` if nothing is hovered
    pub fn context_menu(&self) -> Option<ContextMenu> {
        let mut s = self.state.lock();
        // Keep drawing the selection while the menu is open
        if !s.selection_end.is_empty() {
            s.dragging = true;
        }
        let locked = s.locked;
        let item = s.items.iter_mut().find(|item| item.hovered())?;

        let mut menu = ContextMenu::new("Options");
        menu.add_toggle(ACTION_LOCK, "Lock layout", locked);
        if locked {
            s.open_menu = None;
            return Some(menu);
        }
        menu.add_action(ACTION_SET_WIDGET, "Set widget");
        menu.add_action(ACTION_CONFIGURE, "Layout settings");
        menu.add_separator();
        menu.add_action(ACTION_CLEAR_SELECTION, "Clear selection");
        menu.add_action(ACTION_FILL_SCENES, "Fill selection with scenes");
        menu.add_separator();
        item.context_menu(&mut menu, self.host.as_ref());
        let cell = item.cell();
        s.open_menu = Some((cell, menu.clone()));
        Some(menu)
    }

    pub fn trigger_menu_action(&self, action: &str) -> Result<MenuOutcome, LayoutError> {
        match action {
            ACTION_LOCK => {
                let locked = !self.is_locked();
                self.set_locked(locked);
                Ok(MenuOutcome::Handled)
            }
            _ if self.is_locked() => Err(LayoutError::Locked),
            ACTION_SET_WIDGET => Ok(MenuOutcome::ShowNewItemDialog),
            ACTION_CONFIGURE => Ok(MenuOutcome::ShowLayoutConfigDialog),
            ACTION_CLEAR_SELECTION => self.clear_selection().map(|_| MenuOutcome::Handled),
            ACTION_FILL_SCENES => self.fill_selection_with_scenes().map(|_| MenuOutcome::Handled),
            _ => Ok(self.trigger_item_action(action)),
        }
    }

    fn trigger_item_action(&self, action: &str) -> MenuOutcome {
        let handler = {
            let mut s = self.state.lock();
            let host = self.host.as_ref();
            let open_menu = s.open_menu.take();
            let Some(item) = s.items.iter_mut().find(|item| item.hovered()) else {
                return MenuOutcome::Ignored;
            };
            // Dispatch from the menu the user saw; only build one if none is open
            let menu = match open_menu {
                Some((cell, menu)) if cell == item.cell() => menu,
                _ => {
                    let mut menu = ContextMenu::new("Options");
                    item.context_menu(&mut menu, host);
                    menu
                }
            };
            match menu.find(action).and_then(|a| a.handler.clone()) {
                Some(handler) => Some(handler),
                None if item.trigger_action(action, host) => None,
                None => return MenuOutcome::Ignored,
            }
        };
        // Plugin handlers run unlocked so they may call back into the layout
        if let Some(handler) = handler {
            handler();
        }
        self.persist();
        MenuOutcome::Handled
    }
}
