//! Test doubles for the host boundary

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::grid::{Cell, Layout};
use crate::host::{
    AudioLevels, AudioSourceInfo, Color, Frontend, FrontendSettings, GraphicsContext, Ortho,
    SceneInfo, Viewport,
};

#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    SetProgram(String),
    SetPreview(String),
    SetMuted(String, bool),
    SetDeflection(String, f32),
}

#[derive(Debug, Default)]
pub struct MockState {
    pub scenes: Vec<SceneInfo>,
    pub video_sources: Vec<String>,
    pub audio: Vec<AudioSourceInfo>,
    pub levels: HashMap<String, AudioLevels>,
    pub program: Option<String>,
    pub preview: Option<String>,
    pub studio_mode: bool,
    pub settings: FrontendSettings,
    pub collection: String,
    pub commands: Vec<HostCommand>,
}

/// In-memory frontend that records every command it receives
#[derive(Debug, Default)]
pub struct MockFrontend {
    pub state: Mutex<MockState>,
}

impl MockFrontend {
    pub fn with_scenes(names: &[&str]) -> Self {
        let host = Self::default();
        host.state.lock().scenes = names.iter().map(|n| SceneInfo::new(*n)).collect();
        host
    }

    pub fn add_video_source(&self, name: &str) {
        self.state.lock().video_sources.push(name.to_string());
    }

    pub fn add_audio_source(&self, name: &str, global: bool) {
        self.state.lock().audio.push(AudioSourceInfo {
            name: name.to_string(),
            muted: false,
            deflection: 1.0,
            global,
            channels: 2,
        });
    }

    pub fn commands(&self) -> Vec<HostCommand> {
        self.state.lock().commands.clone()
    }
}

impl Frontend for MockFrontend {
    fn scenes(&self) -> Vec<SceneInfo> {
        self.state.lock().scenes.clone()
    }

    fn video_sources(&self) -> Vec<String> {
        self.state.lock().video_sources.clone()
    }

    fn audio_sources(&self) -> Vec<AudioSourceInfo> {
        self.state.lock().audio.clone()
    }

    fn audio_levels(&self, source: &str) -> Option<AudioLevels> {
        self.state.lock().levels.get(source).cloned()
    }

    fn source_size(&self, source: &str) -> Option<(u32, u32)> {
        let state = self.state.lock();
        let known = state.scenes.iter().any(|s| s.name == source)
            || state.video_sources.iter().any(|s| s == source);
        known.then_some((1920, 1080))
    }

    fn program_scene(&self) -> Option<String> {
        self.state.lock().program.clone()
    }

    fn preview_scene(&self) -> Option<String> {
        self.state.lock().preview.clone()
    }

    fn studio_mode(&self) -> bool {
        self.state.lock().studio_mode
    }

    fn settings(&self) -> FrontendSettings {
        self.state.lock().settings
    }

    fn scene_collection(&self) -> String {
        self.state.lock().collection.clone()
    }

    fn set_program_scene(&self, scene: &str) {
        let mut state = self.state.lock();
        state.program = Some(scene.to_string());
        state.commands.push(HostCommand::SetProgram(scene.to_string()));
    }

    fn set_preview_scene(&self, scene: &str) {
        let mut state = self.state.lock();
        state.preview = Some(scene.to_string());
        state.commands.push(HostCommand::SetPreview(scene.to_string()));
    }

    fn set_muted(&self, source: &str, muted: bool) {
        let mut state = self.state.lock();
        if let Some(a) = state.audio.iter_mut().find(|a| a.name == source) {
            a.muted = muted;
        }
        state.commands.push(HostCommand::SetMuted(source.to_string(), muted));
    }

    fn set_deflection(&self, source: &str, deflection: f32) {
        let mut state = self.state.lock();
        if let Some(a) = state.audio.iter_mut().find(|a| a.name == source) {
            a.deflection = deflection;
        }
        state.commands.push(HostCommand::SetDeflection(source.to_string(), deflection));
    }
}

/// Every unit cell of the grid is covered by exactly one item
pub fn assert_tiled(layout: &Layout) {
    let (cols, rows) = layout.grid_size();
    let cells: Vec<Cell> = layout.items().into_iter().map(|i| i.cell).collect();
    for cell in &cells {
        assert!(cell.fits_in(cols, rows), "{cell:?} lies outside {cols}x{rows}");
    }
    for col in 0..cols {
        for row in 0..rows {
            let covering = cells.iter().filter(|c| c.contains(col, row)).count();
            assert_eq!(covering, 1, "unit cell ({col}, {row}) covered {covering} times");
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    PushRegion(Viewport, Ortho),
    PopRegion,
    Box { x: f32, y: f32, cx: f32, cy: f32, color: Color },
    Source { name: String, cx: f32, cy: f32 },
    Program { cx: f32, cy: f32 },
    Label(String),
}

/// Graphics context that only records what was asked of it
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<DrawCall>,
    pub region_depth: usize,
    pub max_region_depth: usize,
    pub matrix_depth: usize,
}

impl RecordingSurface {
    pub fn boxes_with(&self, color: Color) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Box { color: drawn, .. } if *drawn == color))
            .count()
    }

    pub fn regions(&self) -> Vec<Viewport> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::PushRegion(v, _) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn sources(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Source { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Label(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsContext for RecordingSurface {
    fn push_region(&mut self, viewport: Viewport, ortho: Ortho) {
        self.region_depth += 1;
        self.max_region_depth = self.max_region_depth.max(self.region_depth);
        self.calls.push(DrawCall::PushRegion(viewport, ortho));
    }

    fn pop_region(&mut self) {
        self.region_depth = self.region_depth.saturating_sub(1);
        self.calls.push(DrawCall::PopRegion);
    }

    fn push_matrix(&mut self) {
        self.matrix_depth += 1;
    }

    fn pop_matrix(&mut self) {
        self.matrix_depth = self.matrix_depth.saturating_sub(1);
    }

    fn translate(&mut self, _x: f32, _y: f32) {}

    fn scale(&mut self, _sx: f32, _sy: f32) {}

    fn draw_box(&mut self, x: f32, y: f32, cx: f32, cy: f32, color: Color) {
        self.calls.push(DrawCall::Box { x, y, cx, cy, color });
    }

    fn draw_source(&mut self, name: &str, cx: f32, cy: f32) {
        self.calls.push(DrawCall::Source { name: name.to_string(), cx, cy });
    }

    fn draw_program(&mut self, cx: f32, cy: f32) {
        self.calls.push(DrawCall::Program { cx, cy });
    }

    fn label_size(&self, text: &str, size: f32) -> (f32, f32) {
        (text.chars().count() as f32 * size * 0.5, size)
    }

    fn draw_label(&mut self, text: &str, _size: f32, _color: Color) {
        self.calls.push(DrawCall::Label(text.to_string()));
    }
}

/// A minimal custom item kind implemented in Rust behind the C ABI
pub mod plugin {
    use std::ffi::{c_char, c_int, c_void, CStr, CString};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::bridge::exports;
    use crate::bridge::ItemCallbacks;
    use crate::grid::ItemConfig;
    use crate::host::Color;
    use crate::items::ItemGeometry;

    pub const FILL: Color = Color(0xFF12_3456);

    static DESTROYED: AtomicUsize = AtomicUsize::new(0);

    thread_local! {
        static MENUS_BUILT: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
    }

    #[derive(Debug, Default)]
    pub struct ClockState {
        pub ticks: i64,
        pub updates: usize,
        pub clicks: usize,
        pub last_cell: (i32, i32, i32, i32),
        pub menus: usize,
        /// Item handles seen by `init` and the latest `update`
        pub init_handle: usize,
        pub update_handle: usize,
        saved: Option<CString>,
    }

    /// # Safety
    /// `data` must come from this kind's `init`.
    pub unsafe fn state<'a>(data: *mut c_void) -> &'a mut ClockState {
        &mut *(data as *mut ClockState)
    }

    /// Number of `destroy` calls so far, across all tests
    pub fn destroyed() -> usize {
        DESTROYED.load(Ordering::SeqCst)
    }

    /// Number of `context_menu` calls made on the current thread
    pub fn menus_built() -> usize {
        MENUS_BUILT.with(|n| n.get())
    }

    unsafe extern "C" fn init(item: *const ItemGeometry) -> *mut c_void {
        let state = ClockState { init_handle: item as usize, ..Default::default() };
        Box::into_raw(Box::new(state)) as *mut c_void
    }

    unsafe extern "C" fn destroy(_item: *const ItemGeometry, data: *mut c_void) {
        if !data.is_null() {
            drop(Box::from_raw(data as *mut ClockState));
        }
        DESTROYED.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn save(_item: *const ItemGeometry, data: *mut c_void) -> *const c_char {
        let s = state(data);
        let text = serde_json::json!({ "ticks": s.ticks }).to_string();
        s.saved = CString::new(text).ok();
        s.saved.as_ref().map_or(std::ptr::null(), |c| c.as_ptr())
    }

    unsafe extern "C" fn load(_item: *const ItemGeometry, data: *mut c_void, json: *const c_char) {
        let text = CStr::from_ptr(json).to_string_lossy();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap_or_default();
        state(data).ticks = value["ticks"].as_i64().unwrap_or(0);
    }

    unsafe extern "C" fn reset(user_data: *mut c_void) {
        state(user_data).ticks = 0;
    }

    unsafe extern "C" fn context_menu(_item: *const ItemGeometry, data: *mut c_void, menu: *mut c_void) {
        state(data).menus += 1;
        MENUS_BUILT.with(|n| n.set(n.get() + 1));
        exports::multiview_menu_add_action(menu, c"clock.reset".as_ptr(), c"Reset".as_ptr(), Some(reset), data);
    }

    unsafe extern "C" fn mouse_event(
        _item: *const ItemGeometry,
        data: *mut c_void,
        _cfg: *const ItemConfig,
        _x: c_int,
        _y: c_int,
        buttons: c_int,
        _modifiers: c_int,
    ) {
        if buttons & 1 != 0 {
            state(data).clicks += 1;
        }
    }

    unsafe extern "C" fn render(_item: *const ItemGeometry, _data: *mut c_void, _cfg: *const ItemConfig, target: *mut c_void) {
        exports::multiview_draw_box(target, 0.0, 0.0, 10.0, 10.0, FILL.0);
    }

    unsafe extern "C" fn fill_color(_item: *const ItemGeometry, _data: *mut c_void) -> u32 {
        FILL.0
    }

    unsafe extern "C" fn update(
        item: *const ItemGeometry,
        data: *mut c_void,
        _cfg: *const ItemConfig,
        col: c_int,
        row: c_int,
        w: c_int,
        h: c_int,
    ) {
        let s = state(data);
        s.updates += 1;
        s.update_handle = item as usize;
        s.last_cell = (col, row, w, h);
    }

    unsafe extern "C" fn get_id() -> *const c_char {
        c"test_clock".as_ptr()
    }

    unsafe extern "C" fn get_name() -> *const c_char {
        c"Test clock".as_ptr()
    }

    pub unsafe extern "C" fn empty_string() -> *const c_char {
        c"".as_ptr()
    }

    pub fn callbacks() -> ItemCallbacks {
        ItemCallbacks {
            init: Some(init),
            destroy: Some(destroy),
            save: Some(save),
            load: Some(load),
            context_menu: Some(context_menu),
            mouse_event: Some(mouse_event),
            render: Some(render),
            fill_color: Some(fill_color),
            update: Some(update),
            get_id: Some(get_id),
            get_name: Some(get_name),
        }
    }
}
