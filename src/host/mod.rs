//! Boundary to the host application
//!
//! The multiview never draws pixels or owns scenes itself. It talks to the
//! host through two traits:
//! - `GraphicsContext` - region/matrix stack and drawing primitives, used
//!   during the render pass
//! - `Frontend` - read-only scene/source/audio model plus the few commands
//!   items issue (switch scene, mute, fader)
//!
//! `EguiSurface` is a concrete `GraphicsContext` on top of an egui painter.

pub mod egui_surface;

pub use egui_surface::{EguiSurface, RegionStack};

/// 32-bit ARGB color, `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const BLACK: Color = Color(0xFF00_0000);
    /// Grid background and default cell border
    pub const BORDER_GRAY: Color = Color(0xFFD0_D0D0);
    /// Cell border while hovered
    pub const HOVER_GREEN: Color = Color(0xFF00_4400);
    /// Scene shown in preview while studio mode is active
    pub const PREVIEW: Color = Color(0xFF00_D000);
    /// Scene currently on program
    pub const PROGRAM: Color = Color(0xFFD0_0000);
    /// Drag-selection outline
    pub const SELECTION_CYAN: Color = Color(0xFF00_9999);
    /// Translucent plate behind name labels
    pub const LABEL_BACKGROUND: Color = Color(0xD91F_1F1F);
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }

    pub fn is_transparent(self) -> bool {
        self.alpha() == 0
    }
}

/// Window-pixel rectangle a region draws into
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub cx: i32,
    pub cy: i32,
}

/// Orthographic projection mapped onto a `Viewport`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ortho {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Drawing surface supplied by the host for one render pass.
///
/// Regions nest: `push_region` installs a viewport + projection that also
/// clips, `pop_region` restores the previous one. Drawing coordinates pass
/// through the current matrix first.
pub trait GraphicsContext {
    fn push_region(&mut self, viewport: Viewport, ortho: Ortho);
    fn pop_region(&mut self);

    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn scale(&mut self, sx: f32, sy: f32);

    /// Solid rectangle
    fn draw_box(&mut self, x: f32, y: f32, cx: f32, cy: f32, color: Color);

    /// Render a named video source into `(0, 0, cx, cy)`
    fn draw_source(&mut self, name: &str, cx: f32, cy: f32);

    /// Render the program output into `(0, 0, cx, cy)`
    fn draw_program(&mut self, cx: f32, cy: f32);

    /// Size a label would occupy at `size` pixels
    fn label_size(&self, text: &str, size: f32) -> (f32, f32);

    /// Draw a label with its top-left corner at the origin
    fn draw_label(&mut self, text: &str, size: f32, color: Color);
}

/// Scene as the host reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInfo {
    pub name: String,
    /// Scenes flagged this way are skipped by bulk fills
    pub hidden_in_multiview: bool,
}

impl SceneInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), hidden_in_multiview: false }
    }
}

/// Active audio source as the host reports it
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSourceInfo {
    pub name: String,
    pub muted: bool,
    /// Fader position in `0.0..=1.0`
    pub deflection: f32,
    /// Global desktop/aux device, listed before per-scene sources
    pub global: bool,
    pub channels: usize,
}

/// Latest meter readings for one source, dBFS per channel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioLevels {
    pub magnitude: Vec<f32>,
    pub peak: Vec<f32>,
    pub muted: bool,
}

/// Frontend preferences that change how scene cells react to clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontendSettings {
    pub switch_on_click: bool,
    pub transition_on_double_click: bool,
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self { switch_on_click: true, transition_on_double_click: true }
    }
}

/// Scene/source model of the host application
pub trait Frontend: Send + Sync {
    fn scenes(&self) -> Vec<SceneInfo>;
    /// Names of all sources that produce video
    fn video_sources(&self) -> Vec<String>;
    fn audio_sources(&self) -> Vec<AudioSourceInfo>;
    fn audio_levels(&self, source: &str) -> Option<AudioLevels>;
    /// Native size of a source or scene, `None` if it doesn't exist
    fn source_size(&self, source: &str) -> Option<(u32, u32)>;

    fn program_scene(&self) -> Option<String>;
    fn preview_scene(&self) -> Option<String>;
    fn studio_mode(&self) -> bool;
    fn settings(&self) -> FrontendSettings;
    /// Name of the active scene collection, used to key stored layouts
    fn scene_collection(&self) -> String;

    fn set_program_scene(&self, scene: &str);
    fn set_preview_scene(&self, scene: &str);
    fn set_muted(&self, source: &str, muted: bool);
    fn set_deflection(&self, source: &str, deflection: f32);
}
