//! Fader strip for the host's active audio sources

use std::cmp::Ordering;
use std::time::Instant;

use serde_json::{Map, Value};

use super::volume_meter::{VolumeMeter, NOMINAL_COLOR};
use super::widget::{clamp_channel_width, ConfigWidget, MixerOptions};
use super::{draw_background, json_i32, kind, ItemBase, ItemError, LayoutItem, MouseButtons, MouseData, MouseEventKind};
use crate::grid::{Cell, ItemConfig};
use crate::host::{AudioLevels, AudioSourceInfo, Color, Frontend, GraphicsContext};

const FIRST_SLIDER_X: i32 = 35;
const HANDLE_WIDTH: i32 = 24;
const HANDLE_HEIGHT: i32 = 8;
/// Distance from the meter's right edge to the fader track center
const TRACK_OFFSET: i32 = 15;
const MUTE_GAP: i32 = 4;
const DEFAULT_CHANNEL_WIDTH: i32 = 3;

const TRACK_ON: Color = Color::argb(255, 42, 130, 218);
const TRACK_OFF: Color = Color::argb(255, 100, 100, 100);
const HANDLE: Color = Color::argb(255, 210, 210, 210);
const MUTED_BOX: Color = Color::argb(255, 100, 100, 100);

/// Global devices first, then case-insensitive by name
fn mixer_order(a: &AudioSourceInfo, b: &AudioSourceInfo) -> Ordering {
    b.global
        .cmp(&a.global)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

#[derive(Debug, Clone)]
struct MixerSlider {
    meter: VolumeMeter,
    muted: bool,
    /// Fader position, 1.0 is full volume
    deflection: f32,
    dragging: bool,
    mute_pressed: bool,
}

impl MixerSlider {
    fn new(info: &AudioSourceInfo, x: i32, y: i32, height: i32, channel_width: i32) -> Self {
        Self {
            meter: VolumeMeter::new(info.name.clone(), x, y, height, channel_width),
            muted: info.muted,
            deflection: info.deflection,
            dragging: false,
            mute_pressed: false,
        }
    }

    fn name(&self) -> &str {
        self.meter.source()
    }

    fn slider_width(&self) -> i32 {
        (self.meter.channel_width() as f32 * 1.5) as i32
    }

    fn track_center(&self) -> i32 {
        self.meter.x() + self.meter.width() + TRACK_OFFSET
    }

    /// Pixels between the top of the track and the handle
    fn on_length(&self) -> i32 {
        ((self.meter.height() - HANDLE_HEIGHT) as f32 * (1.0 - self.deflection)) as i32
    }

    /// Mute box: a square as wide as the meter, just below it
    fn mute_box(&self) -> (i32, i32, i32) {
        let dim = self.meter.width();
        (self.meter.x(), self.meter.y() + self.meter.height() + MUTE_GAP, dim)
    }

    fn over_slider(&self, x: i32, y: i32) -> bool {
        let m = &self.meter;
        let left = m.x() + m.width() + 2;
        let right = m.x() + m.width() + 20 + self.slider_width();
        x >= left && x <= right && y >= m.y() && y <= m.y() + m.height()
    }

    fn over_mute(&self, x: i32, y: i32) -> bool {
        let (bx, by, dim) = self.mute_box();
        x >= bx - 2 && x <= bx + dim + 2 && y >= by - 2 && y <= by + dim + 2
    }

    fn sync(&mut self, info: &AudioSourceInfo) {
        self.muted = info.muted;
        if !self.dragging {
            self.deflection = info.deflection;
        }
    }

    fn mouse_event(&mut self, e: &MouseData, mx: i32, my: i32, host: &dyn Frontend) {
        if e.buttons.contains(MouseButtons::LEFT) {
            if self.over_slider(mx, my) {
                self.dragging = true;
            }
            if self.dragging && self.meter.height() > 0 {
                let top = self.meter.y();
                let fade = ((my.max(top) - top) as f32 / self.meter.height() as f32).clamp(0.0, 1.0);
                self.deflection = 1.0 - fade;
                host.set_deflection(self.meter.source(), self.deflection);
            }
            if self.over_mute(mx, my) && e.kind == MouseEventKind::Press {
                self.mute_pressed = true;
            }
        } else {
            self.dragging = false;
            if !self.over_mute(mx, my) {
                self.mute_pressed = false;
            }
        }

        if e.kind == MouseEventKind::Release && self.mute_pressed {
            self.muted = !self.muted;
            host.set_muted(self.meter.source(), self.muted);
            self.mute_pressed = false;
        }
    }

    fn render(&mut self, gfx: &mut dyn GraphicsContext, levels: Option<&AudioLevels>, cell_scale: f32, now: Instant) {
        self.meter.set_cell_scale(cell_scale);
        self.meter.set_muted(self.muted);
        self.meter.render(gfx, levels, now);

        let height = self.meter.height();
        let on_length = self.on_length();
        let slider_width = self.slider_width();
        let center = self.track_center();
        let top = self.meter.y();

        gfx.push_matrix();
        gfx.translate((center - slider_width / 2) as f32, top as f32);
        if height > on_length {
            gfx.draw_box(0.0, on_length as f32, slider_width as f32, (height - on_length) as f32, TRACK_ON);
        }
        if on_length > 0 {
            gfx.draw_box(0.0, 0.0, slider_width as f32, on_length as f32, TRACK_OFF);
        }
        gfx.pop_matrix();

        gfx.push_matrix();
        gfx.translate((center - HANDLE_WIDTH / 2) as f32, (top + on_length) as f32);
        gfx.draw_box(0.0, 0.0, HANDLE_WIDTH as f32, HANDLE_HEIGHT as f32, HANDLE);
        gfx.pop_matrix();

        let (x, y, dim) = self.mute_box();
        let color = if self.muted { MUTED_BOX } else { NOMINAL_COLOR };
        gfx.draw_box(x as f32, y as f32, dim as f32, dim as f32, color);
    }
}

#[derive(Debug, Clone)]
pub struct AudioMixerItem {
    base: ItemBase,
    channel_width: i32,
    sliders: Vec<MixerSlider>,
    slider_y: i32,
    slider_height: i32,
}

impl AudioMixerItem {
    pub fn new(cell: Cell) -> Self {
        Self {
            base: ItemBase::new(cell),
            channel_width: DEFAULT_CHANNEL_WIDTH,
            sliders: Vec::new(),
            slider_y: 0,
            slider_height: 0,
        }
    }

    pub fn channel_width(&self) -> i32 {
        self.channel_width
    }

    /// Clamped into `CHANNEL_WIDTH_RANGE`
    pub fn set_channel_width(&mut self, width: i32) {
        let width = clamp_channel_width(width);
        self.channel_width = width;
        for slider in &mut self.sliders {
            slider.meter.set_channel_width(width);
        }
        self.relayout();
    }

    /// Source names in slider order
    pub fn slider_sources(&self) -> Vec<&str> {
        self.sliders.iter().map(MixerSlider::name).collect()
    }

    /// Rebuild the slider list if the host's sources changed, then pick up
    /// mute and fader state
    pub fn refresh_sources(&mut self, host: &dyn Frontend) {
        let mut sources = host.audio_sources();
        sources.sort_by(mixer_order);

        let unchanged = sources.len() == self.sliders.len()
            && sources.iter().zip(&self.sliders).all(|(info, s)| info.name == s.name());
        if !unchanged {
            tracing::debug!(count = sources.len(), "Rebuilding mixer sliders");
            self.sliders = sources
                .iter()
                .map(|info| MixerSlider::new(info, 0, self.slider_y, self.slider_height, self.channel_width))
                .collect();
            self.relayout();
        }
        for (slider, info) in self.sliders.iter_mut().zip(&sources) {
            slider.sync(info);
        }
    }

    fn relayout(&mut self) {
        let mut x = FIRST_SLIDER_X;
        for slider in &mut self.sliders {
            slider.meter.set_pos(x, self.slider_y);
            slider.meter.set_height(self.slider_height);
            x += (self.channel_width as f32 * slider.meter.width() as f32 * 2.5) as i32;
        }
    }
}

impl LayoutItem for AudioMixerItem {
    fn base(&self) -> &ItemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    fn kind_id(&self) -> &str {
        kind::AUDIO_MIXER
    }

    fn update(&mut self, cfg: &ItemConfig) {
        self.base.update(cfg);
        let height = self.base.geometry.inner_height as f32;
        self.slider_height = (height * 0.8) as i32;
        self.slider_y = (height * 0.1) as i32;
        self.relayout();
    }

    fn render(&mut self, gfx: &mut dyn GraphicsContext, host: &dyn Frontend, cfg: &ItemConfig) {
        draw_background(&self.base, gfx);
        self.refresh_sources(host);

        let now = Instant::now();
        for slider in &mut self.sliders {
            let levels = host.audio_levels(slider.name());
            slider.render(gfx, levels.as_ref(), cfg.scale, now);
        }
    }

    fn mouse_event(&mut self, e: &MouseData, cfg: &ItemConfig, host: &dyn Frontend) {
        self.base.mouse_event(e, cfg);
        let (mx, my) = self.base.mouse_pos();
        for slider in &mut self.sliders {
            slider.mouse_event(e, mx, my, host);
        }
    }

    fn write_to_json(&self, obj: &mut Map<String, Value>) {
        self.base.write_to_json(self.kind_id(), obj);
        obj.insert("channel_width".into(), self.channel_width.into());
    }

    fn read_from_json(&mut self, obj: &Map<String, Value>) -> Result<(), ItemError> {
        self.base.read_from_json(obj)?;
        let width = json_i32(obj, "channel_width")?.unwrap_or(DEFAULT_CHANNEL_WIDTH);
        self.set_channel_width(width);
        Ok(())
    }

    fn config_widget(&self, _host: &dyn Frontend) -> Option<ConfigWidget> {
        Some(ConfigWidget::AudioMixer(MixerOptions { channel_width: self.channel_width }))
    }

    fn load_config_from_widget(&mut self, widget: &ConfigWidget, _host: &dyn Frontend) {
        if let ConfigWidget::AudioMixer(o) = widget {
            self.set_channel_width(o.channel_width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::widget::CHANNEL_WIDTH_RANGE;
    use crate::items::Modifiers;
    use crate::test_support::{HostCommand, MockFrontend, RecordingSurface};

    fn cfg() -> ItemConfig {
        ItemConfig {
            cx: 1920,
            cy: 1080,
            canvas_width: 1920,
            canvas_height: 1080,
            cell_width: 480.0,
            cell_height: 270.0,
            ..Default::default()
        }
    }

    fn mixer(host: &MockFrontend) -> AudioMixerItem {
        let mut item = AudioMixerItem::new(Cell::new(0, 0, 2, 2));
        item.update(&cfg());
        item.refresh_sources(host);
        item
    }

    fn mouse(x: i32, y: i32, buttons: MouseButtons, kind: MouseEventKind) -> MouseData {
        MouseData { x, y, buttons, modifiers: Modifiers::default(), kind }
    }

    #[test]
    fn test_global_sources_come_first() {
        let host = MockFrontend::default();
        host.add_audio_source("music", false);
        host.add_audio_source("Mic/Aux", true);
        host.add_audio_source("Browser", false);
        host.add_audio_source("Desktop Audio", true);
        let item = mixer(&host);
        assert_eq!(item.slider_sources(), vec!["Desktop Audio", "Mic/Aux", "Browser", "music"]);
    }

    #[test]
    fn test_slider_spacing() {
        let host = MockFrontend::default();
        host.add_audio_source("A", false);
        host.add_audio_source("B", false);
        let item = mixer(&host);
        // Meter width (3 + 2) * 2 = 10, step 3 * 10 * 2.5
        assert_eq!(item.sliders[0].meter.x(), 35);
        assert_eq!(item.sliders[1].meter.x(), 110);
        // 80% of the 532 px inner height, starting 10% down
        assert_eq!(item.sliders[0].meter.height(), 425);
        assert_eq!(item.sliders[0].meter.y(), 53);
    }

    #[test]
    fn test_drag_sets_deflection() {
        let host = MockFrontend::default();
        host.add_audio_source("Mic", false);
        let mut item = mixer(&host);
        let slider_x = item.sliders[0].track_center();
        let top = item.sliders[0].meter.y();
        let height = item.sliders[0].meter.height();

        let y = top + height / 4;
        item.mouse_event(&mouse(slider_x, y, MouseButtons::LEFT, MouseEventKind::Press), &cfg(), &host);
        let expected = 1.0 - (height / 4) as f32 / height as f32;
        assert_eq!(host.commands(), vec![HostCommand::SetDeflection("Mic".into(), expected)]);

        // Dragging past the top pins the fader at full
        item.mouse_event(&mouse(slider_x, 0, MouseButtons::LEFT, MouseEventKind::Move), &cfg(), &host);
        assert_eq!(item.sliders[0].deflection, 1.0);

        item.mouse_event(&mouse(slider_x, 0, MouseButtons::NONE, MouseEventKind::Release), &cfg(), &host);
        assert!(!item.sliders[0].dragging);
    }

    #[test]
    fn test_click_toggles_mute() {
        let host = MockFrontend::default();
        host.add_audio_source("Mic", false);
        let mut item = mixer(&host);
        let (x, y, dim) = item.sliders[0].mute_box();
        let (cx, cy) = (x + dim / 2, y + dim / 2);

        item.mouse_event(&mouse(cx, cy, MouseButtons::LEFT, MouseEventKind::Press), &cfg(), &host);
        item.mouse_event(&mouse(cx, cy, MouseButtons::NONE, MouseEventKind::Release), &cfg(), &host);
        assert_eq!(host.commands(), vec![HostCommand::SetMuted("Mic".into(), true)]);

        // Release away from the box cancels
        item.mouse_event(&mouse(cx, cy, MouseButtons::LEFT, MouseEventKind::Press), &cfg(), &host);
        item.mouse_event(&mouse(cx + 200, cy, MouseButtons::NONE, MouseEventKind::Release), &cfg(), &host);
        assert_eq!(host.commands().len(), 1);
    }

    #[test]
    fn test_render_rebuilds_on_source_change() {
        let host = MockFrontend::default();
        host.add_audio_source("Mic", false);
        let mut item = mixer(&host);
        host.add_audio_source("Desktop Audio", true);
        host.state.lock().audio[0].muted = true;

        let mut gfx = RecordingSurface::default();
        item.render(&mut gfx, &host, &cfg());
        assert_eq!(item.slider_sources(), vec!["Desktop Audio", "Mic"]);
        assert!(item.sliders[1].muted);
        assert_eq!(gfx.boxes_with(MUTED_BOX), 1);
        assert_eq!(gfx.boxes_with(HANDLE), 2);
        assert_eq!(gfx.matrix_depth, 0);
    }

    #[test]
    fn test_channel_width_persists() {
        let mut item = AudioMixerItem::new(Cell::new(0, 3, 4, 1));
        item.set_channel_width(6);
        let mut obj = Map::new();
        item.write_to_json(&mut obj);

        let mut copy = AudioMixerItem::new(Cell::zero());
        copy.read_from_json(&obj).unwrap();
        assert_eq!(copy.channel_width(), 6);
        assert_eq!(copy.cell(), Cell::new(0, 3, 4, 1));
    }

    #[test]
    fn test_stored_channel_width_is_clamped() {
        let mut item = AudioMixerItem::new(Cell::zero());
        let obj = serde_json::json!({ "id": "AudioMixerItem", "col": 0, "row": 0, "w": 2, "h": 2, "channel_width": 2_000_000_000 });
        item.read_from_json(obj.as_object().unwrap()).unwrap();
        assert_eq!(item.channel_width(), CHANNEL_WIDTH_RANGE.1);

        let obj = serde_json::json!({ "id": "AudioMixerItem", "col": 0, "row": 0, "w": 2, "h": 2, "channel_width": -7 });
        item.read_from_json(obj.as_object().unwrap()).unwrap();
        assert_eq!(item.channel_width(), CHANNEL_WIDTH_RANGE.0);
    }
}
