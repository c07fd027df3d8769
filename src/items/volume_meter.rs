//! Audio level meter overlay
//!
//! Peak ballistics follow the usual PPM behavior: immediate attack, linear
//! decay in dB, and a peak-hold marker that falls back after a while. Levels
//! are polled from the host on every render; a source that stops reporting
//! is treated as silent after `IDLE_TIMEOUT`.

use std::time::{Duration, Instant};

use crate::host::{AudioLevels, Color, GraphicsContext};

pub const MINIMUM_LEVEL: f32 = -60.0;
pub const WARNING_LEVEL: f32 = -20.0;
pub const ERROR_LEVEL: f32 = -9.0;
/// dB per second, 20 dB over 1.7 s
pub const PEAK_DECAY_RATE: f32 = 11.76;
pub const PEAK_HOLD_DURATION: Duration = Duration::from_secs(20);
pub const IDLE_TIMEOUT: Duration = Duration::from_millis(500);
const PEAK_HOLD_HEIGHT: i32 = 3;
const CHANNEL_GAP: i32 = 2;
const FALLBACK_CHANNELS: usize = 2;

struct Palette {
    bg_nominal: Color,
    bg_warning: Color,
    bg_error: Color,
    fg_nominal: Color,
    fg_warning: Color,
    fg_error: Color,
}

const ACTIVE: Palette = Palette {
    bg_nominal: Color::argb(0xff, 0x26, 0x7f, 0x26),
    bg_warning: Color::argb(0xff, 0x7f, 0x7f, 0x26),
    bg_error: Color::argb(0xff, 0x7f, 0x26, 0x26),
    fg_nominal: Color::argb(0xff, 0x4c, 0xff, 0x4c),
    fg_warning: Color::argb(0xff, 0xff, 0xff, 0x4c),
    fg_error: Color::argb(0xff, 0xff, 0x4c, 0x4c),
};

const MUTED: Palette = Palette {
    bg_nominal: Color::argb(0xff, 90, 90, 90),
    bg_warning: Color::argb(0xff, 117, 117, 117),
    bg_error: Color::argb(0xff, 65, 65, 65),
    fg_nominal: Color::argb(0xff, 163, 163, 163),
    fg_warning: Color::argb(0xff, 217, 217, 217),
    fg_error: Color::argb(0xff, 113, 113, 113),
};

/// Bright green used by the mixer's mute box
pub const NOMINAL_COLOR: Color = ACTIVE.fg_nominal;

#[derive(Debug, Clone)]
pub struct VolumeMeter {
    source: String,
    x: i32,
    y: i32,
    height: i32,
    channel_width: i32,
    cell_scale: f32,
    channels: usize,
    muted: bool,
    display_peak: Vec<f32>,
    peak_hold: Vec<f32>,
    peak_hold_since: Vec<Option<Instant>>,
    last_update: Option<Instant>,
}

impl VolumeMeter {
    pub fn new(source: impl Into<String>, x: i32, y: i32, height: i32, channel_width: i32) -> Self {
        let mut meter = Self {
            source: source.into(),
            x,
            y,
            height,
            channel_width,
            cell_scale: 1.0,
            channels: FALLBACK_CHANNELS,
            muted: false,
            display_peak: Vec::new(),
            peak_hold: Vec::new(),
            peak_hold_since: Vec::new(),
            last_update: None,
        };
        meter.reset_levels();
        meter
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.reset_levels();
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn set_height(&mut self, height: i32) {
        self.height = height.max(0);
    }

    pub fn set_pos(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn channel_width(&self) -> i32 {
        self.channel_width
    }

    pub fn set_channel_width(&mut self, width: i32) {
        self.channel_width = width;
    }

    /// Keep bars a constant width on screen regardless of grid scale
    pub fn set_cell_scale(&mut self, scale: f32) {
        if scale > 0.0 {
            self.cell_scale = scale;
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn bar_width(&self) -> i32 {
        (self.channel_width as f32 / self.cell_scale) as i32
    }

    pub fn width(&self) -> i32 {
        (self.bar_width() + CHANNEL_GAP) * self.channels as i32
    }

    pub fn mouse_over(&self, x: i32, y: i32) -> bool {
        x >= self.x && x <= self.x + self.width() && y >= self.y && y <= self.y + self.height
    }

    pub fn reset_levels(&mut self) {
        self.display_peak = vec![f32::NEG_INFINITY; self.channels];
        self.peak_hold = vec![f32::NEG_INFINITY; self.channels];
        self.peak_hold_since = vec![None; self.channels];
        self.last_update = None;
    }

    pub fn display_peak(&self, channel: usize) -> f32 {
        self.display_peak.get(channel).copied().unwrap_or(f32::NEG_INFINITY)
    }

    pub fn peak_hold(&self, channel: usize) -> f32 {
        self.peak_hold.get(channel).copied().unwrap_or(f32::NEG_INFINITY)
    }

    /// Take a new reading from the host and advance the ballistics
    pub fn feed(&mut self, levels: &AudioLevels, now: Instant) {
        let channels = if levels.peak.is_empty() { FALLBACK_CHANNELS } else { levels.peak.len() };
        if channels != self.channels {
            self.channels = channels;
            self.reset_levels();
        }
        self.muted = levels.muted;

        let elapsed = self
            .last_update
            .map(|t| now.saturating_duration_since(t).as_secs_f32())
            .unwrap_or(0.0);
        self.last_update = Some(now);

        for ch in 0..self.channels {
            let current = levels.peak.get(ch).copied().unwrap_or(f32::NEG_INFINITY);
            self.advance_channel(ch, current, elapsed, now);
        }
    }

    fn advance_channel(&mut self, ch: usize, current: f32, elapsed: f32, now: Instant) {
        let shown = self.display_peak[ch];
        self.display_peak[ch] = if current >= shown || shown.is_nan() {
            current
        } else {
            (shown - PEAK_DECAY_RATE * elapsed).clamp(current, 0.0)
        };

        let hold = self.peak_hold[ch];
        let expired = self.peak_hold_since[ch]
            .map(|t| now.saturating_duration_since(t) > PEAK_HOLD_DURATION)
            .unwrap_or(true);
        if current >= hold || !hold.is_finite() || expired {
            self.peak_hold[ch] = current;
            self.peak_hold_since[ch] = Some(now);
        }
    }

    /// Reset to silence if the host hasn't reported for a while
    pub fn detect_idle(&mut self, now: Instant) -> bool {
        match self.last_update {
            Some(t) if now.saturating_duration_since(t) > IDLE_TIMEOUT => {
                self.reset_levels();
                true
            }
            None => true,
            _ => false,
        }
    }

    /// Vertical position of a level inside the meter
    pub fn level_to_y(&self, db: f32) -> i32 {
        let db = if db.is_finite() { db.clamp(MINIMUM_LEVEL, 0.0) } else { MINIMUM_LEVEL };
        self.y + (db * self.height as f32 / MINIMUM_LEVEL) as i32
    }

    pub fn render(&mut self, gfx: &mut dyn GraphicsContext, levels: Option<&AudioLevels>, now: Instant) {
        if let Some(levels) = levels {
            self.feed(levels, now);
        }
        self.detect_idle(now);

        let palette = if self.muted { &MUTED } else { &ACTIVE };
        let bottom = self.y + self.height;
        let nominal_top = self.level_to_y(WARNING_LEVEL);
        let warning_top = self.level_to_y(ERROR_LEVEL);
        let zones = [
            (nominal_top, bottom, palette.fg_nominal, palette.bg_nominal),
            (warning_top, nominal_top, palette.fg_warning, palette.bg_warning),
            (self.y, warning_top, palette.fg_error, palette.bg_error),
        ];
        let w = self.bar_width() as f32;

        for ch in 0..self.channels {
            let x = (self.x + (self.bar_width() + CHANNEL_GAP) * ch as i32) as f32;
            let peak = self.level_to_y(self.display_peak(ch));

            for &(top, end, fg, bg) in &zones {
                let lit = peak.max(top);
                fill(gfx, x, top, w, lit.min(end) - top, bg);
                fill(gfx, x, lit, w, end - lit, fg);
            }

            let hold = self.peak_hold(ch);
            if hold.is_finite() && hold > MINIMUM_LEVEL {
                let hold_y = self.level_to_y(hold);
                let color = if hold_y >= nominal_top {
                    palette.fg_nominal
                } else if hold_y >= warning_top {
                    palette.fg_warning
                } else {
                    palette.fg_error
                };
                fill(gfx, x, hold_y, w, PEAK_HOLD_HEIGHT, color);
            }
        }
    }
}

fn fill(gfx: &mut dyn GraphicsContext, x: f32, y: i32, w: f32, h: i32, color: Color) {
    if h > 0 && w > 0.0 {
        gfx.draw_box(x, y as f32, w, h as f32, color);
    }
}
