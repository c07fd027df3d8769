//! Option models behind the "set widget" dialog
//!
//! An item hands out a pre-populated `ConfigWidget`, the UI edits it, and the
//! item reads the user's choices back in `load_config_from_widget`.

use super::scene::Indicator;

/// Smallest and largest volume meter channel width in pixels
pub const CHANNEL_WIDTH_RANGE: (i32, i32) = (2, 32);
/// Label size multiplier
pub const FONT_SCALE_RANGE: (f32, f32) = (0.01, 5.0);
/// Meter height as a fraction of the cell height
pub const METER_HEIGHT_RANGE: (f32, f32) = (0.1, 1.0);

pub(crate) fn clamp_channel_width(width: i32) -> i32 {
    width.clamp(CHANNEL_WIDTH_RANGE.0, CHANNEL_WIDTH_RANGE.1)
}

/// NaN falls back to 1.0
pub(crate) fn clamp_font_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(FONT_SCALE_RANGE.0, FONT_SCALE_RANGE.1)
}

/// NaN falls back to half the cell
pub(crate) fn clamp_meter_height(fraction: f32) -> f32 {
    if fraction.is_nan() {
        return 0.5;
    }
    fraction.clamp(METER_HEIGHT_RANGE.0, METER_HEIGHT_RANGE.1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceOptions {
    /// Choices offered to the user, sorted
    pub sources: Vec<String>,
    pub selected: Option<String>,
    pub font_scale: f32,
    pub show_volume: bool,
    pub channel_width: i32,
    /// Meter height as a fraction of the cell height
    pub volume_meter_height: f32,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            selected: None,
            font_scale: 1.0,
            show_volume: false,
            channel_width: CHANNEL_WIDTH_RANGE.0,
            volume_meter_height: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneOptions {
    pub scenes: Vec<String>,
    pub selected: Option<String>,
    pub font_scale: f32,
    pub indicator: Indicator,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            scenes: Vec::new(),
            selected: None,
            font_scale: 1.0,
            indicator: Indicator::Border,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewProgramOptions {
    pub program: bool,
    pub font_scale: f32,
}

impl Default for PreviewProgramOptions {
    fn default() -> Self {
        Self { program: false, font_scale: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixerOptions {
    pub channel_width: i32,
}

impl Default for MixerOptions {
    fn default() -> Self {
        Self { channel_width: 3 }
    }
}

/// User-editable options for one item kind
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWidget {
    Source(SourceOptions),
    Scene(SceneOptions),
    PreviewProgram(PreviewProgramOptions),
    AudioMixer(MixerOptions),
}

impl ConfigWidget {
    /// Clamp every numeric field into its valid range
    pub fn sanitize(&mut self) {
        match self {
            ConfigWidget::Source(o) => {
                o.font_scale = clamp_font_scale(o.font_scale);
                o.channel_width = clamp_channel_width(o.channel_width);
                o.volume_meter_height = clamp_meter_height(o.volume_meter_height);
            }
            ConfigWidget::Scene(o) => o.font_scale = clamp_font_scale(o.font_scale),
            ConfigWidget::PreviewProgram(o) => o.font_scale = clamp_font_scale(o.font_scale),
            ConfigWidget::AudioMixer(o) => o.channel_width = clamp_channel_width(o.channel_width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_ranges() {
        let mut w = ConfigWidget::Source(SourceOptions {
            font_scale: 9.0,
            channel_width: 64,
            volume_meter_height: 0.0,
            ..Default::default()
        });
        w.sanitize();
        match w {
            ConfigWidget::Source(o) => {
                assert_eq!(o.font_scale, 5.0);
                assert_eq!(o.channel_width, 32);
                assert_eq!(o.volume_meter_height, 0.1);
            }
            _ => panic!("kind changed"),
        }
    }
}
