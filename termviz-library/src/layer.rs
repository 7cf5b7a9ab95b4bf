//! Layer schema shared by the settings file and the compositor

use serde::{Deserialize, Serialize};

/// Number of layers addressable by direct-select keys (1-9)
pub const MAX_SELECTABLE_LAYERS: usize = 9;

/// Visual kind of a layer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayerKind {
    #[default]
    ScrollingColors,
    Marquee,
    FallingLetters,
    MatrixRain,
    SpectrumSkin,
    Plasma,
    BeatCircles,
    Oscilloscope,
    VuMeter,
}

impl LayerKind {
    /// Every kind in cycling order
    pub const ALL: [LayerKind; 9] = [
        LayerKind::ScrollingColors,
        LayerKind::Marquee,
        LayerKind::FallingLetters,
        LayerKind::MatrixRain,
        LayerKind::SpectrumSkin,
        LayerKind::Plasma,
        LayerKind::BeatCircles,
        LayerKind::Oscilloscope,
        LayerKind::VuMeter,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|&k| k == self).unwrap_or(0)
    }

    /// Next kind in the cycle (wraps)
    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    /// Previous kind in the cycle (wraps)
    pub fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Get display name
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::ScrollingColors => "Scrolling Colors",
            LayerKind::Marquee => "Marquee",
            LayerKind::FallingLetters => "Falling Letters",
            LayerKind::MatrixRain => "Matrix Rain",
            LayerKind::SpectrumSkin => "Spectrum",
            LayerKind::Plasma => "Plasma",
            LayerKind::BeatCircles => "Beat Circles",
            LayerKind::Oscilloscope => "Oscilloscope",
            LayerKind::VuMeter => "VU Meter",
        }
    }
}

/// How a layer responds to a detected beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeatReaction {
    #[default]
    None,
    SpeedBurst,
    Flash,
    SpawnMore,
    Pulse,
    ColorPop,
}

impl BeatReaction {
    pub const ALL: [BeatReaction; 6] = [
        BeatReaction::None,
        BeatReaction::SpeedBurst,
        BeatReaction::Flash,
        BeatReaction::SpawnMore,
        BeatReaction::Pulse,
        BeatReaction::ColorPop,
    ];

    /// Step through the reaction list by `delta` (wraps)
    pub fn cycle(self, delta: i32) -> Self {
        let len = Self::ALL.len() as i32;
        let pos = Self::ALL.iter().position(|&r| r == self).unwrap_or(0) as i32;
        Self::ALL[(pos + delta).rem_euclid(len) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            BeatReaction::None => "None",
            BeatReaction::SpeedBurst => "SpeedBurst",
            BeatReaction::Flash => "Flash",
            BeatReaction::SpawnMore => "SpawnMore",
            BeatReaction::Pulse => "Pulse",
            BeatReaction::ColorPop => "ColorPop",
        }
    }
}

/// Persisted configuration of one layer slot
///
/// Field names match the settings file (PascalCase). Missing fields take
/// the defaults below; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LayerSettings {
    pub layer_type: LayerKind,
    pub enabled: bool,
    /// Draw order, lower values draw first (further back)
    pub z_order: i32,
    pub text_snippets: Vec<String>,
    pub beat_reaction: BeatReaction,
    pub speed_multiplier: f32,
    pub color_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette_id: Option<String>,

    // Kind-specific extension data
    /// Marquee row (defaults to the vertical center)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oscilloscope_gain: Option<f32>,
    pub show_volume_bar: bool,
    pub show_row_labels: bool,
    pub show_frequency_labels: bool,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            layer_type: LayerKind::default(),
            enabled: true,
            z_order: 0,
            text_snippets: Vec::new(),
            beat_reaction: BeatReaction::None,
            speed_multiplier: 1.0,
            color_index: 0,
            palette_id: None,
            row: None,
            oscilloscope_gain: None,
            show_volume_bar: false,
            show_row_labels: false,
            show_frequency_labels: false,
        }
    }
}

/// Speed multipliers outside this range are clamped on load
pub const SPEED_RANGE: (f32, f32) = (0.1, 10.0);

impl LayerSettings {
    pub fn new(kind: LayerKind, z_order: i32) -> Self {
        Self {
            layer_type: kind,
            z_order,
            ..Self::default()
        }
    }

    /// Oscilloscope gain with its default applied
    pub fn scope_gain(&self) -> f32 {
        self.oscilloscope_gain.unwrap_or(1.0)
    }

    /// Clamp numeric fields into their supported ranges
    pub fn sanitize(&mut self) {
        if !self.speed_multiplier.is_finite() {
            self.speed_multiplier = 1.0;
        }
        self.speed_multiplier = self.speed_multiplier.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
        if let Some(gain) = self.oscilloscope_gain {
            self.oscilloscope_gain = gain.is_finite().then(|| gain.clamp(0.1, 20.0));
        }
    }
}

/// Built-in layer set used when no settings file exists
///
/// One slot per kind, in cycling order, with z-order equal to the slot.
pub fn default_layers() -> Vec<LayerSettings> {
    LayerKind::ALL
        .iter()
        .enumerate()
        .map(|(slot, &kind)| {
            let mut layer = LayerSettings::new(kind, slot as i32);
            layer.enabled = matches!(kind, LayerKind::ScrollingColors | LayerKind::SpectrumSkin);
            match kind {
                LayerKind::Marquee => {
                    layer.text_snippets = vec!["termviz".to_string(), "feel the beat".to_string()];
                    layer.beat_reaction = BeatReaction::SpeedBurst;
                }
                LayerKind::FallingLetters => {
                    layer.text_snippets = vec!["bass".to_string(), "drop".to_string()];
                    layer.beat_reaction = BeatReaction::SpawnMore;
                }
                LayerKind::ScrollingColors => layer.beat_reaction = BeatReaction::ColorPop,
                LayerKind::MatrixRain => layer.beat_reaction = BeatReaction::Flash,
                LayerKind::SpectrumSkin => {
                    layer.show_volume_bar = true;
                    layer.show_frequency_labels = true;
                }
                LayerKind::Plasma | LayerKind::BeatCircles => layer.beat_reaction = BeatReaction::Pulse,
                LayerKind::Oscilloscope | LayerKind::VuMeter => {}
            }
            layer
        })
        .collect()
}
