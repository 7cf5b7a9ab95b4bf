//! Editable field descriptors for the settings editor
//!
//! Each layer kind exposes a fixed list of fields. Accessors are plain
//! function pointers so the tables are static.

use crate::layer::{BeatReaction, LayerKind, LayerSettings, SPEED_RANGE};

/// A named, editable property of a layer
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Current value formatted for display
    pub get: fn(&LayerSettings) -> String,
    /// Parse and apply a typed value; false if it didn't parse
    pub set: fn(&mut LayerSettings, &str) -> bool,
    /// Step the value by a signed amount (Left/Right in the editor)
    pub cycle: fn(&mut LayerSettings, i32),
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor").field("name", &self.name).finish()
    }
}

fn on_off(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

// Enabled

fn get_enabled(layer: &LayerSettings) -> String {
    on_off(layer.enabled)
}

fn set_enabled(layer: &mut LayerSettings, value: &str) -> bool {
    parse_bool(value).map(|v| layer.enabled = v).is_some()
}

fn cycle_enabled(layer: &mut LayerSettings, _delta: i32) {
    layer.enabled = !layer.enabled;
}

// Z-order

fn get_z_order(layer: &LayerSettings) -> String {
    layer.z_order.to_string()
}

fn set_z_order(layer: &mut LayerSettings, value: &str) -> bool {
    value.trim().parse().map(|v| layer.z_order = v).is_ok()
}

fn cycle_z_order(layer: &mut LayerSettings, delta: i32) {
    layer.z_order = layer.z_order.saturating_add(delta);
}

// Beat reaction

fn get_beat_reaction(layer: &LayerSettings) -> String {
    layer.beat_reaction.name().to_string()
}

fn set_beat_reaction(layer: &mut LayerSettings, value: &str) -> bool {
    let value = value.trim();
    match BeatReaction::ALL
        .iter()
        .find(|r| r.name().eq_ignore_ascii_case(value))
    {
        Some(&reaction) => {
            layer.beat_reaction = reaction;
            true
        }
        None => false,
    }
}

fn cycle_beat_reaction(layer: &mut LayerSettings, delta: i32) {
    layer.beat_reaction = layer.beat_reaction.cycle(delta);
}

// Speed

fn get_speed(layer: &LayerSettings) -> String {
    format!("{:.1}x", layer.speed_multiplier)
}

fn set_speed(layer: &mut LayerSettings, value: &str) -> bool {
    match value.trim().trim_end_matches('x').parse::<f32>() {
        Ok(v) if v.is_finite() => {
            layer.speed_multiplier = v.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
            true
        }
        _ => false,
    }
}

fn cycle_speed(layer: &mut LayerSettings, delta: i32) {
    let stepped = layer.speed_multiplier + delta as f32 * 0.1;
    layer.speed_multiplier = ((stepped * 10.0).round() / 10.0).clamp(SPEED_RANGE.0, SPEED_RANGE.1);
}

// Color index

fn get_color_index(layer: &LayerSettings) -> String {
    layer.color_index.to_string()
}

fn set_color_index(layer: &mut LayerSettings, value: &str) -> bool {
    value.trim().parse().map(|v| layer.color_index = v).is_ok()
}

fn cycle_color_index(layer: &mut LayerSettings, delta: i32) {
    layer.color_index = layer.color_index.saturating_add_signed(delta as isize);
}

// Text snippets, '|' separated in the editor

fn get_text(layer: &LayerSettings) -> String {
    layer.text_snippets.join(" | ")
}

fn set_text(layer: &mut LayerSettings, value: &str) -> bool {
    layer.text_snippets = value
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    true
}

fn cycle_text(layer: &mut LayerSettings, delta: i32) {
    if layer.text_snippets.len() > 1 {
        let len = layer.text_snippets.len();
        let shift = delta.rem_euclid(len as i32) as usize;
        layer.text_snippets.rotate_left(shift);
    }
}

// Marquee row

fn get_row(layer: &LayerSettings) -> String {
    layer.row.map_or_else(|| "center".to_string(), |r| r.to_string())
}

fn set_row(layer: &mut LayerSettings, value: &str) -> bool {
    let value = value.trim();
    if value.eq_ignore_ascii_case("center") {
        layer.row = None;
        return true;
    }
    value.parse().map(|v| layer.row = Some(v)).is_ok()
}

fn cycle_row(layer: &mut LayerSettings, delta: i32) {
    layer.row = match (layer.row, delta < 0) {
        (None, false) => Some(0),
        (None, true) => None,
        (Some(0), true) => None,
        (Some(r), _) => Some((r as i32 + delta).clamp(0, u16::MAX as i32) as u16),
    };
}

// Spectrum toggles

fn get_volume_bar(layer: &LayerSettings) -> String {
    on_off(layer.show_volume_bar)
}

fn set_volume_bar(layer: &mut LayerSettings, value: &str) -> bool {
    parse_bool(value).map(|v| layer.show_volume_bar = v).is_some()
}

fn cycle_volume_bar(layer: &mut LayerSettings, _delta: i32) {
    layer.show_volume_bar = !layer.show_volume_bar;
}

fn get_row_labels(layer: &LayerSettings) -> String {
    on_off(layer.show_row_labels)
}

fn set_row_labels(layer: &mut LayerSettings, value: &str) -> bool {
    parse_bool(value).map(|v| layer.show_row_labels = v).is_some()
}

fn cycle_row_labels(layer: &mut LayerSettings, _delta: i32) {
    layer.show_row_labels = !layer.show_row_labels;
}

fn get_freq_labels(layer: &LayerSettings) -> String {
    on_off(layer.show_frequency_labels)
}

fn set_freq_labels(layer: &mut LayerSettings, value: &str) -> bool {
    parse_bool(value).map(|v| layer.show_frequency_labels = v).is_some()
}

fn cycle_freq_labels(layer: &mut LayerSettings, _delta: i32) {
    layer.show_frequency_labels = !layer.show_frequency_labels;
}

// Oscilloscope gain

fn get_gain(layer: &LayerSettings) -> String {
    format!("{:.1}", layer.scope_gain())
}

fn set_gain(layer: &mut LayerSettings, value: &str) -> bool {
    match value.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => {
            layer.oscilloscope_gain = Some(v.clamp(0.1, 20.0));
            true
        }
        _ => false,
    }
}

fn cycle_gain(layer: &mut LayerSettings, delta: i32) {
    let stepped = layer.scope_gain() + delta as f32 * 0.5;
    layer.oscilloscope_gain = Some(stepped.clamp(0.5, 20.0));
}

const COMMON_FIELDS: [FieldDescriptor; 5] = [
    FieldDescriptor {
        name: "Enabled",
        get: get_enabled,
        set: set_enabled,
        cycle: cycle_enabled,
    },
    FieldDescriptor {
        name: "ZOrder",
        get: get_z_order,
        set: set_z_order,
        cycle: cycle_z_order,
    },
    FieldDescriptor {
        name: "BeatReaction",
        get: get_beat_reaction,
        set: set_beat_reaction,
        cycle: cycle_beat_reaction,
    },
    FieldDescriptor {
        name: "Speed",
        get: get_speed,
        set: set_speed,
        cycle: cycle_speed,
    },
    FieldDescriptor {
        name: "ColorIndex",
        get: get_color_index,
        set: set_color_index,
        cycle: cycle_color_index,
    },
];

const TEXT_FIELD: FieldDescriptor = FieldDescriptor {
    name: "Text",
    get: get_text,
    set: set_text,
    cycle: cycle_text,
};

const ROW_FIELD: FieldDescriptor = FieldDescriptor {
    name: "Row",
    get: get_row,
    set: set_row,
    cycle: cycle_row,
};

const SPECTRUM_FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor {
        name: "VolumeBar",
        get: get_volume_bar,
        set: set_volume_bar,
        cycle: cycle_volume_bar,
    },
    FieldDescriptor {
        name: "RowLabels",
        get: get_row_labels,
        set: set_row_labels,
        cycle: cycle_row_labels,
    },
    FieldDescriptor {
        name: "FrequencyLabels",
        get: get_freq_labels,
        set: set_freq_labels,
        cycle: cycle_freq_labels,
    },
];

const GAIN_FIELD: FieldDescriptor = FieldDescriptor {
    name: "Gain",
    get: get_gain,
    set: set_gain,
    cycle: cycle_gain,
};

/// Editable fields for a layer kind, common fields first
pub fn fields_for(kind: LayerKind) -> Vec<FieldDescriptor> {
    let mut fields = COMMON_FIELDS.to_vec();
    match kind {
        LayerKind::Marquee => {
            fields.push(TEXT_FIELD);
            fields.push(ROW_FIELD);
        }
        LayerKind::FallingLetters => fields.push(TEXT_FIELD),
        LayerKind::SpectrumSkin => fields.extend_from_slice(&SPECTRUM_FIELDS),
        LayerKind::Oscilloscope => fields.push(GAIN_FIELD),
        _ => {}
    }
    fields
}
