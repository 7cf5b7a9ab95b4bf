//! Settings and palettes for termviz - layer schema, JSON persistence

mod config;
mod fields;
mod layer;
mod palette;

pub use config::{
    SettingsError, VisualizerSettings, DEFAULT_BEAT_SENSITIVITY, DEFAULT_PALETTE_ID,
};
pub use fields::{fields_for, FieldDescriptor};
pub use layer::{
    default_layers, BeatReaction, LayerKind, LayerSettings, MAX_SELECTABLE_LAYERS, SPEED_RANGE,
};
pub use palette::{ansi, builtin_palettes, Palette, PaletteColor, PaletteSet};
