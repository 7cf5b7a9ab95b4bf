//! Layer renderers
//!
//! Each renderer draws one layer kind into the cell buffer. Renderers hold
//! no mutable state of their own: scroll position comes in and goes out by
//! value, and anything else lives in the slot's `LayerState`.

mod beat_circles;
mod falling_letters;
mod marquee;
mod matrix_rain;
mod plasma;
mod scope;
mod scrolling_colors;
mod spectrum;
mod vu_meter;

pub use beat_circles::BeatCirclesRenderer;
pub use falling_letters::{FallingLettersRenderer, MAX_PARTICLES, SPAWN_BURST};
pub use marquee::{MarqueeRenderer, FLASH_JUMP};
pub use matrix_rain::MatrixRainRenderer;
pub use plasma::PlasmaRenderer;
pub use scope::OscilloscopeRenderer;
pub use scrolling_colors::ScrollingColorsRenderer;
pub use spectrum::SpectrumRenderer;
pub use vu_meter::VuMeterRenderer;

use crate::buffer::CellBuffer;
use crate::state::{LayerState, ScrollState};
use crate::theme::{to_color, Theme};
use crossterm::style::Color;
use rand::rngs::StdRng;
use std::collections::HashMap;
use termviz_audio::AnalysisSnapshot;
use termviz_library::{BeatReaction, LayerKind, LayerSettings, Palette};

/// Everything a renderer may read or write for one layer in one frame
pub struct DrawContext<'a> {
    pub buffer: &'a mut CellBuffer,
    pub snapshot: &'a AnalysisSnapshot,
    /// Palette resolved for this layer
    pub palette: &'a Palette,
    pub theme: &'a Theme,
    /// 2.0 during a beat flash, else 1.0
    pub burst: f32,
    pub width: u16,
    pub height: u16,
    pub rng: &'a mut StdRng,
}

impl DrawContext<'_> {
    /// Palette color at `index` (wraps)
    pub fn color(&self, index: usize) -> Color {
        to_color(self.palette.color(index))
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len().max(1)
    }

    pub fn flash(&self) -> bool {
        self.snapshot.beat_flash
    }

    pub fn set(&mut self, x: i32, y: i32, ch: char, color: Color) {
        self.buffer.set(x, y, ch, color);
    }
}

/// Draws one layer kind
pub trait LayerRenderer: Send + Sync {
    fn kind(&self) -> LayerKind;

    /// Draw `layer` for this frame and return its updated scroll state
    fn draw(
        &self,
        layer: &LayerSettings,
        scroll: ScrollState,
        state: &mut LayerState,
        ctx: &mut DrawContext<'_>,
    ) -> ScrollState;
}

/// Per-frame animation step for a layer
pub(crate) fn step(layer: &LayerSettings, ctx: &DrawContext<'_>) -> f32 {
    layer.speed_multiplier * ctx.burst
}

/// Palette offset for a layer: its color index, reduced to the palette,
/// plus one step during a ColorPop flash
pub(crate) fn color_shift(layer: &LayerSettings, ctx: &DrawContext<'_>) -> usize {
    let pop = usize::from(layer.beat_reaction == BeatReaction::ColorPop && ctx.flash());
    layer.color_index % ctx.palette_len() + pop
}

/// Renderers by layer kind, built once at startup
pub struct RendererRegistry {
    renderers: HashMap<LayerKind, Box<dyn LayerRenderer>>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl RendererRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registry with a renderer for every layer kind
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ScrollingColorsRenderer));
        registry.register(Box::new(MarqueeRenderer));
        registry.register(Box::new(FallingLettersRenderer));
        registry.register(Box::new(MatrixRainRenderer));
        registry.register(Box::new(SpectrumRenderer));
        registry.register(Box::new(PlasmaRenderer));
        registry.register(Box::new(BeatCirclesRenderer));
        registry.register(Box::new(OscilloscopeRenderer));
        registry.register(Box::new(VuMeterRenderer));
        registry
    }

    /// Add a renderer, replacing any existing one for its kind
    pub fn register(&mut self, renderer: Box<dyn LayerRenderer>) {
        self.renderers.insert(renderer.kind(), renderer);
    }

    pub fn get(&self, kind: LayerKind) -> Option<&dyn LayerRenderer> {
        self.renderers.get(&kind).map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_covers_every_kind() {
        let registry = RendererRegistry::with_builtin();
        assert_eq!(registry.len(), LayerKind::ALL.len());
        for kind in LayerKind::ALL {
            assert_eq!(registry.get(kind).map(|r| r.kind()), Some(kind));
        }
        assert!(RendererRegistry::new().get(LayerKind::Plasma).is_none());
    }
}
