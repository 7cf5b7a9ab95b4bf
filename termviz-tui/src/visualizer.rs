//! Per-frame compositing: layers in z-order into the cell buffer, then a
//! row-diffed flush

use crate::buffer::{CellBuffer, LineWriter};
use crate::layers::{DrawContext, RendererRegistry};
use crate::state::LayerStateStore;
use crate::theme::Theme;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use termviz_audio::{AnalysisSnapshot, Viewport};
use termviz_library::{LayerKind, PaletteSet, VisualizerSettings};
use thiserror::Error;
use tracing::debug;

/// Substituted for the visualizer when a frame fails
pub const FALLBACK_LINE: &str = "[visualizer unavailable]";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
    #[error("no renderer registered for {0:?}")]
    MissingRenderer(LayerKind),
    #[error("viewport has no cells")]
    EmptyViewport,
}

/// What a successful frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutput {
    /// Rows dispatched to the writer after diffing
    pub rows_written: usize,
    pub layers_drawn: usize,
}

/// Layered visualizer
///
/// Owns the cell buffer, the per-slot animation state and the renderer
/// table. Call `render_frame` once per published snapshot.
pub struct Visualizer {
    buffer: CellBuffer,
    store: LayerStateStore,
    registry: RendererRegistry,
    rng: StdRng,
    theme: Theme,
    /// Kind each slot was last drawn as
    slot_kinds: Vec<Option<LayerKind>>,
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer {
    /// Visualizer with the built-in renderers and OS-seeded randomness
    pub fn new() -> Self {
        Self::build(RendererRegistry::with_builtin(), StdRng::from_entropy())
    }

    /// Deterministic randomness for reproducible output
    pub fn with_seed(seed: u64) -> Self {
        Self::build(RendererRegistry::with_builtin(), StdRng::seed_from_u64(seed))
    }

    pub fn with_registry(registry: RendererRegistry, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::build(registry, rng)
    }

    fn build(registry: RendererRegistry, rng: StdRng) -> Self {
        Self {
            buffer: CellBuffer::default(),
            store: LayerStateStore::new(),
            registry,
            rng,
            theme: Theme::default(),
            slot_kinds: Vec::new(),
        }
    }

    /// Compose one frame from `snapshot` and write the changed rows
    pub fn render_frame(
        &mut self,
        snapshot: &AnalysisSnapshot,
        settings: &VisualizerSettings,
        palettes: &PaletteSet,
        writer: &mut dyn LineWriter,
    ) -> Result<FrameOutput, RenderError> {
        let viewport = snapshot.viewport;
        if viewport.width == 0 || viewport.height == 0 {
            return Err(RenderError::EmptyViewport);
        }

        if self.buffer.ensure_size(viewport.width, viewport.height) {
            debug!(width = viewport.width, height = viewport.height, "cell buffer resized");
        }
        self.buffer.clear(self.theme.background);
        self.store.ensure_capacity(settings.layers.len());
        if self.slot_kinds.len() < settings.layers.len() {
            self.slot_kinds.resize(settings.layers.len(), None);
        }

        let burst = snapshot.speed_burst();
        let mut layers_drawn = 0;
        for index in settings.draw_order() {
            let layer = &settings.layers[index];
            let kind = layer.layer_type;
            let renderer = self
                .registry
                .get(kind)
                .ok_or(RenderError::MissingRenderer(kind))?;

            if let Some(previous) = self.slot_kinds[index] {
                if previous != kind {
                    debug!(slot = index, from = ?previous, to = ?kind, "layer kind changed");
                    self.store.clear_state(index);
                }
            }
            self.slot_kinds[index] = Some(kind);

            let palette = palettes.resolve(layer, &settings.palette_id);
            let scroll = self.store.scroll(index);
            let mut ctx = DrawContext {
                buffer: &mut self.buffer,
                snapshot,
                palette,
                theme: &self.theme,
                burst,
                width: viewport.width,
                height: viewport.height,
                rng: &mut self.rng,
            };
            let scroll = renderer.draw(layer, scroll, self.store.slot_mut(index), &mut ctx);
            self.store.set_scroll(index, scroll);
            layers_drawn += 1;
        }

        let rows_written = self.buffer.flush_to(writer, viewport.start_row)?;
        Ok(FrameOutput {
            rows_written,
            layers_drawn,
        })
    }

    /// Drop a slot's animation state so it restarts on the next frame
    pub fn clear_layer_state(&mut self, index: usize) {
        self.store.clear_state(index);
    }

    /// Force every row to be rewritten on the next frame
    pub fn invalidate(&mut self) {
        self.buffer.invalidate();
    }

    /// Replace the visualizer area with the fallback line
    ///
    /// Clears the remaining rows and invalidates the diff cache so the next
    /// good frame redraws in full.
    pub fn write_fallback(
        &mut self,
        writer: &mut dyn LineWriter,
        viewport: Viewport,
    ) -> io::Result<()> {
        self.buffer.invalidate();
        if viewport.height == 0 {
            return Ok(());
        }
        let width = viewport.width as usize;
        let blank = " ".repeat(width);
        let line: String = FALLBACK_LINE.chars().take(width).collect();
        writer.write_line(viewport.start_row, &format!("{:<width$}", line))?;
        for row in 1..viewport.height {
            writer.write_line(viewport.start_row + row, &blank)?;
        }
        Ok(())
    }

    /// Plain text of a composed row, for inspection
    pub fn row_text(&self, y: u16) -> String {
        self.buffer.row_text(y)
    }
}
