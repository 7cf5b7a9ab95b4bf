//! Terminal compositor for termviz
//!
//! Layers draw into a cell grid in z-order; only rows that changed since the
//! previous frame reach the terminal.

mod buffer;
mod header;
pub mod layers;
mod overlay;
mod state;
mod theme;
mod visualizer;

pub use buffer::{Cell, CellBuffer, LineWriter};
pub use header::{HeaderBar, HeaderInfo};
pub use layers::{DrawContext, LayerRenderer, RendererRegistry};
pub use overlay::{render_help, render_settings, HELP_LINES};
pub use state::{
    coerce, BeatCirclesState, FallingLettersState, LayerState, LayerStateStore, MatrixRainState,
    Particle, PlasmaState, Ring, ScrollState, SlotState,
};
pub use theme::{to_color, Theme, CHROME};
pub use visualizer::{FrameOutput, RenderError, Visualizer, FALLBACK_LINE};
