//! Analysis engine for termviz
//!
//! Turns raw capture deliveries into a published analysis snapshot:
//! - Frame: PCM format descriptor and channel demultiplexing
//! - Engine: sample accumulation, analyzer scheduling, publish throttling
//! - Snapshot: read-only per-frame analysis state and display geometry

mod engine;
mod frame;
mod snapshot;

pub use engine::{bands_for_width, AnalysisEngine, EngineCommand, PUBLISH_INTERVAL};
pub use frame::{AudioFormat, AudioFrame, ChannelBlock, FrameError};
pub use snapshot::{AnalysisSnapshot, Viewport};
