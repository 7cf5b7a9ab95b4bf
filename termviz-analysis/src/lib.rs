//! Audio analysis module for termviz
//!
//! Provides logarithmic band analysis with peak hold and auto-gain,
//! energy-based beat and BPM detection, per-channel level metering,
//! and a waveform ring buffer for oscilloscope-style display.

mod bpm;
mod spectrum;
mod volume;
mod waveform;

pub use bpm::{
    estimate_bpm, BeatDetector, BEAT_DEBOUNCE, DEFAULT_SENSITIVITY, FLASH_FRAMES,
    MAX_SENSITIVITY, MIN_SENSITIVITY,
};
pub use spectrum::{
    band_center_hz, normalization_gain, BandProcessor, FFT_SIZE, MIN_BANDS, PEAK_HOLD_FRAMES,
};
pub use volume::{ChannelLevels, VolumeAnalyzer};
pub use waveform::{WaveformRing, WAVEFORM_LEN};

pub use rustfft::num_complex::Complex;
