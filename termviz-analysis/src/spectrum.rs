//! FFT band processor for real-time visualization

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// FFT length used by the analysis engine
pub const FFT_SIZE: usize = 8192;

/// Smallest band count the processor will allocate
pub const MIN_BANDS: usize = 8;

/// Frames a band peak is held before it starts to decay
pub const PEAK_HOLD_FRAMES: u32 = 20;

/// Lower edge of the band layout (Hz)
const MIN_FREQ_HZ: f32 = 20.0;
/// Upper edge of the band layout (Hz)
const MAX_FREQ_HZ: f32 = 20000.0;

/// Weight of the previous value in exponential smoothing
const SMOOTHING: f32 = 0.7;
/// Geometric peak decay per frame once the hold has expired (8%)
const PEAK_DECAY: f32 = 0.92;
/// Peaks below this snap to zero; magnitudes below it never raise a peak
const PEAK_FLOOR: f32 = 1e-4;

/// Weight of the previous auto-gain target
const AUTO_GAIN_RETAIN: f32 = 0.95;
/// Upper bound on the normalization reciprocal
const MAX_GAIN: f32 = 1000.0;

/// Logarithmic band analyzer with smoothing, peak hold, and auto-gain
///
/// Takes the latest `FFT_SIZE` mono samples as a complex buffer, windows
/// and transforms it in place, then reduces the positive half-spectrum
/// to `band_count` log-spaced bands between 20 Hz and 20 kHz.
pub struct BandProcessor {
    sample_rate: u32,
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Bin range `[start, end)` per band
    bin_ranges: Vec<(usize, usize)>,
    raw: Vec<f32>,
    smoothed: Vec<f32>,
    peak_hold: Vec<f32>,
    hold_frames: Vec<u32>,
    /// Largest smoothed magnitude ever seen
    max_seen: f32,
    gain_target: f32,
}

impl BandProcessor {
    /// Create a processor for the given sample rate and band count
    pub fn new(sample_rate: u32, band_count: usize) -> Self {
        Self::with_fft_size(sample_rate, band_count, FFT_SIZE)
    }

    /// Create a processor with a custom FFT length (must be a power of two)
    pub fn with_fft_size(sample_rate: u32, band_count: usize, fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Hamming window
        let denom = (fft_size.max(2) - 1) as f32;
        let window: Vec<f32> = (0..fft_size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / denom).cos())
            .collect();

        let mut processor = Self {
            sample_rate,
            fft_size,
            fft,
            window,
            bin_ranges: Vec::new(),
            raw: Vec::new(),
            smoothed: Vec::new(),
            peak_hold: Vec::new(),
            hold_frames: Vec::new(),
            max_seen: 0.0,
            gain_target: 0.0,
        };
        processor.resize(band_count);
        processor
    }

    /// FFT length this processor expects
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bands currently allocated
    pub fn band_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Reallocate all per-band arrays for a new band count
    ///
    /// Every array is replaced with zeroed content, even when the count is
    /// unchanged. Counts below `MIN_BANDS` are raised to it.
    pub fn resize(&mut self, band_count: usize) {
        let bands = band_count.max(MIN_BANDS);
        self.bin_ranges = band_bin_ranges(self.sample_rate, self.fft_size, bands);
        self.raw = vec![0.0; bands];
        self.smoothed = vec![0.0; bands];
        self.peak_hold = vec![0.0; bands];
        self.hold_frames = vec![0; bands];
        tracing::debug!(bands, "band arrays reallocated");
    }

    /// Window, transform, and reduce one buffer of samples
    ///
    /// `buffer` must hold exactly `fft_size` samples; it is overwritten
    /// with the spectrum. Buffers of any other length are ignored.
    pub fn process(&mut self, buffer: &mut [Complex<f32>]) {
        if buffer.len() != self.fft_size {
            return;
        }

        for (sample, w) in buffer.iter_mut().zip(&self.window) {
            *sample *= *w;
        }

        self.fft.process(buffer);

        let nyquist = self.fft_size / 2;
        for (raw, &(start, end)) in self.raw.iter_mut().zip(&self.bin_ranges) {
            let end = end.min(nyquist);
            *raw = if start < end {
                let sum: f32 = buffer[start..end].iter().map(|c| c.norm()).sum();
                sum / (end - start) as f32
            } else {
                0.0
            };
        }

        let raw = std::mem::take(&mut self.raw);
        self.apply_frame(&raw);
        self.raw = raw;
    }

    /// Smoothing, peak hold, and auto-gain for one frame of raw band values
    fn apply_frame(&mut self, raw: &[f32]) {
        for (i, &value) in raw.iter().enumerate().take(self.smoothed.len()) {
            let smoothed = self.smoothed[i] * SMOOTHING + value * (1.0 - SMOOTHING);
            self.smoothed[i] = smoothed;

            if smoothed > self.peak_hold[i] && smoothed > PEAK_FLOOR {
                self.peak_hold[i] = smoothed;
                self.hold_frames[i] = 0;
            } else if self.hold_frames[i] < PEAK_HOLD_FRAMES {
                self.hold_frames[i] += 1;
            } else {
                let decayed = self.peak_hold[i] * PEAK_DECAY;
                self.peak_hold[i] = if decayed < PEAK_FLOOR { 0.0 } else { decayed };
            }
        }

        let frame_max = self.smoothed.iter().copied().fold(0.0f32, f32::max);
        self.max_seen = self.max_seen.max(frame_max);
        self.gain_target = self.gain_target * AUTO_GAIN_RETAIN + self.max_seen * (1.0 - AUTO_GAIN_RETAIN);
    }

    /// Smoothed magnitude per band
    pub fn smoothed(&self) -> &[f32] {
        &self.smoothed
    }

    /// Peak-hold magnitude per band
    pub fn peak_hold(&self) -> &[f32] {
        &self.peak_hold
    }

    /// Low-passed running maximum used as the normalization divisor
    pub fn auto_gain_target(&self) -> f32 {
        self.gain_target
    }

    /// Reciprocal of the auto-gain target, capped at `MAX_GAIN`
    pub fn gain(&self) -> f32 {
        normalization_gain(self.gain_target)
    }

    /// Frequency range `(low, high)` in Hz covered by a band
    pub fn band_frequencies(&self, band: usize) -> Option<(f32, f32)> {
        let bands = self.band_count();
        (band < bands).then(|| (band_edge(band, bands), band_edge(band + 1, bands)))
    }
}

/// Reciprocal of an auto-gain target, capped so near-silence cannot run away
pub fn normalization_gain(target: f32) -> f32 {
    if target <= 1.0 / MAX_GAIN {
        MAX_GAIN
    } else {
        (1.0 / target).min(MAX_GAIN)
    }
}

/// Geometric center frequency of `band` in a layout of `bands` bands
pub fn band_center_hz(band: usize, bands: usize) -> f32 {
    let bands = bands.max(1);
    (band_edge(band, bands) * band_edge(band + 1, bands)).sqrt()
}

/// Edge `index` of a layout with `bands` log-spaced bands
fn band_edge(index: usize, bands: usize) -> f32 {
    let log_min = MIN_FREQ_HZ.log10();
    let step = (MAX_FREQ_HZ.log10() - log_min) / bands as f32;
    10f32.powf(log_min + index as f32 * step)
}

/// FFT bin range `[start, end)` for every band
fn band_bin_ranges(sample_rate: u32, fft_size: usize, bands: usize) -> Vec<(usize, usize)> {
    let bin_width = sample_rate.max(1) as f32 / fft_size as f32;
    (0..bands)
        .map(|i| {
            let start = (band_edge(i, bands) / bin_width) as usize;
            let end = (band_edge(i + 1, bands) / bin_width) as usize;
            (start, end)
        })
        .collect()
}
