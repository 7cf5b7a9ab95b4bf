//! Point-in-time analysis state consumed by renderers

use termviz_analysis::{normalization_gain, ChannelLevels, DEFAULT_SENSITIVITY};

/// Display geometry the visualizer renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
    /// First terminal row owned by the visualizer
    pub start_row: u16,
    /// Header hidden, visualizer owns the whole terminal
    pub full_screen: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 80,
            height: 23,
            start_row: 1,
            full_screen: false,
        }
    }
}

impl Viewport {
    /// Viewport for a terminal of the given size, reserving a header row
    /// unless full-screen
    pub fn for_terminal(cols: u16, rows: u16, full_screen: bool) -> Self {
        let start_row = if full_screen { 0 } else { 1 };
        Self {
            width: cols,
            height: rows.saturating_sub(start_row),
            start_row,
            full_screen,
        }
    }
}

/// Analysis results published once per render cycle
///
/// Re-filled in place by the engine on every publish; renderers must not
/// keep references to it across frames. `smoothed` and `peak_hold` always
/// hold exactly `num_bands` entries.
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    /// Overall volume (0.0 - 1.0)
    pub volume: f32,
    pub left: ChannelLevels,
    pub right: ChannelLevels,
    /// -1.0 (left) to 1.0 (right)
    pub balance: f32,
    pub bpm: Option<f32>,
    pub beat_sensitivity: f32,
    /// A beat fired since the previous publish
    pub beat_fired: bool,
    /// Beat flash window is active
    pub beat_flash: bool,
    /// Monotonic beat counter
    pub beat_count: u64,
    pub num_bands: usize,
    pub smoothed: Vec<f32>,
    pub peak_hold: Vec<f32>,
    pub auto_gain_target: f32,
    /// Waveform ring contents in storage order
    pub waveform: Vec<f32>,
    /// Index of the oldest waveform sample
    pub waveform_cursor: usize,
    pub viewport: Viewport,
}

impl Default for AnalysisSnapshot {
    fn default() -> Self {
        Self::with_bands(termviz_analysis::MIN_BANDS)
    }
}

impl AnalysisSnapshot {
    /// Silent snapshot with zeroed band arrays
    pub fn with_bands(num_bands: usize) -> Self {
        Self {
            volume: 0.0,
            left: ChannelLevels::default(),
            right: ChannelLevels::default(),
            balance: 0.0,
            bpm: None,
            beat_sensitivity: DEFAULT_SENSITIVITY,
            beat_fired: false,
            beat_flash: false,
            beat_count: 0,
            num_bands,
            smoothed: vec![0.0; num_bands],
            peak_hold: vec![0.0; num_bands],
            auto_gain_target: 0.0,
            waveform: Vec::new(),
            waveform_cursor: 0,
            viewport: Viewport::default(),
        }
    }

    /// Normalization multiplier derived from the auto-gain target
    pub fn gain(&self) -> f32 {
        normalization_gain(self.auto_gain_target)
    }

    /// Smoothed magnitude of a band as a 0-1 fraction
    pub fn level(&self, band: usize) -> f32 {
        self.smoothed
            .get(band)
            .map_or(0.0, |m| (m * self.gain()).clamp(0.0, 1.0))
    }

    /// Peak-hold magnitude of a band as a 0-1 fraction
    pub fn peak_level(&self, band: usize) -> f32 {
        self.peak_hold
            .get(band)
            .map_or(0.0, |m| (m * self.gain()).clamp(0.0, 1.0))
    }

    /// Mean normalized level over a fractional slice of the bands
    ///
    /// `from` and `to` are positions in 0.0-1.0 across the band list.
    pub fn range_level(&self, from: f32, to: f32) -> f32 {
        let n = self.num_bands;
        let start = ((from.clamp(0.0, 1.0) * n as f32) as usize).min(n);
        let end = ((to.clamp(0.0, 1.0) * n as f32).ceil() as usize).clamp(start, n);
        if start == end {
            return 0.0;
        }
        (start..end).map(|b| self.level(b)).sum::<f32>() / (end - start) as f32
    }

    pub fn bass(&self) -> f32 {
        self.range_level(0.0, 0.2)
    }

    pub fn treble(&self) -> f32 {
        self.range_level(0.6, 1.0)
    }

    /// Speed multiplier for animated layers: doubled during a beat flash
    pub fn speed_burst(&self) -> f32 {
        if self.beat_flash {
            2.0
        } else {
            1.0
        }
    }

    /// Waveform sample `index` positions after the oldest one
    pub fn waveform_at(&self, index: usize) -> f32 {
        if self.waveform.is_empty() {
            return 0.0;
        }
        self.waveform[(self.waveform_cursor + index) % self.waveform.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_reserves_header_row() {
        let vp = Viewport::for_terminal(80, 24, false);
        assert_eq!((vp.start_row, vp.height), (1, 23));
        let vp = Viewport::for_terminal(80, 24, true);
        assert_eq!((vp.start_row, vp.height), (0, 24));
    }

    #[test]
    fn test_levels_are_normalized_and_clamped() {
        let mut snapshot = AnalysisSnapshot::with_bands(8);
        snapshot.auto_gain_target = 2.0;
        snapshot.smoothed[0] = 1.0;
        snapshot.smoothed[1] = 10.0;
        assert!((snapshot.level(0) - 0.5).abs() < 1e-6);
        assert_eq!(snapshot.level(1), 1.0);
        assert_eq!(snapshot.level(99), 0.0);
    }

    #[test]
    fn test_range_level_handles_empty_ranges() {
        let snapshot = AnalysisSnapshot::with_bands(8);
        assert_eq!(snapshot.range_level(0.5, 0.5), 0.0);
        assert_eq!(snapshot.bass(), 0.0);
    }

    #[test]
    fn test_speed_burst() {
        let mut snapshot = AnalysisSnapshot::default();
        assert_eq!(snapshot.speed_burst(), 1.0);
        snapshot.beat_flash = true;
        assert_eq!(snapshot.speed_burst(), 2.0);
    }
}
