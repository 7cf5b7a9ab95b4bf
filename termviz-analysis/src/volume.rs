//! Per-channel level metering with peak hold

/// Weight of the previous level in EWMA smoothing
const LEVEL_RETAIN: f32 = 0.7;
/// Simple peak decay per frame
const PEAK_DECAY: f32 = 0.95;
/// Frames the meter peak is held before it falls
const HOLD_FRAMES: u16 = 30;
/// Linear meter-peak fall per frame once the hold expires
const HOLD_DECAY_STEP: f32 = 0.02;
/// Level sum below which balance reads as centered
const BALANCE_EPSILON: f32 = 1e-6;

/// Read-only levels for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelLevels {
    /// Smoothed level (0.0 - 1.0)
    pub level: f32,
    /// Simple peak: snaps up, decays geometrically
    pub peak: f32,
    /// Meter-style peak hold: snaps up, holds, then falls linearly
    pub peak_hold: f32,
}

#[derive(Debug, Clone, Default)]
struct ChannelMeter {
    levels: ChannelLevels,
    hold_frames: u16,
}

impl ChannelMeter {
    fn update(&mut self, max_abs: f32) {
        let sample = max_abs.abs().min(1.0);
        let levels = &mut self.levels;

        levels.level = levels.level * LEVEL_RETAIN + sample * (1.0 - LEVEL_RETAIN);

        if sample > levels.peak {
            levels.peak = sample;
        } else {
            levels.peak *= PEAK_DECAY;
        }

        if sample >= levels.peak_hold {
            levels.peak_hold = sample;
            self.hold_frames = 0;
        } else if self.hold_frames < HOLD_FRAMES {
            self.hold_frames += 1;
        } else {
            levels.peak_hold = (levels.peak_hold - HOLD_DECAY_STEP).max(0.0);
        }
    }
}

/// Tracks left, right, and mono levels for meter-style display
#[derive(Debug, Clone, Default)]
pub struct VolumeAnalyzer {
    left: ChannelMeter,
    right: ChannelMeter,
    mono: ChannelMeter,
}

impl VolumeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from the maximum absolute sample of each channel in one delivery
    pub fn process(&mut self, max_left: f32, max_right: f32, max_mono: f32) {
        self.left.update(max_left);
        self.right.update(max_right);
        self.mono.update(max_mono);
    }

    pub fn left(&self) -> ChannelLevels {
        self.left.levels
    }

    pub fn right(&self) -> ChannelLevels {
        self.right.levels
    }

    pub fn mono(&self) -> ChannelLevels {
        self.mono.levels
    }

    /// Overall volume (0.0 - 1.0)
    pub fn volume(&self) -> f32 {
        self.mono.levels.level.clamp(0.0, 1.0)
    }

    /// Stereo balance from -1.0 (left) to 1.0 (right)
    pub fn balance(&self) -> f32 {
        let left = self.left.levels.level;
        let right = self.right.levels.level;
        let sum = left + right;
        if sum < BALANCE_EPSILON {
            0.0
        } else {
            (right - left) / sum
        }
    }
}
