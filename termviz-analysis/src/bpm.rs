//! Beat detection and BPM estimation from short-term energy

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Energy values kept for the rolling average
const ENERGY_HISTORY: usize = 20;
/// Absolute energy floor below which no beat fires
const MIN_ENERGY: f32 = 0.01;
/// Minimum spacing between beats (caps detection at 240 BPM)
pub const BEAT_DEBOUNCE: Duration = Duration::from_millis(250);
/// Beat timestamps older than this are dropped
const BEAT_WINDOW: Duration = Duration::from_secs(8);
/// Most recent beats considered for the tempo estimate
const BPM_BEATS: usize = 9;
/// Accepted inter-beat interval range in milliseconds
const MIN_INTERVAL_MS: f32 = 250.0;
const MAX_INTERVAL_MS: f32 = 2000.0;
/// Weight of the previous BPM estimate
const BPM_RETAIN: f32 = 0.8;

/// Render cycles a beat flash lasts
pub const FLASH_FRAMES: u8 = 3;

pub const DEFAULT_SENSITIVITY: f32 = 1.3;
pub const MIN_SENSITIVITY: f32 = 0.5;
pub const MAX_SENSITIVITY: f32 = 3.0;

/// Energy-spike beat detector
///
/// Fed one RMS energy value per audio delivery. A beat fires when the
/// energy exceeds the rolling average of the previous deliveries times
/// the sensitivity, clears an absolute floor, and is at least
/// `BEAT_DEBOUNCE` after the previous beat.
pub struct BeatDetector {
    energy_history: VecDeque<f32>,
    /// Beat times within the last `BEAT_WINDOW`
    beat_times: VecDeque<Instant>,
    last_beat: Option<Instant>,
    beat_count: u64,
    flash_frames: u8,
    bpm: Option<f32>,
    sensitivity: f32,
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatDetector {
    pub fn new() -> Self {
        Self {
            energy_history: VecDeque::with_capacity(ENERGY_HISTORY),
            beat_times: VecDeque::new(),
            last_beat: None,
            beat_count: 0,
            flash_frames: 0,
            bpm: None,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }

    /// RMS of a block of samples (0 for an empty block)
    pub fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
        energy.sqrt()
    }

    /// Feed one instant energy value; returns true if a beat fired
    pub fn process(&mut self, energy: f32, now: Instant) -> bool {
        if self.energy_history.len() == ENERGY_HISTORY {
            self.energy_history.pop_front();
        }
        self.energy_history.push_back(energy);

        // Average over everything but the newest entry
        let prior = self.energy_history.len() - 1;
        if prior == 0 {
            return false;
        }
        let avg = self.energy_history.iter().take(prior).sum::<f32>() / prior as f32;

        let debounced = self
            .last_beat
            .map_or(true, |last| now.saturating_duration_since(last) > BEAT_DEBOUNCE);

        if energy > avg * self.sensitivity && energy > MIN_ENERGY && debounced {
            self.register_beat(now);
            true
        } else {
            false
        }
    }

    fn register_beat(&mut self, now: Instant) {
        self.last_beat = Some(now);
        self.beat_count += 1;
        self.flash_frames = FLASH_FRAMES;

        self.beat_times.push_back(now);
        while let Some(&first) = self.beat_times.front() {
            if now.saturating_duration_since(first) > BEAT_WINDOW {
                self.beat_times.pop_front();
            } else {
                break;
            }
        }

        if let Some(estimate) = estimate_bpm(self.beat_times.make_contiguous()) {
            self.bpm = Some(match self.bpm {
                Some(previous) => previous * BPM_RETAIN + estimate * (1.0 - BPM_RETAIN),
                None => estimate,
            });
        }
    }

    /// Advance the beat flash by one render cycle
    pub fn tick_flash(&mut self) {
        self.flash_frames = self.flash_frames.saturating_sub(1);
    }

    /// Whether a beat flash is active
    pub fn is_flashing(&self) -> bool {
        self.flash_frames > 0
    }

    /// Monotonic count of detected beats
    pub fn beat_count(&self) -> u64 {
        self.beat_count
    }

    /// Smoothed tempo estimate, if enough beats have been seen
    pub fn bpm(&self) -> Option<f32> {
        self.bpm
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Set the spike threshold multiplier, clamped to the supported range
    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
    }
}

/// Tempo from the most recent beat timestamps
///
/// Uses up to the last nine beats. Intervals outside 250-2000 ms are
/// discarded before averaging; returns `None` if none remain.
pub fn estimate_bpm(beats: &[Instant]) -> Option<f32> {
    let recent = &beats[beats.len().saturating_sub(BPM_BEATS)..];

    let intervals: Vec<f32> = recent
        .windows(2)
        .map(|pair| pair[1].saturating_duration_since(pair[0]).as_secs_f32() * 1000.0)
        .filter(|ms| (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(ms))
        .collect();

    if intervals.is_empty() {
        return None;
    }

    let avg_ms = intervals.iter().sum::<f32>() / intervals.len() as f32;
    Some(60000.0 / avg_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_spike_after_steady_energy_fires_once() {
        let mut detector = BeatDetector::new();
        detector.set_sensitivity(1.3);
        let start = Instant::now();

        let mut beats = 0;
        for i in 0..15 {
            if detector.process(0.02, start + ms(i * 23)) {
                beats += 1;
            }
        }
        if detector.process(0.2, start + ms(15 * 23)) {
            beats += 1;
        }

        assert_eq!(beats, 1);
        assert_eq!(detector.beat_count(), 1);
        assert!(detector.is_flashing());
    }

    #[test]
    fn test_debounce_suppresses_close_spikes() {
        let mut detector = BeatDetector::new();
        let start = Instant::now();
        for i in 0..10 {
            detector.process(0.02, start + ms(i * 10));
        }

        assert!(detector.process(0.5, start + ms(100)));
        for i in 0..5 {
            detector.process(0.02, start + ms(110 + i * 10));
        }
        // Satisfies the threshold but only 200 ms after the first beat
        assert!(!detector.process(0.9, start + ms(300)));
        assert_eq!(detector.beat_count(), 1);
    }

    #[test]
    fn test_silence_never_beats() {
        let mut detector = BeatDetector::new();
        let start = Instant::now();
        for i in 0..10 {
            detector.process(0.0001, start + ms(i * 300));
        }
        // Relative spike that stays under the absolute floor
        assert!(!detector.process(0.005, start + ms(3300)));
        assert_eq!(detector.beat_count(), 0);
    }

    #[test]
    fn test_first_value_never_beats() {
        let mut detector = BeatDetector::new();
        assert!(!detector.process(1.0, Instant::now()));
    }

    #[test]
    fn test_estimate_excludes_outlier_interval() {
        let start = Instant::now();
        // 500 ms spacing with a 10 ms double-trigger in the middle
        let beats = vec![
            start,
            start + ms(500),
            start + ms(1000),
            start + ms(1010),
            start + ms(1510),
            start + ms(2010),
        ];
        let bpm = estimate_bpm(&beats).unwrap();
        // Only the 10 ms interval is dropped, leaving four 500 ms intervals
        assert!((bpm - 120.0).abs() < 0.1, "bpm {}", bpm);
    }

    #[test]
    fn test_estimate_rejects_all_out_of_range() {
        let start = Instant::now();
        let beats = vec![start, start + ms(10), start + ms(3000)];
        assert!(estimate_bpm(&beats).is_none());
        assert!(estimate_bpm(&[]).is_none());
        assert!(estimate_bpm(&[start]).is_none());
    }

    #[test]
    fn test_estimate_uses_last_nine_beats() {
        let start = Instant::now();
        // Early beats at 1000 ms spacing, last nine at 500 ms
        let mut beats: Vec<Instant> = (0..5).map(|i| start + ms(i * 1000)).collect();
        let base = start + ms(5000);
        beats.extend((0..9).map(|i| base + ms(i * 500)));
        let bpm = estimate_bpm(&beats).unwrap();
        assert!((bpm - 120.0).abs() < 0.1);
    }

    #[test]
    fn test_bpm_is_smoothed() {
        let mut detector = BeatDetector::new();
        let start = Instant::now();
        let mut t = 0u64;
        // Quiet bed with a spike every 500 ms
        for beat in 0..6 {
            for _ in 0..10 {
                detector.process(0.02, start + ms(t));
                t += 10;
            }
            let spike_at = beat * 500 + 200;
            t = t.max(spike_at);
            detector.process(0.5, start + ms(spike_at));
            t = spike_at + 300;
        }
        let bpm = detector.bpm().unwrap();
        assert!((bpm - 120.0).abs() < 1.0, "bpm {}", bpm);
    }

    #[test]
    fn test_flash_counts_down() {
        let mut detector = BeatDetector::new();
        let start = Instant::now();
        detector.process(0.02, start);
        assert!(detector.process(0.5, start + ms(20)));
        for _ in 0..FLASH_FRAMES {
            assert!(detector.is_flashing());
            detector.tick_flash();
        }
        assert!(!detector.is_flashing());
    }

    #[test]
    fn test_sensitivity_clamped() {
        let mut detector = BeatDetector::new();
        detector.set_sensitivity(10.0);
        assert_eq!(detector.sensitivity(), MAX_SENSITIVITY);
        detector.set_sensitivity(0.0);
        assert_eq!(detector.sensitivity(), MIN_SENSITIVITY);
    }
}
