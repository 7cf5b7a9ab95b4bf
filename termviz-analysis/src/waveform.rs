//! Waveform ring buffer for oscilloscope-style display

/// Number of mono samples kept for display
pub const WAVEFORM_LEN: usize = 512;

/// Fixed-size ring of the most recent mono samples
#[derive(Debug, Clone)]
pub struct WaveformRing {
    samples: Vec<f32>,
    /// Index the next sample will be written to (oldest sample)
    cursor: usize,
}

impl Default for WaveformRing {
    fn default() -> Self {
        Self::new(WAVEFORM_LEN)
    }
}

impl WaveformRing {
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len.max(1)],
            cursor: 0,
        }
    }

    pub fn push(&mut self, sample: f32) {
        self.samples[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % self.samples.len();
    }

    pub fn extend(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    /// Raw ring contents in storage order
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample `index` positions after the oldest one (0 = oldest)
    pub fn chronological(&self, index: usize) -> f32 {
        self.samples[(self.cursor + index) % self.samples.len()]
    }
}
