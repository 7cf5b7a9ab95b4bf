//! Analysis engine - orchestrates band, beat, and level analysis

use crate::frame::{AudioFrame, ChannelBlock, FrameError};
use crate::snapshot::{AnalysisSnapshot, Viewport};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::{Duration, Instant};
use termviz_analysis::{
    BandProcessor, BeatDetector, Complex, VolumeAnalyzer, WaveformRing, FFT_SIZE, MIN_BANDS,
};

/// Minimum spacing between snapshot publishes (~20 fps)
pub const PUBLISH_INTERVAL: Duration = Duration::from_millis(50);

/// Capacity of the engine command channel
const COMMAND_CAPACITY: usize = 64;

/// Commands sent to the engine from outside the audio context
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SetSensitivity(f32),
    AdjustSensitivity(f32),
    SetViewport(Viewport),
}

/// Band count for a display width: one band per two columns
pub fn bands_for_width(width: u16) -> usize {
    (width as usize / 2).max(MIN_BANDS)
}

/// Owns all analysis state for one capture stream
///
/// Mutated only from the audio-delivery context. Other threads talk to it
/// through the command channel, which is drained at the start of every
/// delivery.
pub struct AnalysisEngine {
    sample_rate: u32,
    commands: Option<Receiver<EngineCommand>>,
    block: ChannelBlock,
    /// Latest `FFT_SIZE` mono samples
    history: WaveformRing,
    fft_buffer: Vec<Complex<f32>>,
    bands: BandProcessor,
    beats: BeatDetector,
    volume: VolumeAnalyzer,
    waveform: WaveformRing,
    viewport: Viewport,
    beat_pending: bool,
    last_publish: Option<Instant>,
    snapshot: AnalysisSnapshot,
}

impl AnalysisEngine {
    /// Create a bounded command channel for an engine
    pub fn create_channel() -> (Sender<EngineCommand>, Receiver<EngineCommand>) {
        bounded(COMMAND_CAPACITY)
    }

    pub fn new(sample_rate: u32, viewport: Viewport) -> Self {
        let band_count = bands_for_width(viewport.width);
        let mut snapshot = AnalysisSnapshot::with_bands(band_count);
        snapshot.viewport = viewport;

        Self {
            sample_rate,
            commands: None,
            block: ChannelBlock::default(),
            history: WaveformRing::new(FFT_SIZE),
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            bands: BandProcessor::new(sample_rate, band_count),
            beats: BeatDetector::new(),
            volume: VolumeAnalyzer::new(),
            waveform: WaveformRing::default(),
            viewport,
            beat_pending: false,
            last_publish: None,
            snapshot,
        }
    }

    /// Attach the receiving end of a command channel
    pub fn with_commands(mut self, commands: Receiver<EngineCommand>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::SetSensitivity(value) => self.beats.set_sensitivity(value),
            EngineCommand::AdjustSensitivity(delta) => {
                let value = self.beats.sensitivity() + delta;
                self.beats.set_sensitivity(value);
            }
            EngineCommand::SetViewport(viewport) => self.set_viewport(viewport),
        }
    }

    fn drain_commands(&mut self) {
        let Some(commands) = self.commands.take() else {
            return;
        };
        while let Ok(command) = commands.try_recv() {
            self.handle_command(command);
        }
        self.commands = Some(commands);
    }

    /// Update display geometry; a width change reallocates the band arrays
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.width != self.viewport.width {
            let bands = bands_for_width(viewport.width);
            tracing::info!(width = viewport.width, bands, "display width changed");
            self.bands.resize(bands);
        }
        self.viewport = viewport;
        self.snapshot.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Feed one capture delivery
    ///
    /// Returns `Ok(true)` when a new snapshot was published and a render
    /// pass should follow.
    pub fn ingest(&mut self, frame: &AudioFrame<'_>, now: Instant) -> Result<bool, FrameError> {
        self.drain_commands();

        if frame.format.sample_rate != self.sample_rate && frame.format.sample_rate > 0 {
            tracing::info!(
                from = self.sample_rate,
                to = frame.format.sample_rate,
                "sample rate changed"
            );
            self.sample_rate = frame.format.sample_rate;
            self.bands = BandProcessor::new(self.sample_rate, self.bands.band_count());
        }

        self.block.demux(frame)?;
        if self.block.mono.is_empty() {
            return Ok(false);
        }

        let (max_left, max_right, max_mono) = self.block.max_abs();
        self.volume.process(max_left, max_right, max_mono);

        let energy = BeatDetector::rms(&self.block.mono);
        if self.beats.process(energy, now) {
            self.beat_pending = true;
        }

        self.history.extend(&self.block.mono);
        self.waveform.extend(&self.block.mono);

        let due = self
            .last_publish
            .map_or(true, |last| now.saturating_duration_since(last) >= PUBLISH_INTERVAL);
        if due {
            self.publish(now);
        }
        Ok(due)
    }

    /// Run the band analysis and refill the snapshot
    pub fn publish(&mut self, now: Instant) {
        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            *slot = Complex::new(self.history.chronological(i), 0.0);
        }
        self.bands.process(&mut self.fft_buffer);

        let snapshot = &mut self.snapshot;
        snapshot.volume = self.volume.volume();
        snapshot.left = self.volume.left();
        snapshot.right = self.volume.right();
        snapshot.balance = self.volume.balance();
        snapshot.bpm = self.beats.bpm();
        snapshot.beat_sensitivity = self.beats.sensitivity();
        snapshot.beat_fired = std::mem::take(&mut self.beat_pending);
        snapshot.beat_flash = self.beats.is_flashing();
        snapshot.beat_count = self.beats.beat_count();
        snapshot.num_bands = self.bands.band_count();
        snapshot.smoothed.clear();
        snapshot.smoothed.extend_from_slice(self.bands.smoothed());
        snapshot.peak_hold.clear();
        snapshot.peak_hold.extend_from_slice(self.bands.peak_hold());
        snapshot.auto_gain_target = self.bands.auto_gain_target();
        snapshot.waveform.clear();
        snapshot.waveform.extend_from_slice(self.waveform.samples());
        snapshot.waveform_cursor = self.waveform.cursor();
        snapshot.viewport = self.viewport;

        self.beats.tick_flash();
        self.last_publish = Some(now);
    }

    /// Most recently published snapshot
    pub fn snapshot(&self) -> &AnalysisSnapshot {
        &self.snapshot
    }
}
