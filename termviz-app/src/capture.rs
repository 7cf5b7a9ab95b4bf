//! Audio capture via cpal - feeds deliveries into the analysis engine

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::Receiver;
use tracing::{error, info, warn};

use termviz_audio::{AnalysisEngine, AudioFormat, AudioFrame, EngineCommand, Viewport};

use crate::stage::{Shared, TerminalWriter};

/// Print every input device with its default configuration
pub fn list_input_devices() -> Result<()> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    for (index, device) in host.input_devices()?.enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());
        let marker = if Some(&name) == default_name.as_ref() { "*" } else { " " };
        match device.default_input_config() {
            Ok(config) => println!(
                "{}{:>2}: {} ({} Hz, {} channels, {:?})",
                marker,
                index,
                name,
                config.sample_rate().0,
                config.channels(),
                config.sample_format()
            ),
            Err(_) => println!("{}{:>2}: {} (config query failed)", marker, index, name),
        }
    }
    Ok(())
}

/// Input device whose name contains `filter` (case-insensitive), or the
/// host default
pub fn select_device(filter: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();
    let Some(filter) = filter else {
        return host
            .default_input_device()
            .ok_or_else(|| anyhow!("no default input device available"));
    };

    let needle = filter.to_lowercase();
    host.input_devices()?
        .find(|d| d.name().is_ok_and(|n| n.to_lowercase().contains(&needle)))
        .ok_or_else(|| anyhow!("no input device matching {:?}", filter))
}

/// Receives capture deliveries on the audio thread
struct CaptureSink {
    engine: AnalysisEngine,
    shared: Arc<Shared>,
    writer: TerminalWriter,
    format: AudioFormat,
    /// A delivery was already rejected; report once
    rejected: bool,
}

impl CaptureSink {
    fn deliver(&mut self, data: &[u8]) {
        let frame = AudioFrame::new(data, data.len(), self.format);
        match self.engine.ingest(&frame, Instant::now()) {
            Ok(true) => {
                // Never block the audio thread on a busy terminal
                if let Some(mut stage) = self.shared.render.try_lock() {
                    stage.render(self.engine.snapshot(), &mut self.writer);
                    if let Err(e) = self.writer.flush() {
                        warn!(error = %e, "terminal flush failed");
                    }
                }
            }
            Ok(false) => {}
            Err(e) => {
                if !self.rejected {
                    error!(error = %e, "capture delivery rejected");
                    self.rejected = true;
                }
            }
        }
    }
}

fn build_stream<T>(device: &Device, config: &StreamConfig, mut sink: CaptureSink) -> Result<Stream>
where
    T: SizedSample + bytemuck::Pod,
{
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            sink.deliver(bytemuck::cast_slice(data));
        },
        |err| error!("audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

/// Open a capture stream on `device` with a fresh analysis engine
///
/// The engine lives on the audio thread; `commands` is its only inbound
/// channel. The returned stream is paused; call `play` to start deliveries.
pub fn open_stream(
    device: &Device,
    viewport: Viewport,
    sensitivity: f32,
    commands: Receiver<EngineCommand>,
    shared: Arc<Shared>,
) -> Result<Stream> {
    let supported = device
        .default_input_config()
        .context("failed to query input config")?;
    let config: StreamConfig = supported.config();
    let sample_format = supported.sample_format();

    let bits = match sample_format {
        SampleFormat::F32 => 32,
        SampleFormat::I16 => 16,
        other => return Err(anyhow!("unsupported sample format: {:?}", other)),
    };
    let format = AudioFormat::new(config.sample_rate.0, bits, config.channels);
    info!(
        device = %device.name().unwrap_or_default(),
        sample_rate = format.sample_rate,
        channels = format.channels,
        bits,
        "opening capture stream"
    );

    let mut engine = AnalysisEngine::new(format.sample_rate, viewport).with_commands(commands);
    engine.handle_command(EngineCommand::SetSensitivity(sensitivity));

    let sink = CaptureSink {
        engine,
        shared,
        writer: TerminalWriter::new(),
        format,
        rejected: false,
    };
    match sample_format {
        SampleFormat::I16 => build_stream::<i16>(device, &config, sink),
        _ => build_stream::<f32>(device, &config, sink),
    }
}
