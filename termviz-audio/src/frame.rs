//! PCM delivery format and channel demultiplexing

use thiserror::Error;

/// Errors that can occur while decoding a delivery
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Unsupported sample width: {0} bits")]
    UnsupportedBitDepth(u16),
    #[error("Stream reports zero channels")]
    NoChannels,
}

/// Format descriptor supplied by the capture collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    /// 16 = signed integer PCM, 32 = IEEE float
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample,
            channels,
        }
    }

    /// Bytes occupied by one interleaved frame (all channels)
    pub fn frame_bytes(&self) -> usize {
        (self.bits_per_sample as usize / 8) * self.channels as usize
    }
}

/// One raw delivery from the capture callback
///
/// Samples are interleaved in native byte order, as produced by casting
/// the callback's sample slice to bytes.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame<'a> {
    pub data: &'a [u8],
    /// Valid bytes in `data`; may be less than its length
    pub bytes_recorded: usize,
    pub format: AudioFormat,
}

impl<'a> AudioFrame<'a> {
    pub fn new(data: &'a [u8], bytes_recorded: usize, format: AudioFormat) -> Self {
        Self {
            data,
            bytes_recorded,
            format,
        }
    }

    /// Wrap interleaved float samples as a 32-bit delivery
    pub fn from_f32(samples: &'a [f32], sample_rate: u32, channels: u16) -> Self {
        let data: &[u8] = bytemuck::cast_slice(samples);
        Self::new(data, data.len(), AudioFormat::new(sample_rate, 32, channels))
    }
}

/// Per-channel sample blocks decoded from one delivery
///
/// Buffers are reused between deliveries to avoid allocating in the
/// capture callback.
#[derive(Debug, Default)]
pub struct ChannelBlock {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub mono: Vec<f32>,
}

impl ChannelBlock {
    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
        self.mono.clear();
    }

    /// Largest absolute sample per channel: (left, right, mono)
    pub fn max_abs(&self) -> (f32, f32, f32) {
        let max = |s: &[f32]| s.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        (max(&self.left), max(&self.right), max(&self.mono))
    }

    /// Decode an interleaved delivery into left/right/mono blocks
    ///
    /// Channel 0 is left and channel 1 right; further channels are
    /// ignored. Mono input feeds both sides. Trailing partial frames are
    /// dropped.
    pub fn demux(&mut self, frame: &AudioFrame<'_>) -> Result<(), FrameError> {
        self.clear();

        let format = frame.format;
        if format.channels == 0 {
            return Err(FrameError::NoChannels);
        }
        let sample_bytes = match format.bits_per_sample {
            16 => 2,
            32 => 4,
            other => return Err(FrameError::UnsupportedBitDepth(other)),
        };

        let valid = frame.bytes_recorded.min(frame.data.len());
        let channels = format.channels as usize;
        let frame_bytes = format.frame_bytes();

        for chunk in frame.data[..valid].chunks_exact(frame_bytes) {
            // Deliveries carry no alignment guarantee
            let read = |channel: usize| {
                let at = channel * sample_bytes;
                let bytes = &chunk[at..at + sample_bytes];
                if sample_bytes == 2 {
                    bytemuck::pod_read_unaligned::<i16>(bytes) as f32 / 32768.0
                } else {
                    bytemuck::pod_read_unaligned::<f32>(bytes)
                }
            };

            let left = read(0);
            let right = if channels > 1 { read(1) } else { left };
            self.left.push(left);
            self.right.push(right);
            self.mono.push((left + right) * 0.5);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demux_16bit_stereo() {
        let samples: [i16; 4] = [16384, -16384, 32767, 0];
        let data: &[u8] = bytemuck::cast_slice(&samples);
        let frame = AudioFrame::new(data, data.len(), AudioFormat::new(44100, 16, 2));

        let mut block = ChannelBlock::default();
        block.demux(&frame).unwrap();

        assert_eq!(block.left, vec![0.5, 32767.0 / 32768.0]);
        assert_eq!(block.right, vec![-0.5, 0.0]);
        assert_eq!(block.mono[0], 0.0);
    }

    #[test]
    fn test_demux_float_mono_feeds_both_channels() {
        let samples = [0.25f32, -0.75];
        let frame = AudioFrame::from_f32(&samples, 48000, 1);

        let mut block = ChannelBlock::default();
        block.demux(&frame).unwrap();

        assert_eq!(block.left, vec![0.25, -0.75]);
        assert_eq!(block.right, block.left);
        assert_eq!(block.mono, block.left);
        assert_eq!(block.max_abs(), (0.75, 0.75, 0.75));
    }

    #[test]
    fn test_demux_reads_unaligned_deliveries() {
        let samples = [0.5f32, -0.25];
        let mut data = vec![0u8];
        data.extend_from_slice(bytemuck::cast_slice(&samples));
        let frame = AudioFrame::new(&data[1..], 8, AudioFormat::new(48000, 32, 2));

        let mut block = ChannelBlock::default();
        block.demux(&frame).unwrap();
        assert_eq!(block.left, vec![0.5]);
        assert_eq!(block.right, vec![-0.25]);

        let ints: [i16; 2] = [-32768, 8192];
        let mut data = vec![0u8];
        data.extend_from_slice(bytemuck::cast_slice(&ints));
        let frame = AudioFrame::new(&data[1..], 4, AudioFormat::new(44100, 16, 2));
        block.demux(&frame).unwrap();
        assert_eq!(block.left, vec![-1.0]);
        assert_eq!(block.right, vec![0.25]);
    }

    #[test]
    fn test_demux_ignores_extra_channels_and_partial_frames() {
        let samples = [0.1f32, 0.2, 0.9, 0.3, 0.4, 0.9, 0.5];
        let frame = AudioFrame::from_f32(&samples, 48000, 3);

        let mut block = ChannelBlock::default();
        block.demux(&frame).unwrap();

        assert_eq!(block.left, vec![0.1, 0.3]);
        assert_eq!(block.right, vec![0.2, 0.4]);
    }

    #[test]
    fn test_demux_respects_bytes_recorded() {
        let samples = [0.5f32, 0.5, 0.5, 0.5];
        let full = AudioFrame::from_f32(&samples, 48000, 2);
        let frame = AudioFrame::new(full.data, 8, full.format);

        let mut block = ChannelBlock::default();
        block.demux(&frame).unwrap();
        assert_eq!(block.left.len(), 1);
    }

    #[test]
    fn test_demux_rejects_unknown_widths() {
        let data = [0u8; 12];
        let mut block = ChannelBlock::default();

        let frame = AudioFrame::new(&data, 12, AudioFormat::new(44100, 24, 2));
        assert_eq!(block.demux(&frame), Err(FrameError::UnsupportedBitDepth(24)));

        let frame = AudioFrame::new(&data, 12, AudioFormat::new(44100, 16, 0));
        assert_eq!(block.demux(&frame), Err(FrameError::NoChannels));
    }
}
