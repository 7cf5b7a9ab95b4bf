//! Oscilloscope - classic CRT waveform trace

use super::{color_shift, DrawContext, LayerRenderer};
use crate::state::{LayerState, ScrollState};
use termviz_library::{BeatReaction, LayerKind, LayerSettings};

pub struct OscilloscopeRenderer;

impl OscilloscopeRenderer {
    /// Choose character based on amplitude
    fn trace_char(amplitude: f32) -> char {
        let amplitude = amplitude.abs();
        if amplitude > 0.7 {
            '█'
        } else if amplitude > 0.3 {
            '▓'
        } else if amplitude > 0.1 {
            '░'
        } else {
            '·'
        }
    }
}

impl LayerRenderer for OscilloscopeRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::Oscilloscope
    }

    fn draw(
        &self,
        layer: &LayerSettings,
        scroll: ScrollState,
        _state: &mut LayerState,
        ctx: &mut DrawContext<'_>,
    ) -> ScrollState {
        let width = ctx.width as usize;
        let height = ctx.height as usize;
        if width < 4 || height < 2 {
            return scroll;
        }
        let mid_y = height / 2;

        // Center line (zero crossing)
        let dim = ctx.theme.fg_dim;
        for x in 0..width {
            ctx.set(x as i32, mid_y as i32, '─', dim);
        }

        let samples = ctx.snapshot.waveform.len();
        if samples == 0 {
            return scroll;
        }

        let mut gain = layer.scope_gain();
        if layer.beat_reaction == BeatReaction::Pulse && ctx.flash() {
            gain *= 1.5;
        }
        let shift = color_shift(layer, ctx);
        let palette_len = ctx.palette_len();

        // Map samples to display width, averaging each column's span
        let per_col = (samples / width).max(1);
        for x in 0..width {
            let start = x * samples / width;
            let end = (start + per_col).min(samples);
            if start >= end {
                continue;
            }
            let sum: f32 = (start..end).map(|i| ctx.snapshot.waveform_at(i)).sum();
            let normalized = (sum / (end - start) as f32 * gain).clamp(-1.0, 1.0);

            let y_offset = (normalized * (mid_y as f32 - 0.5)) as i32;
            let y = (mid_y as i32 - y_offset).clamp(0, height as i32 - 1);
            let color = ctx.color(shift + (normalized.abs() * (palette_len - 1) as f32) as usize);
            ctx.set(x as i32, y, Self::trace_char(normalized), color);
        }

        scroll
    }
}
