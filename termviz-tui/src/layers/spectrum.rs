//! Spectrum skin - band bars with peak markers and optional labels

use super::{color_shift, DrawContext, LayerRenderer};
use crate::state::{LayerState, ScrollState};
use termviz_analysis::band_center_hz;
use termviz_library::{BeatReaction, LayerKind, LayerSettings};

/// Characters for vertical bar rendering (8 levels)
const BAR_CHARS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const PEAK_CHAR: char = '▔';
/// Bars use this fraction of the normalized magnitude
const BAR_SCALE: f32 = 0.8;
/// Width reserved for row labels ("100 ")
const LABEL_WIDTH: u16 = 4;
/// Columns between frequency labels
const FREQ_LABEL_SPACING: usize = 8;

pub struct SpectrumRenderer;

impl SpectrumRenderer {
    /// Bar cells from bottom to top for a 0-1 fill
    fn render_bar(fill: f32, height: usize) -> impl Iterator<Item = char> {
        let total_levels = (fill.clamp(0.0, 1.0) * 8.0 * height as f32) as usize;
        let full_blocks = total_levels / 8;
        let partial = total_levels % 8;

        (0..height).map(move |row| {
            if row < full_blocks {
                '█'
            } else if row == full_blocks && partial > 0 {
                BAR_CHARS[partial]
            } else {
                ' '
            }
        })
    }

    /// Short frequency label: "40", "440", "1k2", "12k"
    fn freq_label(hz: f32) -> String {
        if hz >= 10_000.0 {
            format!("{}k", (hz / 1000.0).round() as u32)
        } else if hz >= 1000.0 {
            let tenths = (hz / 100.0).round() as u32;
            format!("{}k{}", tenths / 10, tenths % 10)
        } else {
            format!("{}", hz.round() as u32)
        }
    }
}

impl LayerRenderer for SpectrumRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::SpectrumSkin
    }

    fn draw(
        &self,
        layer: &LayerSettings,
        scroll: ScrollState,
        _state: &mut LayerState,
        ctx: &mut DrawContext<'_>,
    ) -> ScrollState {
        let snapshot = ctx.snapshot;
        let num_bands = snapshot.num_bands.min(snapshot.smoothed.len());

        let left = if layer.show_row_labels { LABEL_WIDTH } else { 0 };
        let footer = u16::from(layer.show_frequency_labels) + u16::from(layer.show_volume_bar);
        if num_bands == 0 || ctx.width <= left || ctx.height <= footer {
            return scroll;
        }
        let width = (ctx.width - left) as usize;
        let bar_height = (ctx.height - footer) as usize;

        let bands_to_show = width.min(num_bands);
        let band_width = (width / bands_to_show).max(1);
        let start_x = left as usize + (width - bands_to_show * band_width) / 2;

        let gain = snapshot.gain();
        let boost = if layer.beat_reaction == BeatReaction::Pulse && ctx.flash() {
            1.25
        } else {
            1.0
        };
        let shift = color_shift(layer, ctx);
        let palette_len = ctx.palette_len();

        for band in 0..bands_to_show {
            let band_idx = band * num_bands / bands_to_show;
            let fill = (snapshot.smoothed[band_idx] * gain * BAR_SCALE * boost).min(1.0);
            let peak = (snapshot.peak_hold[band_idx] * gain * BAR_SCALE).min(1.0);
            let color = ctx.color(shift + band * palette_len / bands_to_show);
            let x0 = (start_x + band * band_width) as i32;

            // Render from bottom to top
            for (row, ch) in Self::render_bar(fill, bar_height).enumerate() {
                if ch == ' ' {
                    continue;
                }
                let y = (bar_height - 1 - row) as i32;
                for dx in 0..band_width as i32 {
                    ctx.set(x0 + dx, y, ch, color);
                }
            }

            let peak_row = ((peak * bar_height as f32) as usize).min(bar_height - 1);
            let fill_rows = (fill * bar_height as f32) as usize;
            if peak > 0.0 && peak_row >= fill_rows {
                let y = (bar_height - 1 - peak_row) as i32;
                let marker = ctx.theme.highlight;
                for dx in 0..band_width as i32 {
                    ctx.set(x0 + dx, y, PEAK_CHAR, marker);
                }
            }
        }

        if layer.show_row_labels {
            let dim = ctx.theme.fg_dim;
            let last = bar_height as i32 - 1;
            ctx.buffer.set_str(0, 0, "100", dim);
            if bar_height > 2 {
                ctx.buffer.set_str(0, last / 2, " 50", dim);
            }
            ctx.buffer.set_str(0, last, "  0", dim);
        }

        let mut footer_row = bar_height as i32;
        if layer.show_volume_bar {
            let filled = (snapshot.volume.clamp(0.0, 1.0) * width as f32) as i32;
            let color = ctx.theme.meter_color(snapshot.volume);
            for x in 0..filled {
                ctx.set(left as i32 + x, footer_row, '▬', color);
            }
            footer_row += 1;
        }

        if layer.show_frequency_labels {
            let dim = ctx.theme.fg_dim;
            for column in (0..bands_to_show * band_width).step_by(FREQ_LABEL_SPACING) {
                let band_idx = (column / band_width) * num_bands / bands_to_show;
                let label = Self::freq_label(band_center_hz(band_idx, num_bands));
                ctx.buffer
                    .set_str((start_x + column) as i32, footer_row, &label, dim);
            }
        }

        scroll
    }
}
