//! VU meter - left/right level bars with peak hold

use super::{DrawContext, LayerRenderer};
use crate::state::{LayerState, ScrollState};
use crossterm::style::Color;
use termviz_analysis::ChannelLevels;
use termviz_library::{BeatReaction, LayerKind, LayerSettings};

const MIN_DB: f32 = -48.0;
const MAX_DB: f32 = 6.0;
/// dB markers on the scale
const DB_MARKERS: [i32; 6] = [0, -6, -12, -24, -36, -48];

pub struct VuMeterRenderer;

/// Meter row state for rendering
struct MeterRowState {
    is_filled: bool,
    is_peak: bool,
}

impl VuMeterRenderer {
    /// Convert linear level to dB
    fn level_to_db(level: f32) -> f32 {
        if level <= 0.0 {
            -60.0
        } else {
            20.0 * level.log10()
        }
    }

    /// Map dB value to meter position (0.0-1.0)
    fn db_to_position(db: f32) -> f32 {
        ((db - MIN_DB) / (MAX_DB - MIN_DB)).clamp(0.0, 1.0)
    }

    fn row_state(levels: &ChannelLevels, threshold: f32, row_size: f32) -> MeterRowState {
        let fill = Self::db_to_position(Self::level_to_db(levels.level));
        let peak = Self::db_to_position(Self::level_to_db(levels.peak_hold));
        MeterRowState {
            is_filled: fill >= threshold,
            is_peak: peak > 0.0 && peak >= threshold && peak < threshold + row_size,
        }
    }

    /// Render a single row of a meter: bracket, fill, bracket
    fn render_meter_row(
        ctx: &mut DrawContext<'_>,
        x: i32,
        y: i32,
        state: MeterRowState,
        color: Color,
    ) {
        let dim = ctx.theme.fg_dim;
        ctx.set(x, y, '┃', dim);
        let fill_char = if state.is_peak {
            '▓'
        } else if state.is_filled {
            '█'
        } else {
            ' '
        };
        ctx.set(x + 1, y, fill_char, color);
        ctx.set(x + 2, y, '┃', dim);
    }
}

impl LayerRenderer for VuMeterRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::VuMeter
    }

    fn draw(
        &self,
        layer: &LayerSettings,
        scroll: ScrollState,
        _state: &mut LayerState,
        ctx: &mut DrawContext<'_>,
    ) -> ScrollState {
        let width = ctx.width as i32;
        // Reserve the last row for labels
        let meter_height = ctx.height as i32 - 1;
        if width < 12 || meter_height < 3 {
            return scroll;
        }
        let snapshot = ctx.snapshot;

        // Layout: dB scale | L meter | gap | R meter
        let scale_width = 3;
        let meter_width = 3;
        let gap = 2;
        let content_width = scale_width + 1 + meter_width + gap + meter_width;
        let start_x = (width - content_width) / 2;
        let left_x = start_x + scale_width + 1;
        let right_x = left_x + meter_width + gap;

        let flash_color = (layer.beat_reaction == BeatReaction::Flash && ctx.flash())
            .then_some(ctx.theme.highlight);
        let row_size = 1.0 / meter_height as f32;

        for row in 0..meter_height {
            let y = row;
            let row_ratio = row as f32 / (meter_height - 1) as f32;
            let row_db = MAX_DB - row_ratio * (MAX_DB - MIN_DB);

            if let Some(&db) = DB_MARKERS.iter().find(|&&db| {
                ((MAX_DB - db as f32) / (MAX_DB - MIN_DB) * (meter_height - 1) as f32) as i32
                    == row
            }) {
                let dim = ctx.theme.fg_dim;
                ctx.buffer.set_str(start_x, y, &format!("{:>3}", db), dim);
            }

            // Fill threshold for this row (inverted: top is high dB)
            let threshold = 1.0 - row_ratio;
            let zone = Self::db_to_position(row_db);
            let color = flash_color.unwrap_or_else(|| ctx.theme.meter_color(zone));

            let left = Self::row_state(&snapshot.left, threshold, row_size);
            Self::render_meter_row(ctx, left_x, y, left, color);
            let right = Self::row_state(&snapshot.right, threshold, row_size);
            Self::render_meter_row(ctx, right_x, y, right, color);
        }

        let label_y = meter_height;
        let label_color = ctx.color(layer.color_index);
        ctx.set(left_x + 1, label_y, 'L', label_color);
        ctx.set(right_x + 1, label_y, 'R', label_color);

        scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::testing::Harness;

    fn filled_rows(harness: &Harness, x: u16) -> usize {
        (0..harness.buffer.height())
            .filter(|&y| harness.buffer.get(x, y).map_or(false, |c| c.ch == '█'))
            .count()
    }

    #[test]
    fn test_db_mapping() {
        assert_eq!(VuMeterRenderer::db_to_position(MIN_DB), 0.0);
        assert_eq!(VuMeterRenderer::db_to_position(MAX_DB), 1.0);
        assert!((VuMeterRenderer::level_to_db(1.0)).abs() < 1e-6);
        assert_eq!(VuMeterRenderer::level_to_db(0.0), -60.0);
    }

    #[test]
    fn test_louder_channel_fills_more() {
        let mut harness = Harness::new(20, 12);
        harness.snapshot.left.level = 0.9;
        harness.snapshot.right.level = 0.05;
        let layer = LayerSettings::new(LayerKind::VuMeter, 0);
        harness.draw(&VuMeterRenderer, &layer);

        // start_x = (20 - 12) / 2 = 4, meters at columns 8..11 and 13..16
        let left = filled_rows(&harness, 9);
        let right = filled_rows(&harness, 14);
        assert!(left > right, "left {} right {}", left, right);
        assert_eq!(harness.buffer.get(9, 11).map(|c| c.ch), Some('L'));
        assert_eq!(harness.buffer.get(14, 11).map(|c| c.ch), Some('R'));
    }

    #[test]
    fn test_peak_hold_marker() {
        let mut harness = Harness::new(20, 12);
        harness.snapshot.left.peak_hold = 1.0;
        let layer = LayerSettings::new(LayerKind::VuMeter, 0);
        harness.draw(&VuMeterRenderer, &layer);
        let markers = (0..11)
            .filter(|&y| harness.buffer.get(9, y).map_or(false, |c| c.ch == '▓'))
            .count();
        assert_eq!(markers, 1);
    }
}
