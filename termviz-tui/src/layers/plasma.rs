//! Plasma field driven by bass and treble energy

use super::{color_shift, step, DrawContext, LayerRenderer};
use crate::state::{coerce, LayerState, PlasmaState, ScrollState};
use std::f32::consts::TAU;
use termviz_library::{BeatReaction, LayerKind, LayerSettings};

const CHARS: [char; 9] = [' ', '.', ':', ';', 'o', 'O', '0', '@', '#'];
/// Intensity smoothing toward the current band energy
const INTENSITY_RETAIN: f32 = 0.8;
/// Phase kick for Pulse on a beat
const PULSE_KICK: f32 = 0.6;

pub struct PlasmaRenderer;

impl LayerRenderer for PlasmaRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::Plasma
    }

    fn draw(
        &self,
        layer: &LayerSettings,
        scroll: ScrollState,
        state: &mut LayerState,
        ctx: &mut DrawContext<'_>,
    ) -> ScrollState {
        if ctx.width == 0 || ctx.height == 0 {
            return scroll;
        }
        let state = coerce::<PlasmaState>(state);
        let snapshot = ctx.snapshot;

        state.bass_intensity =
            state.bass_intensity * INTENSITY_RETAIN + snapshot.bass() * (1.0 - INTENSITY_RETAIN);
        state.treble_intensity = state.treble_intensity * INTENSITY_RETAIN
            + snapshot.treble() * (1.0 - INTENSITY_RETAIN);

        state.phase += 0.06 * step(layer, ctx) * (1.0 + state.bass_intensity * 2.0);
        if layer.beat_reaction == BeatReaction::Pulse && snapshot.beat_fired {
            state.phase += PULSE_KICK;
        }
        state.color_phase += 0.02 + state.treble_intensity * 0.1;
        state.phase = state.phase.rem_euclid(TAU * 100.0);
        state.color_phase = state.color_phase.rem_euclid(ctx.palette_len() as f32);

        let inv_w = 1.0 / ctx.width as f32;
        let inv_h = 1.0 / ctx.height as f32;
        let t = state.phase;
        // Bass widens the pattern, treble tightens the ripples
        let freq_x = 8.0 + state.bass_intensity * 6.0;
        let freq_r = 10.0 + state.treble_intensity * 12.0;
        let shift = color_shift(layer, ctx);
        let palette_len = ctx.palette_len() as f32;

        for y in 0..ctx.height {
            let fy = y as f32 * inv_h;
            let v2 = (fy * 9.0 + t * 1.5).sin();
            for x in 0..ctx.width {
                let fx = x as f32 * inv_w;
                let v1 = (fx * freq_x + t).sin();
                let v3 = ((fx + fy) * 5.0 + t * 0.5).sin();
                let dx = fx - 0.5;
                let dy = fy - 0.5;
                let v4 = ((dx * dx + dy * dy).sqrt() * freq_r - t).sin();

                let normalized = ((v1 + v2 + v3 + v4) * 0.25 + 1.0) * 0.5;
                let char_idx = ((normalized * (CHARS.len() - 1) as f32) as usize).min(CHARS.len() - 1);
                let color_idx = (normalized * palette_len + state.color_phase) as usize + shift;
                let color = ctx.color(color_idx);
                ctx.set(x as i32, y as i32, CHARS[char_idx], color);
            }
        }

        scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::testing::Harness;

    #[test]
    fn test_bass_raises_intensity() {
        let mut harness = Harness::new(20, 8);
        let layer = LayerSettings::new(LayerKind::Plasma, 0);
        harness.snapshot.auto_gain_target = 1.0;
        for band in 0..harness.snapshot.num_bands {
            harness.snapshot.smoothed[band] = 1.0;
        }
        for _ in 0..20 {
            harness.draw(&PlasmaRenderer, &layer);
        }
        let state = coerce::<PlasmaState>(&mut harness.state);
        assert!(state.bass_intensity > 0.9);
        assert!(state.treble_intensity > 0.9);
    }

    #[test]
    fn test_pulse_kicks_phase_on_beat() {
        let mut layer = LayerSettings::new(LayerKind::Plasma, 0);
        layer.beat_reaction = BeatReaction::Pulse;

        let mut calm = Harness::new(10, 4);
        calm.draw(&PlasmaRenderer, &layer);
        let mut kicked = Harness::new(10, 4);
        kicked.snapshot.beat_fired = true;
        kicked.draw(&PlasmaRenderer, &layer);

        let calm_phase = coerce::<PlasmaState>(&mut calm.state).phase;
        let kicked_phase = coerce::<PlasmaState>(&mut kicked.state).phase;
        assert!((kicked_phase - calm_phase - PULSE_KICK).abs() < 1e-5);
    }

    #[test]
    fn test_fills_viewport() {
        let mut harness = Harness::new(12, 6);
        let layer = LayerSettings::new(LayerKind::Plasma, 0);
        harness.draw(&PlasmaRenderer, &layer);
        // Every cell is written, even where the glyph is a space
        for y in 0..6 {
            assert_eq!(harness.buffer.row_text(y).chars().count(), 12);
        }
        assert!(harness.filled() > 0);
    }
}
