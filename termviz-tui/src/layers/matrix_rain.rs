//! Matrix rain on every other column

use super::{color_shift, step, DrawContext, LayerRenderer};
use crate::state::{coerce, LayerState, MatrixRainState, ScrollState};
use rand::Rng;
use termviz_library::{BeatReaction, LayerKind, LayerSettings};

const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@#$%&*<>";
/// Trail length below each head, head included
const TRAIL: usize = 6;
const FALL_RATE: f32 = 0.5;

pub struct MatrixRainRenderer;

impl MatrixRainRenderer {
    /// Deterministic glyph for a cell so trails don't flicker between frames
    fn glyph(x: i32, y: i32, cycle: u32) -> char {
        let hash = (x as u32)
            .wrapping_mul(73_856_093)
            ^ (y as u32).wrapping_mul(19_349_663)
            ^ cycle.wrapping_mul(83_492_791);
        CHARS[hash as usize % CHARS.len()] as char
    }
}

impl LayerRenderer for MatrixRainRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::MatrixRain
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
        let state = coerce::<MatrixRainState>(state);

        let columns = (ctx.width as usize + 1) / 2;
        let period = ctx.height as f32 + TRAIL as f32;
        if state.phases.len() != columns {
            let rng = &mut *ctx.rng;
            state.phases = (0..columns).map(|_| rng.gen_range(0.0..period)).collect();
            state.speeds = (0..columns).map(|_| rng.gen_range(0.4..1.2)).collect();
        }

        let advance = step(layer, ctx) * FALL_RATE;
        let jump = layer.beat_reaction == BeatReaction::Flash && ctx.snapshot.beat_fired;
        let shift = color_shift(layer, ctx);

        for column in 0..columns {
            let mut phase = state.phases[column] + state.speeds[column] * advance;
            if jump {
                phase += ctx.rng.gen_range(0.0..period);
            }
            let cycle = (phase / period) as u32;
            phase = phase.rem_euclid(period);
            if phase >= period {
                phase = 0.0;
            }
            state.phases[column] = phase;

            let x = column as i32 * 2;
            let head = phase as i32;
            for depth in 0..TRAIL {
                let y = head - depth as i32;
                let ch = Self::glyph(x, y, cycle);
                let color = ctx.color(shift + depth);
                ctx.set(x, y, ch, color);
            }
        }

        scroll
    }
}
