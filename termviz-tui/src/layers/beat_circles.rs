//! Rings that spawn on beats and expand outward

use super::{color_shift, step, DrawContext, LayerRenderer};
use crate::state::{coerce, BeatCirclesState, LayerState, Ring, ScrollState};
use rand::Rng;
use std::f32::consts::TAU;
use termviz_library::{BeatReaction, LayerKind, LayerSettings};

const MAX_RINGS: usize = 32;
const GROWTH: f32 = 0.6;
/// Terminal cells are roughly twice as tall as wide
const ASPECT: f32 = 2.0;

pub struct BeatCirclesRenderer;

impl BeatCirclesRenderer {
    fn spawn(state: &mut BeatCirclesState, ctx: &mut DrawContext<'_>) {
        if state.rings.len() >= MAX_RINGS {
            return;
        }
        let width = ctx.width as f32;
        let height = ctx.height as f32;
        let palette_len = ctx.palette_len();
        let max_radius = (height / 2.0).max(3.0);
        let rng = &mut *ctx.rng;
        state.rings.push(Ring {
            cx: rng.gen_range(0.0..width),
            cy: rng.gen_range(0.0..height),
            radius: 0.0,
            max_radius: rng.gen_range(max_radius * 0.5..=max_radius),
            color: rng.gen_range(0..palette_len),
        });
    }
}

impl LayerRenderer for BeatCirclesRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::BeatCircles
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
        let state = coerce::<BeatCirclesState>(state);

        if ctx.snapshot.beat_count != state.last_beat {
            state.last_beat = ctx.snapshot.beat_count;
            if ctx.snapshot.beat_fired {
                let count = if layer.beat_reaction == BeatReaction::SpawnMore { 3 } else { 1 };
                for _ in 0..count {
                    Self::spawn(state, ctx);
                }
            }
        }

        let growth = GROWTH * step(layer, ctx);
        let pulse = layer.beat_reaction == BeatReaction::Pulse && ctx.flash();
        state.rings.retain_mut(|ring| {
            ring.radius += growth;
            ring.radius <= ring.max_radius
        });

        let shift = color_shift(layer, ctx);
        for ring in &state.rings {
            let fade = ring.radius / ring.max_radius;
            let ch = if pulse || fade < 0.5 {
                'O'
            } else if fade < 0.8 {
                'o'
            } else {
                '·'
            };
            let color = ctx.color(ring.color + shift);
            // Enough points to leave no gaps along the circumference
            let points = ((ring.radius * ASPECT * TAU) as usize).max(8);
            for i in 0..points {
                let angle = i as f32 / points as f32 * TAU;
                let x = ring.cx + ring.radius * ASPECT * angle.cos();
                let y = ring.cy + ring.radius * angle.sin();
                ctx.set(x.round() as i32, y.round() as i32, ch, color);
            }
        }

        scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::testing::Harness;

    fn rings(harness: &mut Harness) -> usize {
        coerce::<BeatCirclesState>(&mut harness.state).rings.len()
    }

    #[test]
    fn test_ring_spawns_once_per_beat() {
        let mut harness = Harness::new(40, 20);
        let layer = LayerSettings::new(LayerKind::BeatCircles, 0);
        harness.snapshot.beat_fired = true;
        harness.snapshot.beat_count = 1;
        harness.draw(&BeatCirclesRenderer, &layer);
        assert_eq!(rings(&mut harness), 1);

        // Same beat counter: nothing new
        harness.draw(&BeatCirclesRenderer, &layer);
        assert_eq!(rings(&mut harness), 1);
        assert!(harness.filled() > 0);
    }

    #[test]
    fn test_spawn_more_reaction() {
        let mut harness = Harness::new(40, 20);
        let mut layer = LayerSettings::new(LayerKind::BeatCircles, 0);
        layer.beat_reaction = BeatReaction::SpawnMore;
        harness.snapshot.beat_fired = true;
        harness.snapshot.beat_count = 1;
        harness.draw(&BeatCirclesRenderer, &layer);
        assert_eq!(rings(&mut harness), 3);
    }

    #[test]
    fn test_rings_expire() {
        let mut harness = Harness::new(40, 10);
        let layer = LayerSettings::new(LayerKind::BeatCircles, 0);
        harness.snapshot.beat_fired = true;
        harness.snapshot.beat_count = 1;
        harness.draw(&BeatCirclesRenderer, &layer);
        harness.snapshot.beat_fired = false;
        // Max radius is at most 5 rows here
        for _ in 0..20 {
            harness.draw(&BeatCirclesRenderer, &layer);
        }
        assert_eq!(rings(&mut harness), 0);
    }
}
