//! Characters from the layer's text drifting down the screen

use super::{color_shift, step, DrawContext, LayerRenderer};
use crate::state::{coerce, FallingLettersState, LayerState, Particle, ScrollState};
use rand::Rng;
use termviz_library::{BeatReaction, LayerKind, LayerSettings};

pub const MAX_PARTICLES: usize = 200;
/// Extra particles spawned on a beat with SpawnMore
pub const SPAWN_BURST: usize = 6;

/// Used when the layer has no text
const FALLBACK_CHARS: &str = "01";

pub struct FallingLettersRenderer;

impl FallingLettersRenderer {
    fn spawn(state: &mut FallingLettersState, charset: &[char], ctx: &mut DrawContext<'_>) {
        if state.particles.len() >= MAX_PARTICLES || charset.is_empty() {
            return;
        }
        let palette_len = ctx.palette_len();
        let rng = &mut *ctx.rng;
        state.particles.push(Particle {
            x: rng.gen_range(0..ctx.width) as f32,
            y: 0.0,
            speed: rng.gen_range(0.3..1.0),
            ch: charset[rng.gen_range(0..charset.len())],
            color: rng.gen_range(0..palette_len),
        });
    }
}

impl LayerRenderer for FallingLettersRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::FallingLetters
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
        let state = coerce::<FallingLettersState>(state);

        let mut charset: Vec<char> = layer
            .text_snippets
            .iter()
            .flat_map(|s| s.chars())
            .filter(|c| !c.is_whitespace())
            .collect();
        if charset.is_empty() {
            charset = FALLBACK_CHARS.chars().collect();
        }

        // Louder input spawns faster
        state.spawn_accumulator += 0.3 + ctx.snapshot.volume * 2.0;
        while state.spawn_accumulator >= 1.0 {
            state.spawn_accumulator -= 1.0;
            Self::spawn(state, &charset, ctx);
        }
        if layer.beat_reaction == BeatReaction::SpawnMore && ctx.snapshot.beat_fired {
            for _ in 0..SPAWN_BURST {
                Self::spawn(state, &charset, ctx);
            }
        }

        let fall = step(layer, ctx);
        let height = ctx.height as f32;
        state.particles.retain_mut(|p| {
            p.y += p.speed * fall;
            p.y < height
        });

        let shift = color_shift(layer, ctx);
        for p in &state.particles {
            let color = ctx.color(p.color + shift);
            ctx.set(p.x as i32, p.y as i32, p.ch, color);
        }

        scroll
    }
}
