//! Diagonal color sweep across the whole viewport

use super::{color_shift, step, DrawContext, LayerRenderer};
use crate::state::{LayerState, ScrollState};
use termviz_library::{LayerKind, LayerSettings};

/// Shade ramp by position within a color band
const SHADES: [char; 4] = ['░', '▒', '▓', '█'];

/// Columns per palette step
const BAND_WIDTH: f32 = 10.0;

pub struct ScrollingColorsRenderer;

impl LayerRenderer for ScrollingColorsRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::ScrollingColors
    }

    fn draw(
        &self,
        layer: &LayerSettings,
        scroll: ScrollState,
        _state: &mut LayerState,
        ctx: &mut DrawContext<'_>,
    ) -> ScrollState {
        // The sweep repeats every palette cycle, so the offset wraps there
        let period = ctx.palette_len() as f32 * BAND_WIDTH;
        let offset = (scroll.offset + step(layer, ctx) * 0.5).rem_euclid(period);
        let shift = color_shift(layer, ctx);

        for y in 0..ctx.height as i32 {
            for x in 0..ctx.width as i32 {
                let position = (x as f32 + y as f32 * 0.5 + offset) / BAND_WIDTH;
                let index = position.floor() as usize + shift;
                let shade = ((position.fract() * SHADES.len() as f32) as usize).min(SHADES.len() - 1);
                let color = ctx.color(index);
                ctx.set(x, y, SHADES[shade], color);
            }
        }

        ScrollState { offset, ..scroll }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::testing::Harness;
    use termviz_library::BeatReaction;

    #[test]
    fn test_fills_every_cell() {
        let mut harness = Harness::new(20, 5);
        let layer = LayerSettings::new(LayerKind::ScrollingColors, 0);
        harness.draw(&ScrollingColorsRenderer, &layer);
        assert_eq!(harness.filled(), 100);
    }

    #[test]
    fn test_offset_advances_and_wraps() {
        let mut harness = Harness::new(10, 2);
        let mut layer = LayerSettings::new(LayerKind::ScrollingColors, 0);
        layer.speed_multiplier = 10.0;
        let period = harness.palette.len() as f32 * BAND_WIDTH;
        for _ in 0..100 {
            harness.draw(&ScrollingColorsRenderer, &layer);
            assert!(harness.scroll.offset >= 0.0 && harness.scroll.offset < period);
        }
    }

    #[test]
    fn test_color_pop_shifts_palette_during_flash() {
        let mut layer = LayerSettings::new(LayerKind::ScrollingColors, 0);
        layer.beat_reaction = BeatReaction::ColorPop;

        let mut calm = Harness::new(10, 1);
        calm.draw(&ScrollingColorsRenderer, &layer);

        let mut popped = Harness::new(10, 1);
        popped.snapshot.beat_flash = true;
        popped.draw(&ScrollingColorsRenderer, &layer);

        // Offsets differ by the burst, so compare the first cell of each
        // sweep band against the palette directly
        let calm_color = calm.buffer.get(0, 0).map(|c| c.color);
        let popped_color = popped.buffer.get(0, 0).map(|c| c.color);
        assert_eq!(calm_color, Some(crate::theme::to_color(calm.palette.color(0))));
        assert_eq!(popped_color, Some(crate::theme::to_color(popped.palette.color(1))));
    }
}
