//! Horizontally scrolling text

use super::{color_shift, step, DrawContext, LayerRenderer};
use crate::state::{LayerState, ScrollState};
use termviz_library::{BeatReaction, LayerKind, LayerSettings};

/// Columns advanced per frame at speed 1.0
const SCROLL_RATE: f32 = 0.8;
/// Speed multiplier for SpeedBurst during a flash
const SPEED_BURST: f32 = 2.5;
/// One-time jump for the Flash reaction, in columns
pub const FLASH_JUMP: f32 = 8.0;

pub struct MarqueeRenderer;

impl LayerRenderer for MarqueeRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::Marquee
    }

    fn draw(
        &self,
        layer: &LayerSettings,
        scroll: ScrollState,
        _state: &mut LayerState,
        ctx: &mut DrawContext<'_>,
    ) -> ScrollState {
        if layer.text_snippets.is_empty() {
            return scroll;
        }
        let snippet = scroll.snippet % layer.text_snippets.len();
        let text = &layer.text_snippets[snippet];
        let text_len = text.chars().count();

        let mut speed = step(layer, ctx) * SCROLL_RATE;
        if layer.beat_reaction == BeatReaction::SpeedBurst && ctx.flash() {
            speed *= SPEED_BURST;
        }
        let mut offset = scroll.offset + speed;
        if layer.beat_reaction == BeatReaction::Flash && ctx.snapshot.beat_fired {
            offset += FLASH_JUMP;
        }

        // Fully scrolled off the left edge: wrap and move to the next snippet
        let span = (text_len + ctx.width as usize).max(1) as f32;
        let mut next_snippet = snippet;
        if offset >= span {
            offset = offset.rem_euclid(span);
            next_snippet = (snippet + 1) % layer.text_snippets.len();
        }

        let row = layer
            .row
            .map_or(ctx.height as i32 / 2, |r| r as i32)
            .min(ctx.height as i32 - 1);
        let start_x = ctx.width as i32 - offset as i32;
        let shift = color_shift(layer, ctx);
        let pulse = layer.beat_reaction == BeatReaction::Pulse && ctx.flash();

        for (i, ch) in text.chars().enumerate() {
            let x = start_x + i as i32;
            let color = ctx.color(shift + i);
            ctx.set(x, row, ch, color);
            if pulse {
                ctx.set(x, row - 1, ch, color);
                ctx.set(x, row + 1, ch, color);
            }
        }

        ScrollState {
            offset,
            snippet: next_snippet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::testing::Harness;

    fn marquee(texts: &[&str]) -> LayerSettings {
        let mut layer = LayerSettings::new(LayerKind::Marquee, 0);
        layer.text_snippets = texts.iter().map(|s| s.to_string()).collect();
        layer
    }

    #[test]
    fn test_text_enters_from_right() {
        let mut harness = Harness::new(20, 5);
        let layer = marquee(&["hello"]);
        harness.scroll.offset = 7.5;
        harness.draw(&MarqueeRenderer, &layer);
        assert!((harness.scroll.offset - 8.3).abs() < 1e-4);
        assert_eq!(harness.buffer.row_text(2), "            hello   ");
    }

    #[test]
    fn test_wraps_and_advances_snippet() {
        let mut harness = Harness::new(10, 3);
        let layer = marquee(&["ab", "cd"]);
        harness.scroll.offset = 11.5;
        harness.draw(&MarqueeRenderer, &layer);
        assert_eq!(harness.scroll.snippet, 1);
        assert!(harness.scroll.offset < 12.0);

        harness.scroll.offset = 13.9;
        harness.draw(&MarqueeRenderer, &layer);
        assert_eq!(harness.scroll.snippet, 0);
    }

    #[test]
    fn test_speed_burst_during_flash() {
        let mut harness = Harness::new(40, 3);
        let mut layer = marquee(&["x"]);
        layer.beat_reaction = BeatReaction::SpeedBurst;
        harness.snapshot.beat_flash = true;
        harness.draw(&MarqueeRenderer, &layer);
        // burst 2.0 * rate 0.8 * 2.5
        assert!((harness.scroll.offset - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_flash_jump_once_per_beat() {
        let mut harness = Harness::new(40, 3);
        let mut layer = marquee(&["x"]);
        layer.beat_reaction = BeatReaction::Flash;
        harness.snapshot.beat_fired = true;
        harness.draw(&MarqueeRenderer, &layer);
        assert!((harness.scroll.offset - (0.8 + FLASH_JUMP)).abs() < 1e-4);

        harness.snapshot.beat_fired = false;
        harness.draw(&MarqueeRenderer, &layer);
        assert!((harness.scroll.offset - (1.6 + FLASH_JUMP)).abs() < 1e-4);
    }

    #[test]
    fn test_custom_row_and_empty_text() {
        let mut harness = Harness::new(10, 4);
        let mut layer = marquee(&["zz"]);
        layer.row = Some(0);
        harness.scroll.offset = 5.0;
        harness.draw(&MarqueeRenderer, &layer);
        assert!(harness.buffer.row_text(0).contains("zz"));

        let empty = marquee(&[]);
        let before = harness.scroll;
        harness.draw(&MarqueeRenderer, &empty);
        assert_eq!(harness.scroll, before);
    }
}
