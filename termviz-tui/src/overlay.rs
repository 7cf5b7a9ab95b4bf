//! Modal overlays drawn over the visualizer: help and the layer editor

use crate::buffer::{CellBuffer, LineWriter};
use crate::theme::Theme;
use std::io;
use termviz_audio::Viewport;
use termviz_library::{FieldDescriptor, LayerSettings};

/// Key overview shown in help mode
pub const HELP_LINES: &[&str] = &[
    "1-9          select layer slot",
    "Shift+1-9    toggle layer on/off",
    "Left/Right   change layer kind",
    "p            next palette",
    "+ / -        beat sensitivity",
    "f            toggle full screen",
    "Tab          edit selected layer",
    "Ctrl+S       save settings",
    "?            close help",
    "q / Ctrl+C   quit",
];

/// Boxed text panel centered in the viewport
#[derive(Debug)]
struct Panel {
    title: String,
    lines: Vec<String>,
    /// Line to highlight
    selected: Option<usize>,
}

impl Panel {
    fn render<W: LineWriter + ?Sized>(
        &self,
        viewport: Viewport,
        theme: &Theme,
        writer: &mut W,
    ) -> io::Result<usize> {
        let content_width = self
            .lines
            .iter()
            .map(|l| l.chars().count())
            .chain(std::iter::once(self.title.chars().count() + 2))
            .max()
            .unwrap_or(0);
        let box_width = (content_width + 4).min(viewport.width as usize);
        let box_height = (self.lines.len() + 2).min(viewport.height as usize);
        if box_width < 4 || box_height < 2 {
            return Ok(0);
        }

        let mut buffer = CellBuffer::new(viewport.width, box_height as u16);
        buffer.clear(theme.background);
        let left = ((viewport.width as usize - box_width) / 2) as i32;
        let right = left + box_width as i32 - 1;
        let bottom = box_height as i32 - 1;

        for x in left..=right {
            buffer.set(x, 0, '─', theme.fg_dim);
            buffer.set(x, bottom, '─', theme.fg_dim);
        }
        for y in 0..=bottom {
            buffer.set(left, y, '│', theme.fg_dim);
            buffer.set(right, y, '│', theme.fg_dim);
        }
        buffer.set(left, 0, '┌', theme.fg_dim);
        buffer.set(right, 0, '┐', theme.fg_dim);
        buffer.set(left, bottom, '└', theme.fg_dim);
        buffer.set(right, bottom, '┘', theme.fg_dim);
        buffer.set_str(left + 2, 0, &format!(" {} ", self.title), theme.highlight);

        for (i, line) in self.lines.iter().enumerate().take(box_height - 2) {
            let color = if self.selected == Some(i) {
                theme.highlight
            } else {
                theme.fg
            };
            let marker = if self.selected == Some(i) { '>' } else { ' ' };
            buffer.set(left + 1, i as i32 + 1, marker, color);
            // Clip to the inside of the box
            let inner: String = line.chars().take(box_width.saturating_sub(4)).collect();
            buffer.set_str(left + 2, i as i32 + 1, &inner, color);
        }

        let top = viewport.start_row + (viewport.height - box_height as u16) / 2;
        buffer.flush_to(writer, top)
    }
}

/// Draw the key overview
pub fn render_help<W: LineWriter + ?Sized>(
    viewport: Viewport,
    writer: &mut W,
) -> io::Result<usize> {
    let panel = Panel {
        title: "Keys".to_string(),
        lines: HELP_LINES.iter().map(|l| l.to_string()).collect(),
        selected: None,
    };
    panel.render(viewport, &Theme::default(), writer)
}

/// Draw the field editor for one layer
pub fn render_settings<W: LineWriter + ?Sized>(
    viewport: Viewport,
    slot: usize,
    layer: &LayerSettings,
    fields: &[FieldDescriptor],
    selected: usize,
    writer: &mut W,
) -> io::Result<usize> {
    let name_width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    let lines = fields
        .iter()
        .map(|f| format!("{:<width$}  {}", f.name, (f.get)(layer), width = name_width))
        .collect();
    let panel = Panel {
        title: format!("Layer {}: {}", slot + 1, layer.layer_type.name()),
        lines,
        selected: Some(selected),
    };
    panel.render(viewport, &Theme::default(), writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use termviz_library::{fields_for, LayerKind};

    #[derive(Default)]
    struct Recorder {
        rows: Vec<(u16, String)>,
    }

    impl LineWriter for Recorder {
        fn write_line(&mut self, row: u16, content: &str) -> io::Result<()> {
            self.rows.push((row, content.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_help_is_centered_in_viewport() {
        let viewport = Viewport::for_terminal(80, 24, false);
        let mut out = Recorder::default();
        let rows = render_help(viewport, &mut out).unwrap();
        assert_eq!(rows, HELP_LINES.len() + 2);
        // 23 visualizer rows, 12-row box, starting below the header
        assert_eq!(out.rows[0].0, 1 + (23 - 12) / 2);
        assert!(out.rows.iter().any(|(_, l)| l.contains("toggle full screen")));
    }

    #[test]
    fn test_settings_lists_fields_with_values() {
        let viewport = Viewport::for_terminal(80, 24, true);
        let layer = LayerSettings::new(LayerKind::Oscilloscope, 0);
        let fields = fields_for(LayerKind::Oscilloscope);
        let mut out = Recorder::default();
        render_settings(viewport, 7, &layer, &fields, 1, &mut out).unwrap();

        assert!(out.rows.iter().any(|(_, l)| l.contains("Layer 8: Oscilloscope")));
        assert!(out.rows.iter().any(|(_, l)| l.contains("Gain")));
        assert!(out.rows.iter().any(|(_, l)| l.contains(">")));
    }

    #[test]
    fn test_tiny_viewport_draws_nothing() {
        let viewport = Viewport::for_terminal(3, 2, true);
        let mut out = Recorder::default();
        assert_eq!(render_help(viewport, &mut out).unwrap(), 0);
    }
}
