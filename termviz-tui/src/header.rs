//! Header chrome - one status line above the visualizer

use crate::buffer::{CellBuffer, LineWriter};
use crate::theme::Theme;
use crossterm::style::Color;
use std::io;
use termviz_audio::AnalysisSnapshot;
use termviz_library::LayerKind;

/// Values shown in the header
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    pub bpm: Option<f32>,
    pub volume: f32,
    pub sensitivity: f32,
    pub beat_flash: bool,
    /// Selected slot, 0-based
    pub selected: usize,
    pub kind: Option<LayerKind>,
    pub enabled: bool,
    pub palette_id: String,
    /// Mode label or transient message, right-aligned
    pub status: String,
}

impl HeaderInfo {
    pub fn from_snapshot(snapshot: &AnalysisSnapshot) -> Self {
        Self {
            bpm: snapshot.bpm,
            volume: snapshot.volume,
            sensitivity: snapshot.beat_sensitivity,
            beat_flash: snapshot.beat_flash,
            selected: 0,
            kind: None,
            enabled: false,
            palette_id: String::new(),
            status: String::new(),
        }
    }

    pub fn layer(mut self, selected: usize, kind: Option<LayerKind>, enabled: bool) -> Self {
        self.selected = selected;
        self.kind = kind;
        self.enabled = enabled;
        self
    }

    pub fn palette(mut self, palette_id: &str) -> Self {
        self.palette_id = palette_id.to_string();
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }
}

/// Header line renderer
///
/// Writes only when the composed line differs from the last one written.
#[derive(Debug)]
pub struct HeaderBar {
    buffer: CellBuffer,
    theme: Theme,
}

impl Default for HeaderBar {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderBar {
    pub fn new() -> Self {
        Self {
            buffer: CellBuffer::default(),
            theme: Theme::default(),
        }
    }

    /// Force the next render to write
    pub fn invalidate(&mut self) {
        self.buffer.invalidate();
    }

    /// Compose the header and write it to `row` if it changed
    ///
    /// Returns true if a line was written.
    pub fn render<W: LineWriter + ?Sized>(
        &mut self,
        info: &HeaderInfo,
        width: u16,
        row: u16,
        writer: &mut W,
    ) -> io::Result<bool> {
        self.compose(info, width);
        Ok(self.buffer.flush_to(writer, row)? > 0)
    }

    fn compose(&mut self, info: &HeaderInfo, width: u16) {
        self.buffer.ensure_size(width, 1);
        self.buffer.clear(self.theme.background);

        let theme = &self.theme;
        let bpm = info
            .bpm
            .map_or_else(|| "---".to_string(), |bpm| format!("{:>3.0}", bpm));
        let kind = info.kind.map_or("-", |k| k.name());
        let state = if info.enabled { "on" } else { "off" };

        let segments: [(String, Color); 6] = [
            ("termviz ".to_string(), theme.highlight),
            (
                format!("{} BPM ", bpm),
                if info.beat_flash { theme.warning } else { theme.fg },
            ),
            (
                format!("vol {:>3.0}% ", info.volume.clamp(0.0, 1.0) * 100.0),
                theme.meter_color(info.volume),
            ),
            (format!("sens {:.1} ", info.sensitivity), theme.fg_dim),
            (
                format!("[{}] {} ({}) ", info.selected + 1, kind, state),
                if info.enabled { theme.fg } else { theme.fg_dim },
            ),
            (format!("pal {}", info.palette_id), theme.fg_dim),
        ];

        let mut x = 0i32;
        for (text, color) in &segments {
            self.buffer.set_str(x, 0, text, *color);
            x += text.chars().count() as i32;
        }

        if !info.status.is_empty() {
            let len = info.status.chars().count() as i32;
            let status_x = (width as i32 - len).max(x + 1);
            self.buffer.set_str(status_x, 0, &info.status, self.theme.highlight);
        }
    }

    /// Plain text of the last composed header
    pub fn text(&self) -> String {
        self.buffer.row_text(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn info() -> HeaderInfo {
        let mut snapshot = AnalysisSnapshot::default();
        snapshot.bpm = Some(128.0);
        snapshot.volume = 0.5;
        HeaderInfo::from_snapshot(&snapshot)
            .layer(1, Some(LayerKind::Marquee), true)
            .palette("fire")
    }

    #[test]
    fn test_header_text() {
        let mut header = HeaderBar::new();
        let mut out = Recorder::default();
        header.render(&info(), 100, 0, &mut out).unwrap();
        let text = header.text();
        assert!(text.contains("128 BPM"), "{}", text);
        assert!(text.contains("vol  50%"), "{}", text);
        assert!(text.contains("[2] Marquee (on)"), "{}", text);
        assert!(text.contains("pal fire"), "{}", text);
    }

    #[test]
    fn test_unchanged_header_not_rewritten() {
        let mut header = HeaderBar::new();
        let mut out = Recorder::default();
        assert!(header.render(&info(), 80, 0, &mut out).unwrap());
        assert!(!header.render(&info(), 80, 0, &mut out).unwrap());

        let changed = info().status("SETTINGS");
        assert!(header.render(&changed, 80, 0, &mut out).unwrap());
        assert_eq!(out.rows.len(), 2);
        assert!(header.text().trim_end().ends_with("SETTINGS"));
    }

    #[test]
    fn test_missing_bpm_placeholder() {
        let mut header = HeaderBar::new();
        let mut out = Recorder::default();
        let info = HeaderInfo::from_snapshot(&AnalysisSnapshot::default());
        header.render(&info, 80, 0, &mut out).unwrap();
        assert!(header.text().contains("--- BPM"));
    }
}
