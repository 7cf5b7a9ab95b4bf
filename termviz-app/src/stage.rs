//! Shared render state and the foreground command handling that mutates it

use std::io::{self, BufWriter, Stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use crossterm::{cursor::MoveTo, queue, style::Print};
use parking_lot::Mutex;
use tracing::{info, warn};

use termviz_analysis::{MAX_SENSITIVITY, MIN_SENSITIVITY};
use termviz_audio::{AnalysisSnapshot, EngineCommand, Viewport};
use termviz_input::{Command, Mode};
use termviz_library::{fields_for, PaletteSet, VisualizerSettings, MAX_SELECTABLE_LAYERS};
use termviz_tui::{render_help, render_settings, HeaderBar, HeaderInfo, LineWriter, Visualizer};

/// How long a transient header message stays up
const NOTICE_DURATION: Duration = Duration::from_secs(2);

/// Locks guarding terminal output
///
/// Always acquire `console` before `render`, never the reverse. The capture
/// callback and the header task take only `render`.
pub struct Shared {
    pub console: Mutex<()>,
    pub render: Mutex<RenderStage>,
}

impl Shared {
    pub fn new(stage: RenderStage) -> Self {
        Self {
            console: Mutex::new(()),
            render: Mutex::new(stage),
        }
    }
}

/// Buffered row writer on stdout
pub struct TerminalWriter {
    out: BufWriter<Stdout>,
}

impl TerminalWriter {
    pub fn new() -> Self {
        Self {
            out: BufWriter::new(io::stdout()),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Direct access for screen-level commands (clear, cursor)
    pub fn inner(&mut self) -> &mut BufWriter<Stdout> {
        &mut self.out
    }
}

impl LineWriter for TerminalWriter {
    fn write_line(&mut self, row: u16, content: &str) -> io::Result<()> {
        queue!(self.out, MoveTo(0, row), Print(content))
    }
}

/// What the foreground loop must do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    None,
    /// Overlay content changed
    Overlay,
    /// Clear the screen and redraw everything
    Redraw,
    Quit,
}

/// Everything behind the render lock
pub struct RenderStage {
    pub visualizer: Visualizer,
    header: HeaderBar,
    pub settings: VisualizerSettings,
    palettes: PaletteSet,
    settings_path: PathBuf,
    engine: Sender<EngineCommand>,
    viewport: Viewport,
    /// Selected layer slot
    selected: usize,
    /// Field cursor in the settings editor
    field: usize,
    mode: Mode,
    /// Analysis values from the latest published snapshot
    levels: HeaderInfo,
    notice: Option<(String, Instant)>,
    /// Previous frame failed
    failing: bool,
}

impl RenderStage {
    pub fn new(
        visualizer: Visualizer,
        settings: VisualizerSettings,
        palettes: PaletteSet,
        settings_path: PathBuf,
        engine: Sender<EngineCommand>,
        viewport: Viewport,
    ) -> Self {
        Self {
            visualizer,
            header: HeaderBar::new(),
            settings,
            palettes,
            settings_path,
            engine,
            viewport,
            selected: 0,
            field: 0,
            mode: Mode::Normal,
            levels: HeaderInfo::from_snapshot(&AnalysisSnapshot::default()),
            notice: None,
            failing: false,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Render one published snapshot
    ///
    /// A failed frame is replaced by the fallback line; the next frame
    /// proceeds normally.
    pub fn render(&mut self, snapshot: &AnalysisSnapshot, writer: &mut dyn LineWriter) {
        self.levels = HeaderInfo::from_snapshot(snapshot);
        // Overlays own the screen while open
        if self.mode != Mode::Normal {
            return;
        }

        match self
            .visualizer
            .render_frame(snapshot, &self.settings, &self.palettes, writer)
        {
            Ok(_) => {
                if self.failing {
                    info!("rendering recovered");
                    self.failing = false;
                }
            }
            Err(e) => {
                if !self.failing {
                    warn!(error = %e, "frame render failed, showing fallback");
                    self.failing = true;
                }
                if let Err(e) = self.visualizer.write_fallback(writer, snapshot.viewport) {
                    warn!(error = %e, "fallback write failed");
                }
            }
        }
    }

    fn header_info(&mut self) -> HeaderInfo {
        let layer = self.settings.layer(self.selected);
        let palette_id = layer
            .map(|l| self.palettes.resolve(l, &self.settings.palette_id).id.clone())
            .unwrap_or_else(|| self.settings.palette_id.clone());

        if self
            .notice
            .as_ref()
            .is_some_and(|(_, since)| since.elapsed() >= NOTICE_DURATION)
        {
            self.notice = None;
        }
        let status = match &self.notice {
            Some((text, _)) => text.clone(),
            None => self.mode.display_name().to_string(),
        };

        self.levels
            .clone()
            .layer(
                self.selected,
                layer.map(|l| l.layer_type),
                layer.is_some_and(|l| l.enabled),
            )
            .palette(&palette_id)
            .status(&status)
    }

    /// Redraw the header line if its content changed
    pub fn render_header(&mut self, writer: &mut dyn LineWriter) -> io::Result<()> {
        if self.viewport.full_screen || !self.settings.show_header {
            return Ok(());
        }
        let info = self.header_info();
        self.header.render(&info, self.viewport.width, 0, writer)?;
        Ok(())
    }

    /// Draw the open overlay, if any
    pub fn render_overlay(&mut self, writer: &mut dyn LineWriter) -> io::Result<()> {
        match self.mode {
            Mode::Normal => Ok(()),
            Mode::Help => render_help(self.viewport, writer).map(|_| ()),
            Mode::Settings => {
                let Some(layer) = self.settings.layer(self.selected) else {
                    return Ok(());
                };
                let fields = fields_for(layer.layer_type);
                self.field = self.field.min(fields.len().saturating_sub(1));
                render_settings(self.viewport, self.selected, layer, &fields, self.field, writer)
                    .map(|_| ())
            }
        }
    }

    /// Forget everything on screen so the next frames repaint it
    pub fn invalidate(&mut self) {
        self.visualizer.invalidate();
        self.header.invalidate();
    }

    /// Terminal was resized
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let full_screen = self.viewport.full_screen || !self.settings.show_header;
        self.set_viewport(Viewport::for_terminal(cols, rows, full_screen));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.send(EngineCommand::SetViewport(viewport));
    }

    fn send(&self, command: EngineCommand) {
        if let Err(e) = self.engine.try_send(command) {
            warn!(error = %e, "engine command dropped");
        }
    }

    fn notify(&mut self, text: &str) {
        self.notice = Some((text.to_string(), Instant::now()));
    }

    /// Write settings to disk
    pub fn save(&mut self) {
        match self.settings.save_to(&self.settings_path) {
            Ok(()) => {
                info!(path = %self.settings_path.display(), "settings saved");
                self.notify("saved");
            }
            Err(e) => {
                warn!(path = %self.settings_path.display(), "failed to save settings: {}", e);
                self.notify("save failed");
            }
        }
    }

    /// Apply a command from the key surface
    pub fn apply(&mut self, command: Command) -> Outcome {
        match command {
            Command::SelectLayer(slot) => {
                if slot < MAX_SELECTABLE_LAYERS && slot < self.settings.layers.len() {
                    self.selected = slot;
                }
                Outcome::None
            }
            Command::ToggleLayer(slot) => {
                if slot < MAX_SELECTABLE_LAYERS {
                    if let Some(layer) = self.settings.layer_mut(slot) {
                        layer.enabled = !layer.enabled;
                    }
                }
                Outcome::None
            }
            Command::CycleKind(delta) => {
                let slot = self.selected;
                if let Some(layer) = self.settings.layer_mut(slot) {
                    layer.layer_type = if delta < 0 {
                        layer.layer_type.prev()
                    } else {
                        layer.layer_type.next()
                    };
                    info!(slot, kind = layer.layer_type.name(), "layer kind changed");
                    self.visualizer.clear_layer_state(slot);
                    self.field = 0;
                }
                Outcome::None
            }
            Command::CyclePalette => {
                let global = self.settings.palette_id.clone();
                if let Some(layer) = self.settings.layers.get_mut(self.selected) {
                    let current = self.palettes.resolve(layer, &global).id.clone();
                    layer.palette_id = Some(self.palettes.next_id(&current).to_string());
                }
                Outcome::None
            }
            Command::AdjustSensitivity(delta) => {
                let value =
                    (self.settings.beat_sensitivity + delta).clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
                self.settings.beat_sensitivity = value;
                self.send(EngineCommand::SetSensitivity(value));
                Outcome::None
            }
            Command::ToggleFullScreen => {
                let rows = self.viewport.height + self.viewport.start_row;
                let full_screen = !self.viewport.full_screen;
                self.set_viewport(Viewport::for_terminal(self.viewport.width, rows, full_screen));
                Outcome::Redraw
            }
            Command::ToggleHelp if self.mode != Mode::Help => Outcome::Redraw,
            Command::ToggleHelp => Outcome::Overlay,
            Command::EnterSettings => {
                self.field = 0;
                Outcome::Overlay
            }
            Command::ExitSettings => Outcome::Redraw,
            Command::SelectField(delta) => {
                let count = self
                    .settings
                    .layer(self.selected)
                    .map_or(0, |l| fields_for(l.layer_type).len());
                if count > 0 {
                    self.field = (self.field as i64 + delta as i64).rem_euclid(count as i64) as usize;
                }
                Outcome::Overlay
            }
            Command::CycleField(delta) => {
                if let Some(layer) = self.settings.layers.get_mut(self.selected) {
                    let fields = fields_for(layer.layer_type);
                    if let Some(field) = fields.get(self.field) {
                        (field.cycle)(layer, delta);
                        layer.sanitize();
                    }
                }
                Outcome::Overlay
            }
            Command::Save => {
                self.save();
                Outcome::None
            }
            Command::Quit => Outcome::Quit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Receiver;
    use termviz_audio::AnalysisEngine;
    use termviz_library::LayerKind;

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

    fn stage(path: PathBuf) -> (RenderStage, Receiver<EngineCommand>) {
        let (tx, rx) = AnalysisEngine::create_channel();
        let stage = RenderStage::new(
            Visualizer::with_seed(1),
            VisualizerSettings::default(),
            PaletteSet::builtin(),
            path,
            tx,
            Viewport::for_terminal(80, 24, false),
        );
        (stage, rx)
    }

    #[test]
    fn test_select_and_toggle() {
        let (mut stage, _rx) = stage(PathBuf::from("unused.json"));
        stage.apply(Command::SelectLayer(2));
        assert_eq!(stage.selected(), 2);
        stage.apply(Command::SelectLayer(40));
        assert_eq!(stage.selected(), 2);

        let before = stage.settings.layers[3].enabled;
        stage.apply(Command::ToggleLayer(3));
        assert_eq!(stage.settings.layers[3].enabled, !before);
    }

    #[test]
    fn test_cycle_kind_wraps_both_ways() {
        let (mut stage, _rx) = stage(PathBuf::from("unused.json"));
        stage.apply(Command::SelectLayer(0));
        assert_eq!(stage.settings.layers[0].layer_type, LayerKind::ScrollingColors);
        stage.apply(Command::CycleKind(1));
        assert_eq!(stage.settings.layers[0].layer_type, LayerKind::Marquee);
        stage.apply(Command::CycleKind(-1));
        stage.apply(Command::CycleKind(-1));
        assert_eq!(stage.settings.layers[0].layer_type, LayerKind::VuMeter);
    }

    #[test]
    fn test_cycle_palette_sets_layer_override() {
        let (mut stage, _rx) = stage(PathBuf::from("unused.json"));
        stage.apply(Command::CyclePalette);
        let id = stage.settings.layers[0].palette_id.clone();
        assert_eq!(id.as_deref(), Some("fire"));
        stage.apply(Command::CyclePalette);
        assert_eq!(stage.settings.layers[0].palette_id.as_deref(), Some("ice"));
    }

    #[test]
    fn test_sensitivity_is_clamped_and_forwarded() {
        let (mut stage, rx) = stage(PathBuf::from("unused.json"));
        for _ in 0..40 {
            stage.apply(Command::AdjustSensitivity(0.1));
        }
        assert_eq!(stage.settings.beat_sensitivity, MAX_SENSITIVITY);
        let last = rx.try_iter().last();
        assert_eq!(last, Some(EngineCommand::SetSensitivity(MAX_SENSITIVITY)));
    }

    #[test]
    fn test_full_screen_toggle_gives_header_row_to_visualizer() {
        let (mut stage, rx) = stage(PathBuf::from("unused.json"));
        assert_eq!(stage.apply(Command::ToggleFullScreen), Outcome::Redraw);
        assert_eq!(stage.viewport(), Viewport::for_terminal(80, 24, true));
        assert_eq!(
            rx.try_recv(),
            Ok(EngineCommand::SetViewport(Viewport::for_terminal(80, 24, true)))
        );

        let mut out = Recorder::default();
        stage.render_header(&mut out).unwrap();
        assert!(out.rows.is_empty());
    }

    #[test]
    fn test_settings_editor_cycles_field() {
        let (mut stage, _rx) = stage(PathBuf::from("unused.json"));
        stage.set_mode(Mode::Settings);
        assert_eq!(stage.apply(Command::EnterSettings), Outcome::Overlay);
        // First field is Enabled
        let before = stage.settings.layers[0].enabled;
        stage.apply(Command::CycleField(1));
        assert_eq!(stage.settings.layers[0].enabled, !before);

        stage.apply(Command::SelectField(-1));
        let mut out = Recorder::default();
        stage.render_overlay(&mut out).unwrap();
        assert!(out.rows.iter().any(|(_, l)| l.contains("ScrollingColors")));
    }

    #[test]
    fn test_closing_help_redraws() {
        let (mut stage, _rx) = stage(PathBuf::from("unused.json"));
        stage.set_mode(Mode::Help);
        assert_eq!(stage.apply(Command::ToggleHelp), Outcome::Overlay);
        stage.set_mode(Mode::Normal);
        assert_eq!(stage.apply(Command::ToggleHelp), Outcome::Redraw);
    }

    #[test]
    fn test_overlay_suspends_visualizer() {
        let (mut stage, _rx) = stage(PathBuf::from("unused.json"));
        let mut snapshot = AnalysisSnapshot::with_bands(40);
        snapshot.viewport = Viewport::for_terminal(80, 24, false);
        snapshot.bpm = Some(120.0);

        stage.set_mode(Mode::Help);
        let mut out = Recorder::default();
        stage.render(&snapshot, &mut out);
        assert!(out.rows.is_empty());

        stage.set_mode(Mode::Normal);
        stage.render(&snapshot, &mut out);
        assert_eq!(out.rows.len(), 23);

        let mut header = Recorder::default();
        stage.render_header(&mut header).unwrap();
        assert!(header.rows[0].1.contains("120 BPM"));
    }

    #[test]
    fn test_save_writes_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("termviz").join("settings.json");
        let (mut stage, _rx) = stage(path.clone());
        stage.apply(Command::ToggleLayer(1));
        stage.apply(Command::Save);

        let loaded = VisualizerSettings::load_from(&path).unwrap();
        assert_eq!(loaded.layers[1].enabled, stage.settings.layers[1].enabled);
    }
}
