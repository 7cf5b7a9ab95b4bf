//! Capture delivery through analysis to diffed terminal rows

use std::f32::consts::PI;
use std::io;
use std::time::{Duration, Instant};
use termviz_analysis::band_center_hz;
use termviz_audio::{AnalysisEngine, AudioFrame, Viewport};
use termviz_library::{LayerKind, LayerSettings, PaletteSet, VisualizerSettings};
use termviz_tui::{LineWriter, Visualizer};

#[derive(Default)]
struct Terminal {
    writes: Vec<(u16, String)>,
}

impl LineWriter for Terminal {
    fn write_line(&mut self, row: u16, content: &str) -> io::Result<()> {
        self.writes.push((row, content.to_string()));
        Ok(())
    }
}

const SAMPLE_RATE: u32 = 44_100;
const BLOCK: usize = 1024;

/// Feed 16 blocks of a 440 Hz sine, one publish per block
fn analyzed_engine(viewport: Viewport) -> AnalysisEngine {
    let mut engine = AnalysisEngine::new(SAMPLE_RATE, viewport);
    let start = Instant::now();
    for block in 0..16 {
        let samples: Vec<f32> = (0..BLOCK)
            .map(|i| {
                let n = (block * BLOCK + i) as f32;
                0.5 * (2.0 * PI * 440.0 * n / SAMPLE_RATE as f32).sin()
            })
            .collect();
        let frame = AudioFrame::from_f32(&samples, SAMPLE_RATE, 1);
        let now = start + Duration::from_millis(50 * block as u64);
        assert_eq!(engine.ingest(&frame, now), Ok(true));
    }
    engine
}

fn spectrum_only() -> VisualizerSettings {
    VisualizerSettings {
        layers: vec![LayerSettings::new(LayerKind::SpectrumSkin, 0)],
        ..VisualizerSettings::default()
    }
}

fn filled_in_column(vis: &Visualizer, x: usize, height: u16) -> usize {
    (0..height)
        .filter(|&y| vis.row_text(y).chars().nth(x).map_or(false, |c| c != ' '))
        .count()
}

#[test]
fn test_sine_reaches_the_terminal() {
    let viewport = Viewport::for_terminal(80, 24, false);
    let engine = analyzed_engine(viewport);
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.num_bands, 40);

    let loudest = (0..snapshot.num_bands)
        .max_by(|&a, &b| snapshot.smoothed[a].total_cmp(&snapshot.smoothed[b]))
        .unwrap();
    let center = band_center_hz(loudest, snapshot.num_bands);
    assert!((350.0..560.0).contains(&center), "loudest band at {} Hz", center);
    assert!(snapshot.smoothed[loudest] > 5.0 * snapshot.smoothed[0]);
    assert!(snapshot.smoothed[loudest] > 5.0 * snapshot.smoothed[39]);

    let mut vis = Visualizer::with_seed(11);
    let mut terminal = Terminal::default();
    let frame = vis
        .render_frame(snapshot, &spectrum_only(), &PaletteSet::builtin(), &mut terminal)
        .unwrap();
    assert_eq!(frame.layers_drawn, 1);
    assert_eq!(frame.rows_written, 23);
    assert!(terminal.writes.iter().all(|(row, _)| (1..24).contains(row)));

    // 80 columns over 40 bands: two columns per bar
    let peak_bar = filled_in_column(&vis, loudest * 2, viewport.height);
    let low_bar = filled_in_column(&vis, 0, viewport.height);
    assert!(peak_bar > low_bar, "peak {} low {}", peak_bar, low_bar);
}

#[test]
fn test_identical_snapshot_writes_no_rows() {
    let engine = analyzed_engine(Viewport::for_terminal(60, 20, true));
    let settings = spectrum_only();
    let palettes = PaletteSet::builtin();
    let mut vis = Visualizer::with_seed(5);
    let mut terminal = Terminal::default();

    let first = vis
        .render_frame(engine.snapshot(), &settings, &palettes, &mut terminal)
        .unwrap();
    assert_eq!(first.rows_written, 20);
    assert_eq!(terminal.writes[0].0, 0);

    let second = vis
        .render_frame(engine.snapshot(), &settings, &palettes, &mut terminal)
        .unwrap();
    assert_eq!(second.rows_written, 0);
    assert_eq!(terminal.writes.len(), 20);
}

#[test]
fn test_default_template_renders() {
    let engine = analyzed_engine(Viewport::for_terminal(80, 24, false));
    let mut vis = Visualizer::with_seed(2);
    let mut terminal = Terminal::default();
    let frame = vis
        .render_frame(
            engine.snapshot(),
            &VisualizerSettings::default(),
            &PaletteSet::builtin(),
            &mut terminal,
        )
        .unwrap();
    assert_eq!(frame.layers_drawn, 2);
}
