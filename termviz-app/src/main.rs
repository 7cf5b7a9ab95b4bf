//! termviz - real-time audio visualizer for the terminal
//!
//! Captures an input device, analyzes it, and draws layered character-grid
//! visualizations at ~20 frames per second.

mod capture;
mod stage;

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use cpal::traits::StreamTrait;
use crossbeam_channel::{select, tick, Receiver};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event},
    execute, queue,
    terminal::{
        self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use termviz_audio::{AnalysisEngine, Viewport};
use termviz_input::InputHandler;
use termviz_library::{PaletteSet, VisualizerSettings};
use termviz_tui::Visualizer;

use stage::{Outcome, RenderStage, Shared, TerminalWriter};

/// Header refresh cadence
const HEADER_INTERVAL: Duration = Duration::from_millis(50);
/// Key poll timeout
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "termviz")]
#[command(version)]
#[command(about = "Real-time audio visualizer for the terminal", long_about = None)]
struct Cli {
    /// Capture from the first input device whose name contains this text
    #[arg(short, long)]
    device: Option<String>,

    /// List input devices and exit
    #[arg(short, long)]
    list_devices: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Random seed for reproducible animations
    #[arg(long)]
    seed: Option<u64>,

    /// Start without the header line
    #[arg(short, long)]
    full_screen: bool,
}

/// Log to a file under the user data directory; the terminal belongs to
/// the visualizer
fn init_logging() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("termviz");
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let path = dir.join("termviz.log");
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(path)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_devices {
        return capture::list_input_devices();
    }

    let log_path = init_logging()?;
    info!(log = %log_path.display(), "termviz starting");

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(VisualizerSettings::config_path);
    let settings = VisualizerSettings::load_or_default(&settings_path);
    let palettes = PaletteSet::load();
    info!(
        path = %settings_path.display(),
        layers = settings.layers.len(),
        palettes = palettes.len(),
        "settings loaded"
    );

    let device = capture::select_device(cli.device.as_deref())?;

    let (cols, rows) = terminal::size()?;
    let full_screen = cli.full_screen || !settings.show_header;
    let viewport = Viewport::for_terminal(cols, rows, full_screen);
    let sensitivity = settings.beat_sensitivity;

    let visualizer = match cli.seed {
        Some(seed) => Visualizer::with_seed(seed),
        None => Visualizer::new(),
    };
    let (engine_tx, engine_rx) = AnalysisEngine::create_channel();
    let shared = Arc::new(Shared::new(RenderStage::new(
        visualizer,
        settings,
        palettes,
        settings_path,
        engine_tx,
        viewport,
    )));

    let stream = capture::open_stream(&device, viewport, sensitivity, engine_rx, shared.clone())?;

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

    let result = run(&shared, &stream);

    // Cleanup
    if let Err(e) = stream.pause() {
        warn!(error = %e, "failed to pause capture stream");
    }
    drop(stream);
    info!("capture stopped");

    shared.render.lock().save();

    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;

    result
}

fn run(shared: &Arc<Shared>, stream: &cpal::Stream) -> anyhow::Result<()> {
    stream.play().context("failed to start capture stream")?;
    info!("capture started");

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
    let header = spawn_header_task(shared.clone(), shutdown_rx)?;

    let result = input_loop(shared);

    // Disconnecting the channel stops the header task
    drop(shutdown_tx);
    if header.join().is_err() {
        warn!("header task panicked");
    }
    result
}

/// Redraw the header on a fixed interval until `shutdown` disconnects
fn spawn_header_task(shared: Arc<Shared>, shutdown: Receiver<()>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("termviz-header".to_string())
        .spawn(move || {
            let ticker = tick(HEADER_INTERVAL);
            let mut out = TerminalWriter::new();
            loop {
                select! {
                    recv(ticker) -> _ => {
                        let mut stage = shared.render.lock();
                        if let Err(e) = stage.render_header(&mut out).and_then(|_| out.flush()) {
                            debug!(error = %e, "header write failed");
                        }
                    }
                    recv(shutdown) -> _ => break,
                }
            }
            debug!("header task stopped");
        })
}

fn input_loop(shared: &Shared) -> anyhow::Result<()> {
    let mut input = InputHandler::new();
    let mut out = TerminalWriter::new();

    loop {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                let Some(command) = input.handle_key(key) else {
                    continue;
                };
                debug!(?command, "key command");
                let _console = shared.console.lock();
                let mut stage = shared.render.lock();
                stage.set_mode(input.mode());
                match stage.apply(command) {
                    Outcome::Quit => break,
                    Outcome::Overlay => {
                        stage.render_overlay(&mut out)?;
                        out.flush()?;
                    }
                    Outcome::Redraw => redraw(&mut stage, &mut out)?,
                    Outcome::None => {}
                }
            }
            Event::Resize(cols, rows) => {
                let _console = shared.console.lock();
                let mut stage = shared.render.lock();
                stage.resize(cols, rows);
                redraw(&mut stage, &mut out)?;
            }
            _ => {}
        }
    }

    info!("quit requested");
    Ok(())
}

/// Clear the terminal and repaint everything on the next frame
fn redraw(stage: &mut RenderStage, out: &mut TerminalWriter) -> io::Result<()> {
    queue!(out.inner(), Clear(ClearType::All))?;
    stage.invalidate();
    stage.render_overlay(out)?;
    out.flush()
}
