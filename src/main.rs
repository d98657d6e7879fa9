mod app;
mod checklist;
mod clock;
mod config;
mod fireworks;
mod logging;
mod render;
mod routine;
mod snippets;
mod ui;
mod watch;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor, execute, terminal,
    event::{self, Event, KeyEvent, KeyEventKind},
};

use app::{Action, App};
use fireworks::{Animator, Surface};
use render::{Canvas, ColorMode, RenderMode, TextLayer};
use routine::Routine;
use snippets::Fetched;
use watch::RoutineWatcher;

type Fireworks = Animator<Canvas, rand::rngs::ThreadRng>;

#[derive(Parser)]
#[command(name = "daybreak", version, about = "Terminal morning-routine board")]
struct Cli {
    /// Routine JSON file (defaults to the built-in routine)
    routine: Option<PathBuf>,

    /// Render mode for the fireworks
    #[arg(short, long, value_enum)]
    render: Option<RenderMode>,

    /// Color mode
    #[arg(short, long, value_enum)]
    color: Option<ColorMode>,

    /// Target FPS (1-120)
    #[arg(short, long)]
    fps: Option<u32>,

    /// Start the clock at this time instead of now (HH:MM:SS)
    #[arg(short, long)]
    time: Option<String>,

    /// When the trivia answer is revealed, e.g. "7:20 AM"
    #[arg(long)]
    trivia_reveal: Option<String>,

    /// Do not fetch the joke and trivia question
    #[arg(long)]
    offline: bool,

    /// Never show fireworks
    #[arg(long)]
    no_fireworks: bool,

    /// Hide the status bar
    #[arg(long)]
    clean: bool,

    /// Color quantization step (0 = off, 4/8/16 = coarser colors)
    #[arg(long)]
    color_quant: Option<u8>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write a commented default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Print the config file path and exit
    #[arg(long)]
    show_config: bool,
}

/// CLI flags layered over the config file.
struct Settings {
    render: RenderMode,
    color: ColorMode,
    frame_dur: Duration,
    clean: bool,
    color_quant: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref()).context("failed to set up logging")?;

    if cli.show_config {
        match config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("No config directory on this platform"),
        }
        return Ok(());
    }
    if cli.init_config {
        let path = config::init_config()?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let cfg = config::load_config();
    let fps = cli.fps.or(cfg.fps).unwrap_or(30).clamp(1, 120);
    let settings = Settings {
        render: cli.render.or(cfg.render.map(Into::into)).unwrap_or(RenderMode::Braille),
        color: cli.color.or(cfg.color.map(Into::into)).unwrap_or(ColorMode::TrueColor),
        frame_dur: Duration::from_secs_f64(1.0 / fps as f64),
        clean: cli.clean || cfg.clean.unwrap_or(false),
        color_quant: cli.color_quant.or(cfg.color_quant).unwrap_or(0),
    };
    let offline = cli.offline || cfg.offline.unwrap_or(false);
    let trivia_reveal = snippets::reveal_minutes(
        cli.trivia_reveal.as_deref().or(cfg.trivia_reveal.as_deref()),
    );

    let mut clock = clock::Clock::new();
    if let Some(time) = &cli.time {
        clock.set_custom_time(time)?;
    }

    let routine_path = cli.routine.clone().or_else(|| cfg.routine_path());
    let loaded = match &routine_path {
        Some(path) => Routine::load(path),
        None => Ok(Routine::builtin()),
    };
    let watcher = match &routine_path {
        Some(path) => RoutineWatcher::spawn(path)
            .inspect_err(|e| tracing::warn!(error = %e, "routine will not reload on change"))
            .ok(),
        None => None,
    };
    let app = App::new(loaded, clock, !offline, trivia_reveal);

    let (cols, rows) = terminal::size()?;
    let surface = (!cli.no_fireworks)
        .then(|| Canvas::new(cols as usize, rows as usize, settings.render, settings.color));
    let fireworks: Fireworks = Animator::new(cfg.fireworks(), surface, rand::rng());

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

    let mut writer = BufWriter::with_capacity(256 * 1024, stdout);
    let result = run_loop(&mut writer, settings, app, fireworks, watcher);

    // Cleanup: run both steps even if the first fails
    let restored = execute!(writer, cursor::Show, terminal::LeaveAlternateScreen);
    let raw_off = terminal::disable_raw_mode();

    if let Err(e) = &result {
        tracing::error!(error = %e, "board exited with error");
    }
    first_failure(result, [restored, raw_off])
}

/// The loop's own error wins over cleanup errors; cleanup errors are
/// reported in the order the steps ran.
fn first_failure(result: anyhow::Result<()>, cleanup: [io::Result<()>; 2]) -> anyhow::Result<()> {
    result?;
    for step in cleanup {
        step?;
    }
    Ok(())
}

const RENDER_MODES: [RenderMode; 2] = [RenderMode::Braille, RenderMode::HalfBlock];
const COLOR_MODES: [ColorMode; 4] = [ColorMode::TrueColor, ColorMode::Ansi256, ColorMode::Ansi16, ColorMode::Mono];

/// The canvas the frame is composited with: the fireworks surface, or a
/// never-visible stand-in when fireworks are off.
fn canvas_mut<'a>(fireworks: &'a mut Fireworks, backdrop: &'a mut Canvas) -> &'a mut Canvas {
    match fireworks.surface_mut() {
        Some(canvas) => canvas,
        None => backdrop,
    }
}

/// Start or stop the celebration to match the checklist.
fn sync_fireworks(app: &App, fireworks: &mut Fireworks) {
    if app.is_complete() {
        fireworks.start();
    } else {
        fireworks.stop();
    }
}

fn run_loop(
    stdout: &mut BufWriter<io::Stdout>,
    settings: Settings,
    mut app: App,
    mut fireworks: Fireworks,
    watcher: Option<RoutineWatcher>,
) -> anyhow::Result<()> {
    let (mut cols, mut rows) = terminal::size()?;
    let mut render_mode = settings.render;
    let mut color_mode = settings.color;
    let mut hide_status = settings.clean;
    let frame_dur = settings.frame_dur;

    let display_rows = |rows: u16, hide: bool| {
        if hide { rows as usize } else { (rows as usize).saturating_sub(1) }
    };

    let mut backdrop = Canvas::new(0, 0, render_mode, color_mode);
    for canvas in [fireworks.surface_mut(), Some(&mut backdrop)].into_iter().flatten() {
        canvas.color_quant = settings.color_quant;
    }
    fireworks.viewport_resized(cols as usize, display_rows(rows, hide_status));
    backdrop.fit_viewport(cols as usize, display_rows(rows, hide_status));
    let mut text = TextLayer::new(cols as usize, rows as usize);

    let mut snippet_rx: Option<Receiver<Fetched>> = app.snippets.is_some().then(snippets::spawn_fetch);

    let mut frame_count: u64 = 0;
    let mut actual_fps: f64 = 0.0;
    let mut fps_update = Instant::now();

    // Track if we need to rebuild the layers
    let mut rebuild = false;

    loop {
        // Handle input (non-blocking)
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Resize(w, h) => {
                    if w >= 10 && h >= 5 {
                        cols = w;
                        rows = h;
                        rebuild = true;
                    }
                }
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => {
                    match app.handle_key(code) {
                        Action::Quit => return Ok(()),
                        Action::Refetch => {
                            tracing::info!("refetching snippets");
                            snippet_rx = Some(snippets::spawn_fetch());
                        }
                        Action::CycleRender => {
                            let idx = RENDER_MODES.iter().position(|&m| m == render_mode).unwrap_or(0);
                            render_mode = RENDER_MODES[(idx + 1) % RENDER_MODES.len()];
                            canvas_mut(&mut fireworks, &mut backdrop).set_render_mode(render_mode);
                            rebuild = true;
                        }
                        Action::CycleColor => {
                            let idx = COLOR_MODES.iter().position(|&m| m == color_mode).unwrap_or(0);
                            color_mode = COLOR_MODES[(idx + 1) % COLOR_MODES.len()];
                            canvas_mut(&mut fireworks, &mut backdrop).color_mode = color_mode;
                            rebuild = true;
                        }
                        Action::ToggleStatus => {
                            hide_status = !hide_status;
                            rebuild = true;
                        }
                        Action::None => {}
                    }
                    sync_fireworks(&app, &mut fireworks);
                }
                _ => {}
            }
        }

        if let Some(reloaded) = watcher.as_ref().and_then(RoutineWatcher::latest) {
            app.set_routine(reloaded);
            sync_fireworks(&app, &mut fireworks);
        }
        if let Some(rx) = &snippet_rx {
            for fetched in rx.try_iter() {
                app.apply_snippet(fetched);
            }
        }

        // Rebuild layers if mode changed or terminal resized
        if rebuild && cols >= 10 && rows >= 5 {
            // Re-read size to get the settled value
            let (settled_cols, settled_rows) = terminal::size()?;
            if settled_cols >= 10 && settled_rows >= 5 {
                cols = settled_cols;
                rows = settled_rows;
            }
            let body = display_rows(rows, hide_status);
            fireworks.viewport_resized(cols as usize, body);
            backdrop.fit_viewport(cols as usize, body);
            text = TextLayer::new(cols as usize, rows as usize);
            // Reset terminal state completely
            write!(stdout, "\x1b[2J\x1b[H")?;
            stdout.flush()?;
            rebuild = false;
        }

        let frame_start = Instant::now();

        // Advance the fireworks by one display frame
        fireworks.on_frame();

        let status_line = (!hide_status).then(|| ui::Status {
            render: match render_mode {
                RenderMode::Braille => "Braille",
                RenderMode::HalfBlock => "HalfBlock",
            },
            color: match color_mode {
                ColorMode::Mono => "Mono",
                ColorMode::Ansi16 => "Ansi16",
                ColorMode::Ansi256 => "Ansi256",
                ColorMode::TrueColor => "TrueColor",
            },
            fps: actual_fps,
        });
        ui::draw(&mut text, &app, status_line.as_ref());
        let frame = fireworks.surface().unwrap_or(&backdrop).compose(&text);

        // Verify terminal size hasn't changed before writing
        // If it changed, skip this frame to avoid writing wrong-sized data
        let (check_cols, check_rows) = terminal::size()?;
        if check_cols != cols || check_rows != rows {
            cols = check_cols;
            rows = check_rows;
            rebuild = true;
            // Sleep briefly to let terminal settle
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }

        // Build entire frame into buffer before flushing
        stdout.write_all(b"\x1b[H")?;
        stdout.write_all(frame.as_bytes())?;
        stdout.flush()?;

        frame_count += 1;
        if fps_update.elapsed() >= Duration::from_secs(1) {
            actual_fps = frame_count as f64 / fps_update.elapsed().as_secs_f64();
            frame_count = 0;
            fps_update = Instant::now();
        }

        // Sleep to target FPS
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}
