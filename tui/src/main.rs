//! Face TUI Entry Point
//!
//! Shows the companion face in the terminal and runs the demo script.
//!
//! Usage:
//!   face-tui [OPTIONS]
//!
//! Options:
//!   --procedural          Draw the procedural face instead of sprites
//!   --images <DIR>        Sprite directory
//!   --fps <N>             Frame rate
//!   --no-mouse            Disable touch gestures
//!   --no-demo             Do not run the demo script
//!
//! Logs go to `face-tui.log` in the working directory (the terminal belongs
//! to the face); set `RUST_LOG` to change the level.

use std::fs::File;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::DisableMouseCapture,
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expression_core::{load_config, ConfigOverrides, EmotionDisplay};
use face_tui::script::{effect_player, run_demo};
use face_tui::theme::{ACCENT_ANSI, RESET_ANSI};
use face_tui::TerminalDisplay;

/// How often the main task checks whether the render loop has ended
const WATCH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct Args {
    overrides: ConfigOverrides,
    mouse: bool,
    demo: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        mouse: true,
        demo: true,
        ..Args::default()
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--procedural" => args.overrides = args.overrides.with_procedural(true),
            "--no-mouse" => {
                args.mouse = false;
                args.overrides = args.overrides.with_touch_enabled(false);
            }
            "--no-demo" => args.demo = false,
            "--images" => {
                let dir = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--images needs a directory"))?;
                args.overrides = args.overrides.with_image_dir(PathBuf::from(dir));
            }
            "--fps" => {
                let fps = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--fps needs a number"))?
                    .parse()?;
                args.overrides = args.overrides.with_fps(fps);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    // Set up logging to a file
    let log_file = File::create("face-tui.log")?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    use std::io::IsTerminal;
    if !io::stdout().is_terminal() {
        eprintln!("face-tui requires a terminal (TTY)");
        std::process::exit(1);
    }

    let mut config = load_config()?;
    args.overrides.apply(&mut config)?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let surface = TerminalDisplay::interactive(terminal, args.mouse);
    let mut display = EmotionDisplay::new(config, Box::new(surface))?;

    let controller = display.controller();
    display.set_effect_callback(effect_player(controller.clone(), tokio::runtime::Handle::current()));
    display.set_exit_callback(|| {
        tracing::info!("Exit button pressed, shutting down");
        Ok(())
    });

    let result = run(&mut display, args.demo).await;

    // Restore terminal
    display.cleanup();

    let stats = display.stats();
    tracing::info!(
        frames = stats.frames_presented,
        gestures = stats.gestures_recognized,
        effects = stats.effects_dispatched,
        dropped = stats.commands_dropped,
        "Session finished"
    );
    println!("\n{ACCENT_ANSI}companion-face:{RESET_ANSI} bye!\n");

    result
}

async fn run(display: &mut EmotionDisplay, demo: bool) -> anyhow::Result<()> {
    display.start()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let demo_task = demo.then(|| tokio::spawn(run_demo(display.controller(), shutdown_rx)));

    // Run until the face quits (q / Esc / exit button) or Ctrl-C arrives
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(WATCH_INTERVAL);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
            _ = ticker.tick() => {
                if !display.is_running() {
                    break;
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    if let Some(task) = demo_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Demo task ended abnormally");
        }
    }
    display.stop();
    Ok(())
}
