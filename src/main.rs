//! Entry point for the **niri-float-sticky** daemon and its control client.
//!
//! Without `--ipc` the binary runs as a daemon: the niri event stream, the
//! control socket and the signal handler each run on a background thread
//! and feed one queue that the dispatcher drains on the main thread.
//!
//! With `--ipc <ACTION>` it sends one command for the focused window to the
//! running daemon and exits.

use clap::Parser;
use log::{error, info, LevelFilter};
use niri_float_sticky::command::Input;
use niri_float_sticky::config::{control_socket_path, niri_socket_path, Config, ConfigError};
use niri_float_sticky::dispatcher::StickyDispatcher;
use niri_float_sticky::ipc::client::{send_for_focused, ClientError};
use niri_float_sticky::ipc::listener::ControlListener;
use niri_float_sticky::ipc::ControlError;
use niri_float_sticky::niri::compositor::NiriCompositor;
use niri_float_sticky::niri::events::NiriEventSource;
use niri_float_sticky::niri::NiriError;
use niri_float_sticky::traits::InputSource;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::mpsc;
use std::thread::JoinHandle;

/// Keep floating niri windows on the active workspace.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Send a command to the running daemon: set_sticky, unset_sticky,
    /// toggle_sticky.
    #[arg(long, value_name = "ACTION")]
    ipc: Option<String>,

    /// Disable automatic stickiness for floating windows.
    #[arg(long)]
    disable_auto_stick: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Allow moving windows to workspaces on other monitors.
    #[arg(long)]
    allow_moving_to_foreign_monitors: bool,

    /// Only move floating windows whose app id matches this pattern
    /// (repeatable).
    #[arg(long = "app-id", value_name = "PATTERN")]
    app_id: Vec<String>,

    /// Only move floating windows whose title matches this pattern
    /// (repeatable).
    #[arg(long, value_name = "PATTERN")]
    title: Vec<String>,
}

/// Fatal daemon startup errors.
#[derive(Debug, thiserror::Error)]
enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open niri event stream: {0}")]
    Niri(#[from] NiriError),
    #[error("failed to start ipc: {0}")]
    Control(#[from] ControlError),
    #[error("failed to install signal handler: {0}")]
    Signals(#[from] std::io::Error),
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let result = match &args.ipc {
        Some(action) => run_client(action).map_err(|e| e.to_string()),
        None => run_daemon(&args).map_err(|e| e.to_string()),
    };
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Log to stdout at `info`, or `debug` with `--debug`.  `RUST_LOG` still
/// overrides per module.
fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .init();
}

/// One-shot control mode.
fn run_client(action: &str) -> Result<(), ClientError> {
    // Reject a bad action name before touching any socket.
    action.parse::<niri_float_sticky::command::StickyAction>()?;
    let socket = control_socket_path()?;
    let compositor = NiriCompositor::from_env().map_err(|e| match e {
        NiriError::Config(e) => ClientError::Config(e),
        other => ClientError::FocusedWindow(other.to_string()),
    })?;
    send_for_focused(&compositor, action, &socket)?;
    Ok(())
}

/// Normal daemon mode.
fn run_daemon(args: &Args) -> Result<(), DaemonError> {
    let config = Config::new(
        !args.disable_auto_stick,
        args.allow_moving_to_foreign_monitors,
        &args.app_id,
        &args.title,
    )?;
    let niri_path = niri_socket_path()?;
    let control_path = control_socket_path()?;

    info!("starting niri-float-sticky daemon...");

    let events = NiriEventSource::connect(&niri_path)?;
    let events_stop = events.stop_handle();
    let control = ControlListener::bind(&control_path)?;
    let control_stop = control.stop_handle();

    let (tx, rx) = mpsc::channel::<Input>();

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let signals_handle = signals.handle();
    {
        let tx = tx.clone();
        std::thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!("received signal {}", signal);
                let _ = tx.send(Input::Shutdown);
            }
        });
    }

    let event_thread = spawn_source("niri event stream", events, tx.clone());
    let control_thread = spawn_source("control socket", control, tx);

    let mut dispatcher = StickyDispatcher::from_config(NiriCompositor::new(&niri_path), &config);
    dispatcher.run(rx);

    control_stop.stop();
    events_stop.stop();
    signals_handle.close();
    for handle in [control_thread, event_thread] {
        if handle.join().is_err() {
            error!("input source thread panicked");
        }
    }
    Ok(())
}

fn spawn_source<S>(name: &'static str, mut source: S, tx: mpsc::Sender<Input>) -> JoinHandle<()>
where
    S: InputSource + 'static,
{
    std::thread::spawn(move || {
        if let Err(e) = source.run(tx) {
            error!("{} error: {}", name, e);
        }
    })
}
