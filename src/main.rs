use anyhow::Context;
use clap::Parser;
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ring_pomodoro::event::{Event, EventReceiver, create_event_channel};
use ring_pomodoro::host::{
    AudioPlayer, DisplaySurface, NotifyAudio, Scheduler, TerminalSurface, TokioScheduler,
    terminal::{self, OnEof},
};
use ring_pomodoro::pomodoro::state::{POMODORO_BREAK_MINUTES, POMODORO_WORK_MINUTES};
use ring_pomodoro::pomodoro::{Configuration, Phase, TimerController};
use ring_pomodoro::ws::{WsSurface, websocket_server};

#[derive(Parser, Debug)]
#[command(author, version, about = "🍅 Pomodoro timer with an animated progress ring")]
struct Args {
    /// Work phase length in minutes
    #[arg(short, long, default_value_t = POMODORO_WORK_MINUTES as i64)]
    work: i64,

    /// Break phase length in minutes
    #[arg(short, long = "break", default_value_t = POMODORO_BREAK_MINUTES as i64)]
    break_minutes: i64,

    /// Serve the timer to a browser over WebSocket instead of the terminal
    #[arg(long)]
    daemon: bool,

    /// WebSocket listen address (daemon mode)
    #[arg(long, default_value = websocket_server::DEFAULT_ADDR)]
    addr: SocketAddr,

    /// Log file, defaults to ~/.local/share/ring_pomodoro/ring_pomodoro.log
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Log to stderr instead of a file
    #[arg(long)]
    log_stderr: bool,

    /// Skip the desktop notification at phase end (the bell still rings)
    #[arg(long)]
    no_notify: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn default_log_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/ring_pomodoro/ring_pomodoro.log")
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));

    if args.log_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let path = args.log.clone().unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// A daemon has no terminal to lose, so closed stdin must not stop it.
fn stdin_policy(daemon: bool) -> OnEof {
    if daemon {
        OnEof::Ignore
    } else {
        OnEof::Shutdown
    }
}

/// Feeds events to the controller until shutdown.
async fn run_controller<D, S, A>(mut controller: TimerController<D, S, A>, mut events: EventReceiver)
where
    D: DisplaySurface,
    S: Scheduler,
    A: AudioPlayer,
{
    while let Some(event) = events.recv().await {
        match event {
            Event::Input(input) => controller.dispatch(input),
            Event::Tick(id) => controller.handle_tick(id),
            Event::Shutdown => break,
        }
    }
    info!("controller stopped");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = Configuration::new(args.work, args.break_minutes);
    info!(
        work = config.minutes(Phase::Work),
        break_minutes = config.minutes(Phase::Break),
        daemon = args.daemon,
        "starting"
    );

    let (events_tx, events_rx) = create_event_channel();
    let scheduler = TokioScheduler::new(events_tx.clone());
    let audio = NotifyAudio::new(true, !args.no_notify);

    tokio::spawn(terminal::read_stdin_commands(
        events_tx.clone(),
        stdin_policy(args.daemon),
    ));

    let ctrl_c_tx = events_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(Event::Shutdown);
        }
    });

    if args.daemon {
        println!("🍅 Ring Pomodoro - Daemon Mode");
        println!("Serving on ws://{}", args.addr);

        let (surface, frames) = WsSurface::new();
        let listener = tokio::net::TcpListener::bind(args.addr)
            .await
            .with_context(|| format!("binding {}", args.addr))?;
        info!(addr = %args.addr, "WebSocket server listening");
        tokio::spawn(async move {
            if let Err(e) = websocket_server::serve(listener, events_tx, frames).await {
                error!(error = %e, "WebSocket server error");
            }
        });

        let controller = TimerController::new(config, surface, scheduler, audio);
        run_controller(controller, events_rx).await;
    } else {
        println!("🍅 Ring Pomodoro");
        println!("======================================================");
        println!("Commands: start | pause | reset | work [min] | break [min] | quit\n");

        let controller = TimerController::new(config, TerminalSurface::stdout(), scheduler, audio);
        run_controller(controller, events_rx).await;
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ring_pomodoro"]).unwrap();
        assert_eq!(args.work, 25);
        assert_eq!(args.break_minutes, 5);
        assert!(!args.daemon);
        assert!(!args.log_stderr);
        assert!(!args.no_notify);
        assert_eq!(args.addr.to_string(), websocket_server::DEFAULT_ADDR);
        assert_eq!(stdin_policy(args.daemon), OnEof::Shutdown);
    }

    #[test]
    fn test_daemon_flags() {
        let args = Args::try_parse_from([
            "ring_pomodoro",
            "--daemon",
            "--addr",
            "127.0.0.1:18765",
            "--break",
            "10",
            "--log-stderr",
            "--no-notify",
            "-v",
        ])
        .unwrap();
        assert!(args.daemon);
        assert_eq!(args.addr.port(), 18765);
        assert_eq!(args.break_minutes, 10);
        assert!(args.log_stderr && args.no_notify && args.verbose);
        assert_eq!(stdin_policy(args.daemon), OnEof::Ignore);
    }

    #[tokio::test]
    async fn test_daemon_outlives_closed_stdin() {
        let (tx, mut rx) = create_event_channel();
        let keep_alive = tx.clone();
        terminal::forward_commands(&b""[..], tx, stdin_policy(true)).await;

        keep_alive.send(Event::Tick(1)).unwrap();
        assert_eq!(rx.recv().await, Some(Event::Tick(1)));
    }
}
