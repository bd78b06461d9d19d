mod app;
mod cli;
mod command;
mod config;
mod external;
mod input;
mod message;
mod model;
mod panel;
mod panels;
mod ui;
mod widgets;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use cli::CliArgs;
use command::Command;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use futures::StreamExt;
use message::Message;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
const MIN_TICK_MS: u64 = 250;
const SPINNER_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, &args.log_file)?;
    info!("phantom starting tick_ms={}", args.tick_ms);

    let mut app = App::new();
    run(&mut app, &args).await
}

fn init_tracing(level_filter: &str, log_file: &Path) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    // stdout belongs to the TUI.
    let writer = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(std::io::sink),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .with_writer(writer)
        .try_init();

    Ok(())
}

async fn run(app: &mut App, args: &CliArgs) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, args).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(terminal: &mut TuiTerminal, app: &mut App, args: &CliArgs) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let startup = app.init(args.config.clone());
    run_commands(terminal, app, &tx, startup).await?;
    match crossterm::terminal::size() {
        Ok((width, height)) => {
            dispatch(terminal, app, &tx, Message::Resize { width, height }).await?;
        }
        Err(error) => warn!("failed to read terminal size: {error}"),
    }

    let mut reader = EventStream::new();
    let mut ticker = interval(Duration::from_millis(args.tick_ms.max(MIN_TICK_MS)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut spinner = interval(SPINNER_INTERVAL);
    spinner.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        let message = tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        Message::Key(key)
                    }
                    Some(Ok(Event::Resize(width, height))) => Message::Resize { width, height },
                    Some(Ok(_)) => continue,
                    Some(Err(error)) => {
                        warn!("terminal event error: {error}");
                        continue;
                    }
                    None => {
                        info!("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => Message::Tick,
            _ = spinner.tick() => Message::SpinnerTick,
            maybe_message = rx.recv() => {
                let Some(message) = maybe_message else {
                    break;
                };
                message
            }
        };

        dispatch(terminal, app, &tx, message).await?;
    }

    Ok(())
}

async fn dispatch(
    terminal: &mut TuiTerminal,
    app: &mut App,
    tx: &UnboundedSender<Message>,
    message: Message,
) -> Result<()> {
    if !matches!(message, Message::SpinnerTick | Message::Tick) {
        debug!("message={message:?}");
    }
    let commands = app.update(message);
    run_commands(terminal, app, tx, commands).await
}

/// Spawns background commands; foreground ones run inline with the UI
/// suspended and their result is fed straight back into the app.
async fn run_commands(
    terminal: &mut TuiTerminal,
    app: &mut App,
    tx: &UnboundedSender<Message>,
    commands: Vec<Command>,
) -> Result<()> {
    let mut pending = VecDeque::from(commands);
    while let Some(command) = pending.pop_front() {
        if command.is_foreground() {
            suspend_terminal_for_subprocess(terminal)?;
            let result = command.execute().await;
            resume_terminal_after_subprocess(terminal)?;
            if let Some(message) = result {
                pending.extend(app.update(message));
            }
            continue;
        }

        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(message) = command.execute().await {
                let _ = tx.send(message);
            }
        });
    }
    Ok(())
}

fn suspend_terminal_for_subprocess(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode for subprocess")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen for subprocess")?;
    terminal
        .show_cursor()
        .context("failed to show cursor for subprocess")?;
    Ok(())
}

fn resume_terminal_after_subprocess(terminal: &mut TuiTerminal) -> Result<()> {
    enable_raw_mode().context("failed to re-enable raw mode after subprocess")?;
    execute!(terminal.backend_mut(), EnterAlternateScreen, EnableMouseCapture)
        .context("failed to re-enter alternate screen after subprocess")?;
    terminal
        .clear()
        .context("failed to clear terminal after subprocess")?;
    Ok(())
}
