//! Pomodoro Cube CLI
//!
//! Drives the shared focus timer from a terminal:
//! - start / pause / resume / stop write the shared record and notify every
//!   surface before exiting
//! - status, watch and widget render the record the same way every other
//!   surface does
//! - mode and custom edit the cube settings kept beside the record
//! - companion runs the paired-device listener and its own countdown

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;

use pomodoro_cube::cli::{Cli, Commands, CompanionArgs, Display, StartArgs};
use pomodoro_cube::companion::{
    CompanionEvent, CompanionListener, CompanionSession, WatchModel, WatchTick,
};
use pomodoro_cube::config::CubeSettings;
use pomodoro_cube::{
    derive, AppGroup, CubeMode, Intent, PollOutcome, SystemClock, TimerStore, WidgetHost,
};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence; otherwise `--verbose` selects debug.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Completions { shell } => generate_completions(shell),
        Commands::Faces { mode } => show_faces(&open_group()?, mode)?,
        Commands::Status => show_status(&open_group()?)?,
        Commands::Watch => watch(&open_group()?).await?,
        Commands::Widget => show_widget(&open_group()?).await?,
        Commands::Companion(args) => run_companion(&open_group()?, &args).await?,
        command => mutate(&open_group()?, &command).await?,
    }

    Ok(())
}

fn open_group() -> Result<AppGroup> {
    AppGroup::open().context("設定を読み込めません")
}

/// Runs a mutating command, then delivers every resulting change.
async fn mutate(group: &AppGroup, command: &Commands) -> Result<()> {
    let (change_tx, change_rx) = mpsc::unbounded_channel();
    let controller = group
        .controller(change_tx)
        .context("タイマーストアを開けません")?;
    let fanout = group.fanout().context("タイマーストアを開けません")?;
    let mut settings = group.cube_settings()?;

    match command {
        Commands::Start(StartArgs {
            face: Some(name),
            mode,
            ..
        }) => {
            let catalog = CubeSettings {
                mode: mode.unwrap_or(settings.mode),
                ..settings
            }
            .catalog();
            let face = catalog
                .find_by_name(name)
                .with_context(|| {
                    format!(
                        "フェイス「{}」は {} モードにありません",
                        name,
                        catalog.mode().as_str()
                    )
                })?
                .clone();
            let record = controller.select_face(&face);
            Display::show_face_started(&face, &record, &controller.derived());
        }
        Commands::Mode { mode } => {
            settings.mode = *mode;
            group.save_cube_settings(&settings)?;
            let mut catalog = settings.catalog();
            controller.change_mode(&mut catalog, *mode);
            Display::show_stopped();
            Display::show_faces(catalog.mode(), settings.catalog().faces());
        }
        Commands::Custom { minutes } => {
            // The selection comes from the record, matched against the
            // durations in effect before this edit.
            let mut catalog = settings.catalog();
            let record = controller.read();
            if derive(&record, Utc::now()).display_state.is_active() {
                catalog.restore_from(&record);
            }

            settings.custom_minutes = Some(*minutes);
            group.save_cube_settings(&settings)?;
            Display::show_custom_updated(*minutes);

            if let Some(record) = controller.update_custom_duration(&mut catalog, *minutes) {
                if let Some(face) = catalog.selected() {
                    Display::show_face_started(face, &record, &controller.derived());
                }
            }
        }
        command => {
            let intent = command
                .intent()
                .with_context(|| format!("{:?} はタイマー操作ではありません", command))?;
            let record = intent.perform(&controller);
            let derived = derive(&record, Utc::now());
            match intent {
                Intent::StartFromIdle | Intent::StartWithDuration { .. } => {
                    Display::show_started(&record, &derived)
                }
                Intent::Pause => Display::show_paused(&derived),
                Intent::Resume => Display::show_resumed(&derived),
                Intent::Stop => Display::show_stopped(),
            }
        }
    }

    // Closing the last sender lets the fan-out drain and return.
    drop(controller);
    fanout.run(change_rx).await;
    Ok(())
}

fn show_faces(group: &AppGroup, mode: Option<CubeMode>) -> Result<()> {
    let settings = group.cube_settings()?;
    let catalog = CubeSettings {
        mode: mode.unwrap_or(settings.mode),
        ..settings
    }
    .catalog();
    Display::show_faces(catalog.mode(), catalog.faces());
    Ok(())
}

fn show_status(group: &AppGroup) -> Result<()> {
    let record = group.store()?.read();
    let derived = derive(&record, Utc::now());
    let mut catalog = group.cube_settings()?.catalog();
    let face = if derived.display_state.is_active() {
        catalog.restore_from(&record)
    } else {
        None
    };
    let activities = group.live_display()?.activities();
    Display::show_status(&record, &derived, face, &activities);
    Ok(())
}

/// Follows the timer until it finishes or Ctrl-C is pressed.
async fn watch(group: &AppGroup) -> Result<()> {
    let mut poller = group.poller()?;
    let initial = poller.restore();
    Display::show_tick(&initial);
    if !initial.display_state.is_active() {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let poll = poller.run(group.config().poll_interval(), tx);
    let print = async {
        let mut shown = initial;
        while let Some(outcome) = rx.recv().await {
            match outcome {
                PollOutcome::Changed(derived) => {
                    Display::show_tick(&derived);
                    shown = derived;
                }
                PollOutcome::Tick(derived) if derived.display_seconds() != shown.display_seconds() => {
                    Display::show_tick(&derived);
                    shown = derived;
                }
                PollOutcome::Finished => Display::show_finished(),
                PollOutcome::Tick(_) | PollOutcome::Idle => {}
            }
        }
    };

    tokio::select! {
        _ = async { tokio::join!(poll, print) } => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("監視を中断しました");
        }
    }
    Ok(())
}

async fn show_widget(group: &AppGroup) -> Result<()> {
    let host = group.widget_host(SystemClock)?;
    host.reload_all_timelines().await?;
    Display::show_timeline(&host.timeline());
    Ok(())
}

/// Runs the companion listener with its own countdown model.
async fn run_companion(group: &AppGroup, args: &CompanionArgs) -> Result<()> {
    let mut model = WatchModel::new();
    if let Some(name) = &args.face {
        if !model.select_by_name(name) {
            anyhow::bail!("コンパニオンにフェイス「{}」はありません", name);
        }
    }

    let path = group.companion_socket();
    let listener = CompanionListener::bind(&path)
        .with_context(|| format!("コンパニオンを起動できません: {}", path.display()))?;

    println!("コンパニオンを待ち受けています: {}", path.display());
    if let Some(face) = model.selected_face() {
        println!("  フェイス: {}", face.name);
    }
    if args.start && model.start() {
        Display::show_watch_tick(model.time_remaining());
    }

    let session =
        CompanionSession::new(listener, model, SystemClock).with_exit_on_finish(args.exit_on_finish);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let run = session.run(tx);
    let print = async {
        while let Some(event) = rx.recv().await {
            match event {
                CompanionEvent::Phone { view, .. } => Display::show_phone_view(&view),
                CompanionEvent::Tick(WatchTick::Ticked(seconds)) => {
                    Display::show_watch_tick(seconds)
                }
                CompanionEvent::Tick(WatchTick::Completed) => Display::show_finished(),
                CompanionEvent::Tick(WatchTick::Idle) => {}
            }
        }
    };

    tokio::select! {
        _ = async { tokio::join!(run, print) } => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("コンパニオンを終了しました");
        }
    }
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
