mod app;
mod config_store;
mod core;
mod engine;
mod event_emitter;
mod ipc;
#[cfg(target_os = "macos")]
mod macos;
mod platform;

use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;
use config_store::{ConfigStore, JsonConfigStore};
use hanare_ipc::{Command, EventFilter, Response};
use ipc::IpcClient;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hanare - keeps always-on-top windows out of the cursor's way
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Status(StatusCmd),
    ListWindows(ListWindowsCmd),
    GetConfig(GetConfigCmd),
    ReloadConfig(ReloadConfigCmd),
    CheckConfig(CheckConfigCmd),
    Pause(PauseCmd),
    Resume(ResumeCmd),
    Subscribe(SubscribeCmd),
    Quit(QuitCmd),
}

/// Start the hanare daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Show engine status
#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
struct StatusCmd {}

/// List tracked windows
#[derive(FromArgs)]
#[argh(subcommand, name = "list-windows")]
struct ListWindowsCmd {}

/// Print the running configuration as JSON
#[derive(FromArgs)]
#[argh(subcommand, name = "get-config")]
struct GetConfigCmd {}

/// Reload the configuration file
#[derive(FromArgs)]
#[argh(subcommand, name = "reload-config")]
struct ReloadConfigCmd {}

/// Validate a configuration file without touching the daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "check-config")]
struct CheckConfigCmd {
    /// config file (defaults to the file the daemon would load)
    #[argh(positional)]
    path: Option<PathBuf>,
}

/// Stop pushing windows until resumed
#[derive(FromArgs)]
#[argh(subcommand, name = "pause")]
struct PauseCmd {}

/// Resume pushing windows
#[derive(FromArgs)]
#[argh(subcommand, name = "resume")]
struct ResumeCmd {}

/// Stream engine events as JSON lines
#[derive(FromArgs)]
#[argh(subcommand, name = "subscribe")]
struct SubscribeCmd {
    /// send the current state first
    #[argh(switch)]
    snapshot: bool,
    /// engine started/stopped events
    #[argh(switch)]
    lifecycle: bool,
    /// window pushed events
    #[argh(switch)]
    windows: bool,
    /// performance samples
    #[argh(switch)]
    performance: bool,
    /// configuration updates
    #[argh(switch)]
    configuration: bool,
}

/// Quit the hanare daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            let args: Vec<&str> = vec!["hanare", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(_)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("hanare {} starting", VERSION);
            app::App::run()
        }
        Some(SubCommand::Version(_)) => {
            println!("hanare {}", VERSION);
            Ok(())
        }
        Some(SubCommand::CheckConfig(cmd)) => check_config(cmd.path),
        Some(SubCommand::Subscribe(cmd)) => {
            let filter = EventFilter {
                lifecycle: cmd.lifecycle,
                windows: cmd.windows,
                performance: cmd.performance,
                configuration: cmd.configuration,
            };
            ipc::subscribe_and_print(cmd.snapshot, Some(filter))
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

fn check_config(path: Option<PathBuf>) -> Result<()> {
    let store = match path {
        Some(path) => JsonConfigStore::new(path),
        None => JsonConfigStore::discover(),
    };
    let config = store.load()?;
    println!("{:?}: ok", store.path());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd);
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Status { status } => {
            println!("Engine: {}", status.lifecycle);
            println!("Tracked windows: {}", status.tracked_windows);
            println!("Monitors: {}", status.monitors);
            println!("Override active: {}", status.override_active);
        }
        Response::Windows { windows } => {
            for w in windows {
                println!(
                    "{}: {} - {} [{}x{} @ ({},{})] {}{}{}",
                    w.id,
                    w.owner_name,
                    w.title,
                    w.width,
                    w.height,
                    w.x,
                    w.y,
                    w.hover_state,
                    if w.is_topmost { " topmost" } else { "" },
                    if w.is_animating { " animating" } else { "" }
                );
            }
        }
        Response::Config { config } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Response::ConfigReloaded { delta, restarted } => {
            if delta.hot_swappable.is_empty() && delta.restart_required.is_empty() {
                println!("No changes");
            }
            for name in &delta.hot_swappable {
                println!("applied: {}", name);
            }
            for name in &delta.restart_required {
                println!("restart: {}", name);
            }
            if restarted {
                println!("Engine restarted");
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Command {
    match subcmd {
        SubCommand::Start(_)
        | SubCommand::Version(_)
        | SubCommand::CheckConfig(_)
        | SubCommand::Subscribe(_) => {
            unreachable!("handled in main")
        }
        SubCommand::Status(_) => Command::Status,
        SubCommand::ListWindows(_) => Command::ListWindows,
        SubCommand::GetConfig(_) => Command::GetConfig,
        SubCommand::ReloadConfig(_) => Command::ReloadConfig,
        SubCommand::Pause(_) => Command::Pause,
        SubCommand::Resume(_) => Command::Resume,
        SubCommand::Quit(_) => Command::Quit,
    }
}
