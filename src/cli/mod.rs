//! Command-line interface for Strata
//!
//! Besides configuration helpers, the CLI can drive a full runtime against
//! the in-memory native layer, which is how the store is exercised without a
//! real window system.

use crate::commands::CommandRegistry;
use crate::config::{default_config_path, ConfigParser, StrataConfig};
use crate::lifecycle::{config_validator, Runtime, RuntimeOptions};
use crate::models::{Monitor, MonitorHandle, Rect, Window, WindowHandle};
use crate::native::InMemoryNativeManager;
use crate::store::RootState;
use crate::Result;
use anyhow::Context as _;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

/// Strata command-line interface
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Transactional state store for a tiling desktop environment")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct StrataCli {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, alias = "file")]
    pub config: Option<PathBuf>,

    /// Machine-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate a configuration file
    ValidateConfig,

    /// Print a fully populated configuration template
    DefaultConfig,

    /// List the commands that keybinds can refer to
    ListCommands,

    /// Run commands against a simulated desktop and print the final state
    Simulate(SimulateArgs),

    /// Keep a simulated desktop running until interrupted
    Run(DesktopArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DesktopArgs {
    /// Number of side-by-side monitors
    #[arg(long, default_value_t = 1)]
    pub monitors: u64,

    /// Number of windows open at startup
    #[arg(long, default_value_t = 3)]
    pub windows: u64,

    /// Saved state file to restore from and write on exit
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub desktop: DesktopArgs,

    /// Command id to run, in order (repeatable)
    #[arg(long = "command", value_name = "ID")]
    pub commands: Vec<String>,
}

/// Final state printed by `simulate`
#[derive(Debug, Serialize, PartialEq)]
pub struct StateSummary {
    pub monitors: usize,
    pub windows: usize,
    pub focused: Option<WindowHandle>,
    pub workspaces: Vec<WorkspaceSummary>,
    pub failed_commands: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WorkspaceSummary {
    pub name: String,
    pub layout_engine: String,
    pub monitor: Option<String>,
    pub windows: Vec<WindowHandle>,
}

impl StateSummary {
    pub fn from_root(root: &RootState) -> Self {
        let workspaces = root
            .workspaces()
            .iter()
            .map(|workspace| WorkspaceSummary {
                name: workspace.name.clone(),
                layout_engine: workspace.layout_engine.clone(),
                monitor: root
                    .map()
                    .monitor_for_workspace(workspace.id)
                    .and_then(|handle| root.monitors().get(handle))
                    .map(|monitor| monitor.name.clone()),
                windows: workspace.windows.clone(),
            })
            .collect();

        Self {
            monitors: root.monitors().len(),
            windows: root.windows().len(),
            focused: root.windows().last_focused(),
            workspaces,
            failed_commands: Vec::new(),
        }
    }

    fn print_table(&self) {
        println!(
            "{} monitor(s), {} window(s), focused: {}",
            self.monitors,
            self.windows,
            self.focused
                .map(|handle| handle.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        for workspace in &self.workspaces {
            let windows: Vec<String> = workspace.windows.iter().map(ToString::to_string).collect();
            println!(
                "  {:<12} {:<13} {:<12} [{}]",
                workspace.name,
                workspace.layout_engine,
                workspace.monitor.as_deref().unwrap_or("hidden"),
                windows.join(", ")
            );
        }
        for command in &self.failed_commands {
            println!("  failed: {command}");
        }
    }
}

/// Entry point used by `main`
pub async fn run_cli(cli: StrataCli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    match cli.command {
        Commands::ValidateConfig => validate_config(&config_path, cli.json),
        Commands::DefaultConfig => {
            print!("{}", StrataConfig::template().to_toml_string()?);
            Ok(())
        }
        Commands::ListCommands => {
            let registry = CommandRegistry::with_defaults();
            if cli.json {
                let ids: Vec<&str> = registry.ids().collect();
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                for id in registry.ids() {
                    if let Some(command) = registry.get(id) {
                        println!("{:<40} {}", command.id, command.title);
                    }
                }
            }
            Ok(())
        }
        Commands::Simulate(args) => {
            let summary = simulate(cli.config, &args).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                summary.print_table();
            }
            Ok(())
        }
        Commands::Run(args) => run_until_interrupted(cli.config, &args).await,
    }
}

fn validate_config(path: &std::path::Path, json: bool) -> Result<()> {
    let mut parser = ConfigParser::new(config_validator()?);
    let config = parser
        .parse_file(path)
        .with_context(|| format!("{} is not valid", path.display()))?;

    if json {
        let warnings: Vec<String> = parser.warnings().iter().map(ToString::to_string).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "path": path.display().to_string(),
                "valid": true,
                "workspaces": config.effective_workspaces().len(),
                "keybinds": config.effective_keybinds().len(),
                "warnings": warnings,
            }))?
        );
    } else {
        println!("{} is valid", path.display());
        for warning in parser.warnings() {
            println!("  warning: {warning}");
        }
    }
    Ok(())
}

/// Monitor `index` of a row of 1920x1080 displays
pub fn simulated_monitor(index: u64) -> Monitor {
    let monitor = Monitor::new(
        MonitorHandle::new(index + 1),
        format!("display-{}", index + 1),
        Rect::new(index as f64 * 1920.0, 0.0, 1920.0, 1080.0),
    );
    if index == 0 {
        monitor.primary()
    } else {
        monitor
    }
}

fn simulated_native(args: &DesktopArgs) -> Arc<InMemoryNativeManager> {
    let monitors = (0..args.monitors).map(simulated_monitor).collect();
    let windows = (1..=args.windows)
        .map(|raw| Window::new(WindowHandle::new(raw), format!("window {raw}"), "simulated"))
        .collect();
    Arc::new(InMemoryNativeManager::new_with(monitors, windows))
}

fn runtime_options(config_path: Option<PathBuf>, args: &DesktopArgs) -> RuntimeOptions {
    let native = simulated_native(args);
    // Without an explicit file, never touch the user's real saved state
    let saved_state_path = args.state_file.clone().unwrap_or_else(|| {
        std::env::temp_dir().join(format!("strata-{}.json", uuid::Uuid::new_v4()))
    });
    RuntimeOptions {
        config_path,
        config: None,
        saved_state_path: Some(saved_state_path),
        native,
        persist_on_exit: args.state_file.is_some(),
    }
}

/// Initialize a runtime over a simulated desktop, run `commands` in order and exit
pub async fn simulate(config_path: Option<PathBuf>, args: &SimulateArgs) -> Result<StateSummary> {
    let mut runtime = Runtime::initialize(runtime_options(config_path, &args.desktop)).await?;

    let mut failed = Vec::new();
    for id in &args.commands {
        if let Err(err) = runtime.execute(id).await {
            warn!(command = %id, error = %err, "Command failed");
            failed.push(id.clone());
        }
    }

    let mut summary = StateSummary::from_root(&runtime.store().snapshot());
    summary.failed_commands = failed;
    runtime.exit().await?;
    Ok(summary)
}

async fn run_until_interrupted(config_path: Option<PathBuf>, args: &DesktopArgs) -> Result<()> {
    let mut runtime = Runtime::initialize(runtime_options(config_path, args)).await?;
    info!("Strata running; press Ctrl+C to exit");
    wait_for_shutdown_signal().await;
    runtime.exit().await
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    res = signal::ctrl_c() => {
                        if let Err(err) = res {
                            warn!(error = %err, "Failed to listen for Ctrl+C");
                        }
                        info!("Received SIGINT");
                    }
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
                return;
            }
            Err(err) => warn!(error = %err, "Failed to install SIGTERM handler"),
        }
    }

    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for Ctrl+C");
    }
}
