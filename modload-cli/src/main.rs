use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use modload_core::console;
use modload_core::module::artifact::platform_string;
use modload_core::{
    ModuleLoader, ModuleRequest, NativeLoader, SearchConfig, SettingsManager, SystemPaths,
};

mod host;
mod report;

use crate::host::host_syscall;
use crate::report::{CandidateReport, LoadReport};

#[derive(Parser, Debug)]
#[command(name = "modload")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve, load and handshake with native game modules")]
struct Args {
    /// Settings file (defaults to ~/.modload/settings.toml)
    #[arg(long, value_name = "PATH", global = true)]
    settings: Option<PathBuf>,

    /// Override the configured base path
    #[arg(long, value_name = "PATH", global = true)]
    base_path: Option<String>,

    /// Override the configured secondary (CD) path
    #[arg(long, value_name = "PATH", global = true)]
    cd_path: Option<String>,

    /// Override the configured variant subdirectory
    #[arg(long, value_name = "NAME", global = true)]
    game: Option<String>,

    /// Directory treated as the binary directory instead of the executable's
    #[arg(long, value_name = "PATH", global = true)]
    binary_path: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the locations a module would be loaded from, in order
    Candidates {
        name: String,

        /// Include the platform's library search
        #[arg(long)]
        system: bool,
    },

    /// Load a module, perform the handshake and optionally call vmMain
    Load {
        name: String,

        /// Include the platform's library search
        #[arg(long)]
        system: bool,

        /// Command passed to vmMain after loading
        #[arg(long = "command", value_name = "N")]
        call: Option<i32>,

        /// Arguments for --command
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        args: Vec<i32>,
    },

    /// Find a plain library by file name, without the handshake
    Library {
        name: String,

        /// Include the platform's library search
        #[arg(long)]
        system: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = setup_tracing(args.log_file.as_deref())?;

    info!("modload startup: platform={}", platform_string());

    let loader = ModuleLoader::native(search_config(&args)?);

    match args.command {
        Command::Candidates { name, system } => {
            let request = ModuleRequest::new(name).with_system_search(system);
            let candidates = loader.candidates(&request)?;
            let report: Vec<CandidateReport> = candidates.iter().map(Into::into).collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Load {
            name,
            system,
            call,
            args: call_args,
        } => {
            let request = ModuleRequest::new(name).with_system_search(system);
            match loader.load_module(&request, host_syscall) {
                Ok(module) => {
                    let result = call.map(|command| module.call(command, &call_args));
                    let report = LoadReport::success(&module, result);
                    console::print(&report.summary());
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    loader.unload(module);
                }
                Err(e) => {
                    let report = LoadReport::failure(&request.name, &e);
                    console::print(&report.summary());
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    return Err(e.into());
                }
            }
        }
        Command::Library { name, system } => {
            let library = loader.load_library(&name, system)?;
            console::print(&format!("Loaded library \"{name}\""));
            loader.loader().close(library);
        }
    }

    Ok(())
}

fn search_config(args: &Args) -> Result<SearchConfig> {
    let settings_manager = match &args.settings {
        Some(path) => SettingsManager::from_path(path.clone())?,
        None => SettingsManager::new()?,
    };

    settings_manager.update_setting(|settings| {
        if let Some(base_path) = &args.base_path {
            settings.fs.base_path = Some(base_path.clone());
        }
        if let Some(cd_path) = &args.cd_path {
            settings.fs.cd_path = Some(cd_path.clone());
        }
        if let Some(game) = &args.game {
            settings.fs.game = game.clone();
        }
    });

    let mut paths = SystemPaths::detect();
    if let Some(binary_path) = &args.binary_path {
        paths.set_binary_path(binary_path);
    }

    let config = SearchConfig::new(&paths, &settings_manager.settings().fs);
    info!("Search paths: {:?}", config);
    Ok(config)
}

fn setup_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
        return Ok(None);
    };

    let dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {dir:?}"))?;
    let file_name = log_file
        .file_name()
        .with_context(|| format!("Log file {log_file:?} has no file name"))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    info!("Tracing initialized to {:?}", log_file);
    Ok(Some(guard))
}
