mod console;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::ops::ControlFlow;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use tripline_core::{
    AlertLog, Algorithm, BaselineStore, Mode, ScanRules, Session, Settings, Targets,
};

use crate::console::{print_cycle, print_outcome, ConsoleReporter};

#[derive(Parser, Debug)]
#[command(name = "tripline", author, version, about = "File integrity monitor", long_about = None)]
struct Cli {
    /// Settings file (JSON); defaults to $TRIPLINE_CONFIG or the platform config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Baseline file that stores the digests
    #[arg(long = "hash-file", global = true)]
    hash_file: Option<PathBuf>,

    /// Append-only record of detected modifications
    #[arg(long = "alert-file", global = true)]
    alert_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Directories to monitor
    #[arg(short = 'd', long = "directories", num_args = 1..)]
    directories: Vec<PathBuf>,

    /// Files to monitor
    #[arg(short = 'f', long = "files", num_args = 1..)]
    files: Vec<PathBuf>,

    /// File names to ignore
    #[arg(long = "ignore-files", num_args = 1..)]
    ignore_files: Vec<String>,

    /// Directory names to ignore
    #[arg(long = "ignore-dirs", num_args = 1..)]
    ignore_dirs: Vec<String>,

    #[arg(short = 'a', long = "hash-type", help = hash_type_help())]
    hash_type: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash the targets and write a new baseline
    Create(TargetArgs),
    /// Compare every baseline entry against the filesystem
    Check,
    /// Hash the targets and merge them into the existing baseline
    Update(TargetArgs),
    /// Re-check on an interval, recording and persisting modifications
    Alert {
        /// Seconds between checks
        #[arg(short = 't', long = "timer")]
        timer: Option<u64>,
    },
}

fn hash_type_help() -> String {
    format!("Hash type to use [{}]", Algorithm::names().join(", "))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::discover(cli.config.as_deref()).context("loading settings")?;
    let reporter = ConsoleReporter::default();
    let store = BaselineStore::new(cli.hash_file.clone().unwrap_or(settings.baseline_file.clone()));
    let alerts = AlertLog::new(cli.alert_file.clone().unwrap_or(settings.alert_file.clone()));
    let session = Session::new(store, alerts, &reporter);

    let mode = resolve_mode(cli.command, &settings)?;
    info!(?mode, "starting");

    let outcome = match mode {
        Mode::Alert { interval } => session.alert(interval, |report| {
            print_cycle(report);
            ControlFlow::Continue(())
        })?,
        mode => session.execute(mode)?,
    };
    print_outcome(&outcome);
    info!("application exited successfully");
    Ok(())
}

/// Turn parsed flags plus settings into a validated mode. No I/O happens
/// here beyond what settings discovery already did.
fn resolve_mode(command: Commands, settings: &Settings) -> Result<Mode> {
    let mode = match command {
        Commands::Create(args) => {
            let algorithm = hash_type(&args, settings);
            Mode::create(targets(args, settings)?, algorithm.as_deref())?
        }
        Commands::Check => Mode::Check,
        Commands::Update(args) => {
            let algorithm = args.hash_type.clone();
            Mode::update(targets(args, settings)?, algorithm.as_deref())?
        }
        Commands::Alert { timer } => Mode::alert(timer.unwrap_or(settings.interval_secs))?,
    };
    Ok(mode)
}

fn hash_type(args: &TargetArgs, settings: &Settings) -> Option<String> {
    args.hash_type
        .clone()
        .or_else(|| settings.algorithm.map(|alg| alg.as_str().to_string()))
}

fn targets(args: TargetArgs, settings: &Settings) -> Result<Targets> {
    let rules = ScanRules::new(
        settings.ignore_files.iter().cloned().chain(args.ignore_files),
        settings.ignore_dirs.iter().cloned().chain(args.ignore_dirs),
    );
    Ok(Targets::resolve(args.directories, args.files, rules)?)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
