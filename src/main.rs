mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use famcal_core::DateRange;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::commands::conflicts::ConflictArgs;
use crate::commands::occurrences::OccurrencesArgs;
use crate::config::FamcalConfig;

#[derive(Parser)]
#[command(name = "famcal")]
#[command(about = "Expand recurring family events and check them for scheduling conflicts")]
struct Cli {
    /// Config file to use instead of ~/.config/famcal/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the occurrences a recurrence rule produces
    Occurrences(OccurrencesArgs),
    /// Show the events (recurring ones expanded) in a date range
    Expand {
        /// JSON events file (defaults to the configured events_file)
        file: Option<PathBuf>,

        /// First day to show (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        from: Option<String>,

        /// Last day to show (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Print JSON instead of a day-by-day list
        #[arg(long)]
        json: bool,
    },
    /// Check a proposed event against existing events
    Conflicts {
        /// JSON events file (defaults to the configured events_file)
        file: Option<PathBuf>,

        #[command(flatten)]
        args: ConflictArgs,
    },
    /// Show where the config lives and the settings in effect
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = FamcalConfig::load(cli.config.as_deref())?;
    let limits = config.expansion_limits();
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Occurrences(args) => commands::occurrences::run(args, limits),
        Commands::Expand {
            file,
            from,
            to,
            json,
        } => {
            let events = commands::load_events(&events_path(file, &config))?;
            let range = DateRange::from_args(from.as_deref(), to.as_deref(), today)?;
            commands::expand::run(&events, range, limits, today, json)
        }
        Commands::Conflicts { file, args } => {
            let events = commands::load_events(&events_path(file, &config))?;
            let detector = config.conflict_detector()?;
            commands::conflicts::run(&events, args, detector, limits)
        }
        Commands::Config => {
            let path = match cli.config {
                Some(path) => path,
                None => FamcalConfig::config_path()?,
            };
            println!("{}", path.display().dimmed());
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn events_path(file: Option<PathBuf>, config: &FamcalConfig) -> PathBuf {
    file.unwrap_or_else(|| config.events_path())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "famcal=warn,famcal_core=warn",
        1 => "famcal=debug,famcal_core=debug",
        _ => "famcal=trace,famcal_core=trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
