mod commands;
mod utils;

use agendum_core::config::Settings;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "agendum")]
#[command(about = "Create calendar events on your CalDAV server, with a local fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (overrides `log_level` from the config file; RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an event (prompts for anything not given)
    New {
        title: Option<String>,

        /// Day of the event (e.g. "tomorrow", "saturday", "2025-12-20", "Dec 20")
        #[arg(short, long)]
        date: Option<String>,

        /// Start time (e.g. "7pm", "19:00", "noon")
        #[arg(short, long)]
        time: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
    /// List events kept in the local fallback store
    Events {
        /// Print the stored event with this uid as ICS
        #[arg(long, value_name = "UID")]
        export: Option<String>,
    },
    /// List the calendars of the configured CalDAV account
    Calendars,
    /// Show events from the CalDAV account's calendars
    Upcoming {
        /// How many days ahead to look
        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },
    /// Show the decision log
    Decisions {
        /// Empty the decision log
        #[arg(long)]
        clear: bool,
    },
    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;

    init_telemetry(&cli, &settings);
    tracing::debug!(
        data_dir = %settings.data_dir.display(),
        remote = settings.caldav.is_some(),
        "settings loaded"
    );

    match cli.command {
        Commands::New {
            title,
            date,
            time,
            location,
            description,
        } => {
            let input = commands::new::NewEvent {
                title,
                date,
                time,
                location,
                description,
            };
            commands::new::run(&settings, input).await
        }
        Commands::Events { export } => commands::events::run(&settings, export.as_deref()),
        Commands::Calendars => commands::calendars::run(&settings).await,
        Commands::Upcoming { days } => commands::upcoming::run(&settings, days).await,
        Commands::Decisions { clear } => commands::decisions::run(&settings, clear),
        Commands::Config => commands::config::run(&settings),
    }
}

fn init_telemetry(cli: &Cli, settings: &Settings) {
    let level = cli.log_level.as_deref().unwrap_or(&settings.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
