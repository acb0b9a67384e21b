use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, InMemoryStore, Ingestion, date_key, issuance_for, next_slot_for, provider_from_config,
};
use inquire::Password;
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Short-term forecast ingestion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the provider service key.
    Configure,

    /// Show the issuance window and next slot for a time of day.
    Window {
        /// Time of day as HH:MM; if absent, means "now".
        #[arg(long)]
        at: Option<String>,
    },

    /// Fetch and store the latest batch, then print upcoming slots.
    Fetch {
        /// Time of day as HH:MM; if absent, means "now".
        #[arg(long)]
        at: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Window { at } => {
                let at = resolve_time(at.as_deref())?;
                let issuance = issuance_for(at);
                let (date, slot) = next_slot_for(at);

                println!("base date: {}", issuance.base_date_key());
                println!("base time: {}", issuance.base_time);
                println!("next slot: {} {}", date_key(date), slot);
                Ok(())
            }
            Command::Fetch { at } => fetch(resolve_time(at.as_deref())?).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("Service key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read service key")?;

    config.set_service_key(key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn fetch(at: NaiveDateTime) -> Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let ingestion = Ingestion::from_config(provider, InMemoryStore::new(), &config);

    let saved = ingestion.run(at).await?;
    info!(slots = saved.len(), "ingestion finished");

    let upcoming = ingestion.upcoming(at)?;
    if upcoming.is_empty() {
        println!("No upcoming forecast slots.");
    }
    for line in upcoming {
        println!("{line}");
    }

    Ok(())
}

/// Today's date at `at` (HH:MM), or the current local time.
fn resolve_time(at: Option<&str>) -> Result<NaiveDateTime> {
    let now = Local::now().naive_local();

    match at {
        Some(s) => {
            let time = NaiveTime::parse_from_str(s, "%H:%M")
                .with_context(|| format!("Invalid time '{s}', expected HH:MM"))?;
            Ok(now.date().and_time(time))
        }
        None => Ok(now),
    }
}
