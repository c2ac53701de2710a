use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use cityweather_core::{
    Config, FileStorage, LookupOutcome, StorageError, WeatherStore, fetch_city, group_by_day,
    provider::provider_from_config,
};
use colored::Colorize;

use crate::render::{self, Palette};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather and forecast by city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure {
        /// API key; prompted for when omitted.
        #[arg(long)]
        api_key: Option<String>,
    },

    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that read or change the persisted weather store.
#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Look up a city and show its current weather.
    Search {
        /// City name, e.g. "Paris".
        city: String,
    },

    /// Search again for an entry of the search history.
    Repeat {
        /// Position in `cityweather history`, starting at 1.
        index: usize,
    },

    /// Show the last fetched current weather.
    Details,

    /// Show the last fetched forecast, one line per day.
    Forecast,

    /// List recent searches, most recent first.
    History,

    /// Switch between dark and light output.
    Theme,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure { api_key } => configure(config, api_key),
            Command::Store(command) => {
                let mut store = open_store(&config)?;
                run_with_store(command, &config, &mut store).await
            }
        }
    }
}

async fn run_with_store(
    command: StoreCommand,
    config: &Config,
    store: &mut WeatherStore<FileStorage>,
) -> anyhow::Result<()> {
    let palette = Palette::new(store.dark_mode());

    match command {
        StoreCommand::Search { city } => {
            let city = normalize_city(&city)?;
            search(config, store, &city).await?;
        }
        StoreCommand::Repeat { index } => {
            let city = history_entry(store.history(), index)?;
            search(config, store, &city).await?;
        }
        StoreCommand::Details => match store.current_weather() {
            Some(snapshot) => print!("{}", render::details(snapshot, palette)),
            None => println!("No data available"),
        },
        StoreCommand::Forecast => match store.forecast() {
            Some(forecast) => print!("{}", render::forecast(&group_by_day(forecast), palette)),
            None => println!("No forecast available"),
        },
        StoreCommand::History => print!("{}", render::history(store.history(), palette)),
        StoreCommand::Theme => {
            if let Err(err) = store.toggle_dark_mode() {
                warn_unsaved(&err);
            }
            println!("{}", render::theme(store.dark_mode()));
        }
    }

    Ok(())
}

fn configure(mut config: Config, api_key: Option<String>) -> anyhow::Result<()> {
    let api_key = match api_key {
        Some(key) => key,
        None => inquire::Password::new("OpenWeather API key:")
            .without_confirmation()
            .with_help_message("Get one at https://openweathermap.org/api")
            .prompt()
            .context("Failed to read API key")?,
    };

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.to_string());
    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<WeatherStore<FileStorage>> {
    let dir = config.state_dir()?;
    tracing::debug!(dir = %dir.display(), "Opening weather store");
    Ok(WeatherStore::open(FileStorage::new(dir)))
}

async fn search(
    config: &Config,
    store: &mut WeatherStore<FileStorage>,
    city: &str,
) -> anyhow::Result<()> {
    let provider = provider_from_config(config)?;

    let ticket = store.begin_lookup(city);
    let weather = fetch_city(provider.as_ref(), city)
        .await
        .with_context(|| format!("Could not get weather for '{city}'"))?;

    match store.complete_lookup(ticket, weather) {
        Ok(LookupOutcome::Applied) => {}
        Ok(LookupOutcome::Superseded) => {
            println!("A newer search replaced the result for '{city}'.");
            return Ok(());
        }
        Err(err) => warn_unsaved(&err),
    }

    let palette = Palette::new(store.dark_mode());
    if let Some(snapshot) = store.current_weather() {
        print!("{}", render::details(snapshot, palette));
    }

    Ok(())
}

/// Trim user input and reject blank city names.
fn normalize_city(input: &str) -> anyhow::Result<String> {
    let city = input.trim();
    if city.is_empty() {
        bail!("City name must not be empty");
    }
    Ok(city.to_string())
}

fn history_entry(history: &[String], index: usize) -> anyhow::Result<String> {
    index
        .checked_sub(1)
        .and_then(|i| history.get(i))
        .cloned()
        .with_context(|| {
            format!(
                "No history entry #{index} ({} saved). Hint: run `cityweather history`.",
                history.len()
            )
        })
}

fn warn_unsaved(err: &StorageError) {
    eprintln!(
        "{} {err}; this change is kept for the current session only",
        "warning:".yellow()
    );
}
