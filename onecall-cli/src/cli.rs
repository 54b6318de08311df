use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Read;

use onecall_core::{Config, EventBuffer, FetcherOptions, Mode, WeatherFetcher, agent::stringifier};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "onecall", version, about = "OpenWeather OneCall agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate fetcher options and store them in the config file.
    Configure {
        /// OpenWeather API key (hexadecimal).
        #[arg(long)]
        api_key: String,

        /// Latitude of the polled location.
        #[arg(long)]
        latitude: String,

        /// Longitude of the polled location.
        #[arg(long)]
        longitude: String,

        /// Measurement system: standard, metric or imperial.
        #[arg(long, default_value = "metric")]
        units: String,

        /// Language code passed through to the provider.
        #[arg(long, default_value = "en")]
        language: String,
    },

    /// Poll the OneCall endpoint once and print any emitted event payload.
    Fetch,

    /// Stringify a OneCall payload into grouped `str_*` fields.
    Transform {
        /// Path to the payload JSON, or "-" for stdin.
        input: String,

        /// merge: overlay the derived fields on the payload; clean: emit only them.
        #[arg(long, default_value = "merge")]
        mode: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure {
                api_key,
                latitude,
                longitude,
                units,
                language,
            } => {
                let options = FetcherOptions {
                    api_key,
                    latitude,
                    longitude,
                    units,
                    language,
                    expected_update_period_in_days: None,
                };
                // Reject bad options before they ever reach the config file.
                options.validate()?;

                let mut config = Config::load()?;
                config.fetcher = Some(options);
                config.save()?;

                println!("Saved fetcher options to {}", Config::config_file_path()?.display());
            }
            Command::Fetch => {
                let config = Config::load()?;
                let options = config.fetcher.ok_or_else(|| {
                    anyhow!(
                        "No [fetcher] options configured.\n\
                         Hint: add a [fetcher] section to {}",
                        Config::config_file_path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|_| "the config file".to_string()),
                    )
                })?;
                let settings = options.validate()?;

                let fetcher = WeatherFetcher::new(settings);
                let mut buffer = EventBuffer::default();
                fetcher.check(&mut buffer).await?;

                match buffer.events.first() {
                    Some(event) => println!("{}", serde_json::to_string_pretty(&event.payload)?),
                    None => eprintln!("No event emitted this cycle."),
                }
            }
            Command::Transform { input, mode } => {
                let mode = Mode::try_from(mode.as_str())?;
                let raw = read_input(&input)?;
                let payload: Value =
                    serde_json::from_str(&raw).context("Failed to parse input payload as JSON")?;

                let out = stringifier::transform(&payload, mode);
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
        }

        Ok(())
    }
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read payload from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read payload file: {input}"))
    }
}
