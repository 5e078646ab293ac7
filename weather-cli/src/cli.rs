use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{Term, style};
use inquire::{CustomType, InquireError, Text};
use weather_core::{
    Config, Orchestrator, SearchError, SearchState, WeatherProvider, handle_search,
    provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for a city, from Open-Meteo")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Defaults to `search`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search cities interactively until Esc or Ctrl-C.
    Search,

    /// Show weather for a single city and exit.
    Show {
        /// City name, e.g. "London".
        city: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the geocoding matches for a city name.
    Places {
        city: String,
    },

    /// Edit language, timeout and endpoints interactively.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command.unwrap_or(Command::Search) {
            Command::Search => interactive(&config).await,
            Command::Show { city, json } => show(&config, &city, json).await,
            Command::Places { city } => places(&config, &city).await,
            Command::Configure => configure(config, self.config).await,
        }
    }
}

async fn interactive(config: &Config) -> Result<ExitCode> {
    let mut orchestrator = Orchestrator::new(provider_from_config(config)?);
    let term = Term::stdout();

    println!("{}", style("Weather - Now").bold());
    println!("Search a city to see current weather.\n");

    loop {
        // The prompt only comes back once the previous search has finished.
        let input = tokio::task::spawn_blocking(|| {
            Text::new("Find city")
                .with_placeholder("e.g. London, New York, Mumbai")
                .with_help_message(&format!("[Enter] {}  [Esc] quit", render::search_label(false)))
                .prompt()
        })
        .await?;

        let input = match input {
            Ok(text) => text,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read city name"),
        };

        let mut view = render::LiveView::new(term.is_term());
        orchestrator
            .handle_search(&input, |state| present(&term, view.apply(state), state))
            .await;
        println!();
    }

    println!("{}", style(render::ATTRIBUTION).dim());
    Ok(ExitCode::SUCCESS)
}

async fn show(config: &Config, city: &str, json: bool) -> Result<ExitCode> {
    let provider = provider_from_config(config)?;

    let state = handle_search(provider.as_ref(), city, |_| {}).await;

    match &state {
        SearchState::Success(outcome) if json => {
            let out = serde_json::to_string_pretty(outcome)
                .context("Failed to serialize weather result")?;
            println!("{out}");
        }
        SearchState::Success(_) => {
            print_state(&state);
            println!("\n{}", style(render::ATTRIBUTION).dim());
        }
        _ => print_state(&state),
    }

    Ok(if state.error().is_some() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

async fn places(config: &Config, city: &str) -> Result<ExitCode> {
    if city.trim().is_empty() {
        print_error(&SearchError::EmptyInput);
        return Ok(ExitCode::FAILURE);
    }

    let provider = provider_from_config(config)?;

    let candidates = match provider.resolve_coordinates(city.trim()).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::debug!(city, error = %e, "geocoding lookup failed");
            print_error(&SearchError::from(e));
            return Ok(ExitCode::FAILURE);
        }
    };

    if candidates.is_empty() {
        print_error(&SearchError::NoGeocodingMatch { query: city.to_string() });
        return Ok(ExitCode::FAILURE);
    }

    for (i, place) in candidates.iter().enumerate() {
        println!(
            "{}. {} ({:.2}, {:.2})",
            i + 1,
            place.display_name(),
            place.latitude,
            place.longitude
        );
    }

    Ok(ExitCode::SUCCESS)
}

async fn configure(current: Config, path: Option<PathBuf>) -> Result<ExitCode> {
    let edited = tokio::task::spawn_blocking(move || -> Result<Config, InquireError> {
        let language = Text::new("Geocoder language:")
            .with_default(&current.language)
            .with_help_message("Two-letter code passed to the geocoding lookup")
            .prompt()?;

        let timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
            .with_default(current.timeout_secs)
            .with_error_message("Please enter a whole number of seconds")
            .prompt()?;

        let geocoding_url = Text::new("Geocoding endpoint:")
            .with_default(&current.endpoints.geocoding_url)
            .prompt()?;

        let forecast_url = Text::new("Forecast endpoint:")
            .with_default(&current.endpoints.forecast_url)
            .prompt()?;

        let mut edited = current;
        edited.language = language.trim().to_string();
        edited.timeout_secs = timeout_secs;
        edited.endpoints.geocoding_url = geocoding_url.trim().to_string();
        edited.endpoints.forecast_url = forecast_url.trim().to_string();
        Ok(edited)
    })
    .await?;

    let config = match edited {
        Ok(edited) => edited,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            println!("Configuration unchanged.");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e).context("Failed to read configuration input"),
    };

    let saved_to = match path {
        Some(path) => {
            config.save_to(&path)?;
            path
        }
        None => config.save()?,
    };

    println!("Saved configuration to {}", saved_to.display());
    Ok(ExitCode::SUCCESS)
}

/// Apply a frame: erase the transient loading line, then draw the new view.
fn present(term: &Term, frame: render::Frame, state: &SearchState) {
    if frame.clear_lines > 0 {
        if let Err(e) = term.clear_last_lines(frame.clear_lines) {
            tracing::debug!(error = %e, "failed to clear loading line");
        }
    }

    match (state, frame.text) {
        (SearchState::Failure(err), _) => print_error(err),
        (_, Some(text)) => println!("{text}"),
        (_, None) => {}
    }
}

fn print_state(state: &SearchState) {
    match state {
        SearchState::Failure(err) => print_error(err),
        other => {
            if let Some(text) = render::render_state(other) {
                println!("{text}");
            }
        }
    }
}

/// Errors go to stderr, bold red, so they stand apart from results.
fn print_error(err: &SearchError) {
    eprintln!("{}", style(render::render_error(err)).red().bold());
}
