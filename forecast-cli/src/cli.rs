use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, ForecastLoadTask, ForecastLoader, ForecastProvider, ForecastScreen, ForecastViewState,
    PreferenceSource, StartOutcome, StoredPreferences, Units, provider_from_config,
};
use inquire::{Password, Select, Text};
use tokio::sync::mpsc;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Multi-day weather forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the preferred location, API key and units.
    Configure,

    /// Load the forecast once and print it.
    Show {
        /// Location to use instead of the configured one, e.g. "London,UK".
        #[arg(long)]
        location: Option<String>,

        /// Only print the day at this index (0 = today).
        #[arg(long)]
        day: Option<usize>,
    },

    /// Interactive session: show (cached) or refresh the forecast repeatedly.
    Watch {
        /// Location to use instead of the configured one.
        #[arg(long)]
        location: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure().await,
            Command::Show { location, day } => show(location, day).await,
            Command::Watch { location } => watch(location).await,
        }
    }
}

async fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let current = config.clone();
    let answers = tokio::task::spawn_blocking(move || -> anyhow::Result<(String, String, Units)> {
        let location = Text::new("Preferred location:")
            .with_default(current.preferred_location())
            .prompt()?;

        let api_key = Password::new("OpenWeatherMap API key (leave empty to keep current):")
            .without_confirmation()
            .prompt()?;

        let units_start = Units::all().iter().position(|u| *u == current.units).unwrap_or(0);
        let units = Select::new("Units:", Units::all().to_vec())
            .with_starting_cursor(units_start)
            .prompt()?;

        Ok((location, api_key, units))
    })
    .await??;

    let (location, api_key, units) = answers;
    config.set_location(location);
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }
    config.units = units;
    config.save()?;
    tracing::info!(location = config.preferred_location(), units = %config.units, "configuration saved");

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(location: Option<String>, day: Option<usize>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let (screen, mut states) = build_screen(&config, location)?;

    screen.on_trigger();
    match settled(&mut states).await? {
        ForecastViewState::Content(lines) => match day {
            Some(index) => {
                let line = lines.get(index).ok_or_else(|| {
                    anyhow!("Day {index} is out of range; the forecast has {} days.", lines.len())
                })?;
                println!("{line}");
            }
            None => print_lines(&lines),
        },
        ForecastViewState::Error(kind) => return Err(anyhow!(kind.user_message())),
        ForecastViewState::Loading => {}
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Show,
    Refresh,
    Quit,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::Show => "Show forecast",
            Action::Refresh => "Refresh",
            Action::Quit => "Quit",
        })
    }
}

async fn watch(location: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let (screen, mut states) = build_screen(&config, location)?;

    loop {
        let action = tokio::task::spawn_blocking(|| {
            Select::new("What next?", vec![Action::Show, Action::Refresh, Action::Quit]).prompt()
        })
        .await??;

        tracing::debug!(%action, "watch action");
        let outcome = match action {
            Action::Show => screen.on_trigger(),
            Action::Refresh => screen.on_refresh(),
            Action::Quit => return Ok(()),
        };

        match outcome {
            StartOutcome::Launched => println!("Loading..."),
            StartOutcome::CacheHit => println!("(cached)"),
            StartOutcome::AlreadyLoading => println!("Still loading..."),
        }

        match settled(&mut states).await? {
            ForecastViewState::Content(lines) => print_lines(&lines),
            ForecastViewState::Error(kind) => eprintln!("{}", kind.user_message()),
            ForecastViewState::Loading => {}
        }
    }
}

fn build_screen(
    config: &Config,
    location: Option<String>,
) -> anyhow::Result<(ForecastScreen, mpsc::UnboundedReceiver<ForecastViewState>)> {
    let provider: Arc<dyn ForecastProvider> = Arc::from(provider_from_config(config)?);
    let task = ForecastLoadTask::new(provider, config.units);

    let preferences: Arc<dyn PreferenceSource> = match location {
        Some(location) => {
            let mut pinned = config.clone();
            pinned.set_location(location);
            Arc::new(pinned)
        }
        None => Arc::new(StoredPreferences::from_default_path()?),
    };

    let screen = ForecastScreen::new(ForecastLoader::new(task, preferences));
    let (tx, rx) = mpsc::unbounded_channel();
    screen.subscribe(Arc::new(move |state: ForecastViewState| {
        let _ = tx.send(state);
    }));

    Ok((screen, rx))
}

/// Wait for the next non-loading state.
async fn settled(
    states: &mut mpsc::UnboundedReceiver<ForecastViewState>,
) -> anyhow::Result<ForecastViewState> {
    loop {
        let state = states.recv().await.context("Forecast screen stopped delivering")?;
        if !state.is_loading() {
            return Ok(state);
        }
    }
}

fn print_lines(lines: &[String]) {
    if lines.is_empty() {
        println!("No forecast days returned.");
    }
    for (index, line) in lines.iter().enumerate() {
        println!("{index:>2}  {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_day() {
        let cli = Cli::try_parse_from(["forecast", "show", "--location", "Oslo,NO", "--day", "2"]).unwrap();

        match cli.command {
            Command::Show { location, day } => {
                assert_eq!(location.as_deref(), Some("Oslo,NO"));
                assert_eq!(day, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_watch_without_location() {
        let cli = Cli::try_parse_from(["forecast", "watch"]).unwrap();
        assert!(matches!(cli.command, Command::Watch { location: None }));
    }

    #[test]
    fn build_screen_requires_api_key() {
        let err = build_screen(&Config::default(), Some("Paris".into())).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }
}
