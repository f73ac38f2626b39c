use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use forecast_core::{
    CityList, CityListProvider, Config, ForecastOrchestrator, HttpForecastClient, RefreshOutcome,
};
use inquire::{InquireError, Select, Text};
use std::{fmt, sync::Arc};

use crate::sink::TerminalSink;

/// Overrides the configured endpoint URL for one run.
const ENDPOINT_ENV: &str = "FORECAST_ENDPOINT";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Multi-day weather forecast for your saved cities")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and print the forecast for the current city.
    Show {
        /// Query this city instead of the saved one; the saved list is left untouched.
        #[arg(long)]
        city: Option<String>,
    },

    /// Interactive screen: forecast plus a refresh / manage-cities menu (default).
    Interactive,

    /// Manage the saved city list.
    #[command(subcommand)]
    City(CityCommand),

    /// Configure the forecast endpoint.
    Configure,
}

#[derive(Debug, Subcommand)]
pub enum CityCommand {
    /// List saved cities; the current one is marked with `*`.
    List,
    /// Save a city. The first saved city becomes current.
    Add { name: String },
    /// Remove a saved city (prompts when no name is given).
    Remove { name: Option<String> },
    /// Make a saved city current (prompts when no name is given).
    Select { name: Option<String> },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command.unwrap_or(Command::Interactive) {
            Command::Show { city } => show(city).await,
            Command::Interactive => interactive().await,
            Command::City(cmd) => run_city_command(cmd),
            Command::Configure => configure(),
        }
    }
}

/// A city given on the command line for a single refresh.
struct FixedCity(String);

impl CityListProvider for FixedCity {
    fn reload(&mut self) -> Result<()> {
        Ok(())
    }

    fn current_city_name(&self) -> Option<&str> {
        Some(self.0.trim()).filter(|name| !name.is_empty())
    }
}

fn load_config() -> Result<Config> {
    let mut cfg = Config::load()?;
    if let Ok(url) = std::env::var(ENDPOINT_ENV) {
        tracing::debug!(%url, "endpoint overridden from {ENDPOINT_ENV}");
        cfg.set_endpoint(url);
    }
    Ok(cfg)
}

fn build_orchestrator(cfg: &Config) -> Result<ForecastOrchestrator> {
    let client = HttpForecastClient::from_config(cfg)?;
    Ok(ForecastOrchestrator::new(Arc::new(client)))
}

async fn show(city: Option<String>) -> Result<()> {
    let cfg = load_config()?;
    let mut orchestrator = build_orchestrator(&cfg)?;
    let mut sink = TerminalSink::stdio();

    let outcome = match city {
        Some(name) => orchestrator.refresh(&mut FixedCity(name), &mut sink).await,
        None => {
            let mut cities = CityList::load_default()?;
            orchestrator.refresh(&mut cities, &mut sink).await
        }
    };

    match outcome {
        Some(RefreshOutcome::Failed(err)) => Err(err).context("Forecast refresh failed"),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
enum MenuItem {
    Refresh,
    ManageCities,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::Refresh => "Refresh",
            MenuItem::ManageCities => "Manage cities",
            MenuItem::Quit => "Quit",
        })
    }
}

async fn interactive() -> Result<()> {
    let cfg = load_config()?;
    let mut orchestrator = build_orchestrator(&cfg)?;
    let mut cities = CityList::load_default()?;
    let mut sink = TerminalSink::stdio();

    orchestrator.refresh(&mut cities, &mut sink).await;

    loop {
        let choice = Select::new(
            "What next?",
            vec![MenuItem::Refresh, MenuItem::ManageCities, MenuItem::Quit],
        )
        .prompt();

        match cancelled_as_none(choice)? {
            Some(MenuItem::Refresh) => {}
            Some(MenuItem::ManageCities) => manage_cities(&mut cities)?,
            Some(MenuItem::Quit) | None => break,
        }

        // The city list is reloaded from disk as part of every refresh.
        orchestrator.refresh(&mut cities, &mut sink).await;
    }

    orchestrator.teardown();
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum CityMenuItem {
    Add,
    Remove,
    Select,
    Back,
}

impl fmt::Display for CityMenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CityMenuItem::Add => "Add a city",
            CityMenuItem::Remove => "Remove a city",
            CityMenuItem::Select => "Switch city",
            CityMenuItem::Back => "Back to forecast",
        })
    }
}

fn manage_cities(cities: &mut CityList) -> Result<()> {
    loop {
        print_cities(cities);

        let choice = Select::new(
            "Cities:",
            vec![CityMenuItem::Add, CityMenuItem::Remove, CityMenuItem::Select, CityMenuItem::Back],
        )
        .prompt();

        let result = match cancelled_as_none(choice)? {
            Some(CityMenuItem::Add) => match cancelled_as_none(Text::new("City name:").prompt())? {
                Some(name) => add_city(cities, &name),
                None => Ok(()),
            },
            Some(CityMenuItem::Remove) => remove_city(cities, None),
            Some(CityMenuItem::Select) => select_city(cities, None),
            Some(CityMenuItem::Back) | None => return Ok(()),
        };

        // Stay on the city screen after a rejected edit.
        if let Err(err) = result {
            eprintln!("Error: {err:#}");
        }
    }
}

fn run_city_command(cmd: CityCommand) -> Result<()> {
    let mut cities = CityList::load_default()?;

    match cmd {
        CityCommand::List => {
            print_cities(&cities);
            Ok(())
        }
        CityCommand::Add { name } => add_city(&mut cities, &name),
        CityCommand::Remove { name } => remove_city(&mut cities, name),
        CityCommand::Select { name } => select_city(&mut cities, name),
    }
}

fn print_cities(cities: &CityList) {
    if cities.is_empty() {
        println!("No saved cities.");
        return;
    }

    let current = cities.current_city_name();
    for city in cities.cities() {
        let marker = if Some(city.as_str()) == current { "*" } else { " " };
        println!("{marker} {city}");
    }
}

fn add_city(cities: &mut CityList, name: &str) -> Result<()> {
    if cities.add(name)? {
        cities.save()?;
        println!("Saved {}.", name.trim());
    } else {
        println!("{} is already saved.", name.trim());
    }
    Ok(())
}

fn remove_city(cities: &mut CityList, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => match pick_city(cities, "Remove which city?")? {
            Some(name) => name,
            None => return Ok(()),
        },
    };

    cities.remove(&name)?;
    cities.save()?;
    println!("Removed {name}.");
    Ok(())
}

fn select_city(cities: &mut CityList, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => match pick_city(cities, "Show forecast for:")? {
            Some(name) => name,
            None => return Ok(()),
        },
    };

    cities.select(&name)?;
    cities.save()?;
    println!("Current city: {name}.");
    Ok(())
}

/// Prompt for one of the saved cities; `None` if the user cancels.
fn pick_city(cities: &CityList, message: &str) -> Result<Option<String>> {
    if cities.is_empty() {
        bail!("No saved cities.\nHint: run `forecast city add <name>` first.");
    }

    cancelled_as_none(Select::new(message, cities.cities().to_vec()).prompt())
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let url = Text::new("Forecast endpoint URL:")
        .with_default(&cfg.endpoint.url)
        .prompt()
        .context("Failed to read endpoint URL")?;
    let city_param = Text::new("Query parameter carrying the city name:")
        .with_default(&cfg.endpoint.city_param)
        .prompt()
        .context("Failed to read query parameter name")?;

    cfg.set_endpoint(url.trim());
    cfg.endpoint.city_param = city_param.trim().to_string();
    cfg.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn cancelled_as_none<T>(answer: Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_interactive() {
        let cli = Cli::try_parse_from(["forecast"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn show_accepts_city_override() {
        let cli = Cli::try_parse_from(["forecast", "-v", "show", "--city", "北京"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Command::Show { city: Some(ref c) }) if c == "北京"));
    }

    #[test]
    fn city_subcommands_parse() {
        let cli = Cli::try_parse_from(["forecast", "city", "add", "上海"]).unwrap();
        assert!(matches!(cli.command, Some(Command::City(CityCommand::Add { ref name })) if name == "上海"));

        let cli = Cli::try_parse_from(["forecast", "city", "select"]).unwrap();
        assert!(matches!(cli.command, Some(Command::City(CityCommand::Select { name: None }))));
    }

    #[test]
    fn fixed_city_rejects_blank_names() {
        assert_eq!(FixedCity("  北京 ".into()).current_city_name(), Some("北京"));
        assert_eq!(FixedCity("   ".into()).current_city_name(), None);
    }

    #[test]
    fn cancelled_prompts_map_to_none() {
        let answer: Result<u8, InquireError> = Err(InquireError::OperationCanceled);
        assert_eq!(cancelled_as_none(answer).unwrap(), None);
        assert_eq!(cancelled_as_none::<u8>(Ok(3)).unwrap(), Some(3));
    }
}
