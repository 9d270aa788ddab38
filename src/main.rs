use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use aqicast::api::AppState;
use aqicast::config::AqiCastConfig;
use aqicast::forecast::{DashboardForecast, ForecastPipeline};
use aqicast::history::{AqiHistory, load_history};
use aqicast::models::Coordinates;
use aqicast::{AqiCastError, cache, telemetry, web};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "aqicast", version, about = "Air quality forecast for your location")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Predict AQI for the next days
    Forecast {
        /// Skip location lookup and use these coordinates
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the recent AQI trend from the historical data file
    History {
        #[arg(long)]
        json: bool,
    },
    /// Serve the JSON API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AqiCastError>() {
                Some(err) => eprintln!("{}", err.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AqiCastConfig::load_from_path(cli.config.clone())?;
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    if config.cache.enabled
        && let Err(e) = cache::init(&config.cache.location)
    {
        warn!("Forecast cache disabled: {e:#}");
    }

    let Some(command) = cli.command else {
        print_summary(&cli, &config);
        return Ok(());
    };

    match command {
        Command::Forecast {
            latitude,
            longitude,
            json,
        } => {
            let pipeline = ForecastPipeline::from_config(&config).await?;
            let forecast = match (latitude, longitude) {
                (Some(lat), Some(lon)) => {
                    pipeline
                        .run_for(Coordinates::new(lat, lon)?, Local::now().date_naive())
                        .await?
                }
                _ => pipeline.run().await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&forecast)?);
            } else {
                print_forecast(&forecast);
            }
        }
        Command::History { json } => {
            let history = load_history(&config.history)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                print_history(&history);
            }
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let pipeline = ForecastPipeline::from_config(&config).await?;
            info!("Serving forecasts with model {}", pipeline.model().name);
            let state = AppState {
                pipeline: Arc::new(pipeline),
                history: config.history.clone(),
            };
            web::run(state, &config.server).await?;
        }
    }
    Ok(())
}

fn print_summary(cli: &Cli, config: &AqiCastConfig) {
    let config_path = cli
        .config
        .clone()
        .or_else(AqiCastConfig::get_config_path)
        .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());

    println!("AQICast v{}", aqicast::VERSION);
    println!("Using config from: {config_path}");
    println!("Model path: {}", config.model.path);
    println!("Cache location: {}", config.cache.location);
    println!("Log level: {}", config.logging.level);
    println!();
    println!("Run `aqicast forecast` to predict air quality for your location.");
}

fn print_forecast(forecast: &DashboardForecast) {
    println!("AQI forecast for {}", forecast.coordinates);
    println!("Model: {}", forecast.model);
    println!();
    for prediction in &forecast.predictions {
        println!("{prediction}");
    }
}

fn print_history(history: &AqiHistory) {
    if history.is_empty() {
        println!("No historical AQI readings found.");
        return;
    }
    println!("Daily mean AQI:");
    for day in &history.daily {
        println!("  {}: {:.1}", day.timestamp, day.aqi);
    }
    println!();
    println!("Distribution:");
    for bin in &history.histogram {
        println!("  {:>6.1} - {:>6.1}: {}", bin.lower, bin.upper, bin.count);
    }
}
