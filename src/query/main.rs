//! Command-line query tool.
//!
//! Loads the region and point-of-interest feeds named in the config, then
//! answers one containment query and prints the result as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fenceline::config::Config;
use fenceline::error::FenceError;
use fenceline::loader::{read_points, read_regions};
use fenceline::params::{parse_coordinate_param, parse_location_key};
use fenceline::pip::{QueryService, SnapshotCell};

mod response;
use response::{location_points_body, region_feature};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Resolve fences and points of interest from local feeds")]
struct Args {
    /// Config file
    #[arg(short, long, default_value = "fenceline.toml")]
    config: PathBuf,

    /// Region feed, overriding the config
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Point of interest feed, overriding the config
    #[arg(long)]
    points: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Regions containing a point
    Area {
        /// Longitude
        #[arg(long, allow_hyphen_values = true)]
        lon: String,
        /// Latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: String,
    },
    /// Points of interest inside the region(s) for a location key
    Pois {
        #[arg(long, allow_hyphen_values = true)]
        location_key: String,
    },
    /// Snapshot version and counts
    Health,
    /// Load the feeds and print the load report
    Check,
}

fn main() -> ExitCode {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {e}");
    }

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            // Client-side mistakes get a distinct status from internal failures
            match e.downcast_ref::<FenceError>() {
                Some(fe) if fe.is_client_error() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::load_from_file(&args.config)?;
    let regions_path = args.regions.unwrap_or(config.data.regions);
    let points_path = args.points.unwrap_or(config.data.points);

    info!("Fenceline query");
    let regions = read_regions(&regions_path)?;
    let points = read_points(&points_path)?;

    let service = QueryService::new(Arc::new(SnapshotCell::new()), config.index);
    let report = service.load(regions, points);

    let body = match args.command {
        Command::Area { lon, lat } => {
            let lon = parse_coordinate_param("lon", &lon)?;
            let lat = parse_coordinate_param("lat", &lat)?;
            let found = service.find_area(lon, lat)?;
            json!({
                "type": "FeatureCollection",
                "features": found.iter().map(|r| region_feature(r)).collect::<Vec<_>>(),
            })
        }
        Command::Pois { location_key } => {
            let key = parse_location_key(&location_key)?;
            let found = service.find_points_of_interest(key)?;
            location_points_body(&found)
        }
        Command::Health => {
            let health = service.health()?;
            let status = if health.is_serving() { "ok" } else { "empty" };
            json!({
                "status": status,
                "snapshot": health,
            })
        }
        Command::Check => {
            let rejected: Vec<_> = report
                .rejected
                .iter()
                .map(|(record, reason)| json!({ "id": record.id(), "reason": reason.to_string() }))
                .collect();
            json!({
                "version": report.version,
                "published": report.published,
                "accepted": report.accepted,
                "rejected": rejected,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
