//! aerochart - command-line access to chart projections and tiles.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use aerochart_runner::{commands, init_logging, Config};
use chrono::Local;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aerochart")]
#[command(about = "Project coordinates onto aeronautical charts and build their tiles", long_about = None)]
struct Cli {
    /// YAML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory holding chartlimits.csv and the override files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Tile base directory
    #[arg(long)]
    tiles_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set (e.g. "debug")
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every chart in the chart list
    List,

    /// Chart pixel for a latitude/longitude
    Project {
        /// Chart name, with or without revision
        chart: String,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },

    /// Latitude/longitude of a chart pixel
    Unproject {
        chart: String,
        x: f64,
        y: f64,
    },

    /// Whether a latitude/longitude is in the chart's map area
    Charted {
        chart: String,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },

    /// Build every tile of a chart at one scale
    Render {
        chart: String,

        /// Integer downsample factor
        #[arg(long, default_value = "1")]
        scale: u32,

        /// Clear legend pixels
        #[arg(long)]
        no_legends: bool,

        /// Seconds to wait for the loader to finish
        #[arg(long, default_value = "600")]
        timeout: u64,
    },

    /// Delete a chart's generated tiles
    Purge {
        /// Chart name without revision
        chart: String,
    },
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.tiles_dir {
        config.tiles_dir = Some(dir);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(&config.log_level);
    aerochart_metrics::describe_metrics();

    let catalog = config.catalog()?;

    match cli.command {
        Command::List => {
            let today = Local::now().date_naive();
            for chart in commands::list(&catalog, today) {
                let expiration = chart
                    .expiration
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<40} {:<8} {:>6}x{:<6} {}{}",
                    chart.full_name,
                    chart.projection,
                    chart.width,
                    chart.height,
                    expiration,
                    if chart.expired { " (expired)" } else { "" }
                );
            }
        }
        Command::Project { chart, lat, lon } => {
            let (pixel, in_bounds) = commands::project(&catalog, &chart, lat, lon)?;
            println!(
                "{:.2},{:.2}{}",
                pixel.x,
                pixel.y,
                if in_bounds { "" } else { " (off chart)" }
            );
        }
        Command::Unproject { chart, x, y } => {
            let ll = commands::unproject(&catalog, &chart, x, y)?;
            println!("{:.6},{:.6}", ll.lat, ll.lon);
        }
        Command::Charted { chart, lat, lon } => {
            println!("{}", commands::charted(&catalog, &chart, lat, lon)?);
        }
        Command::Render {
            chart,
            scale,
            no_legends,
            timeout,
        } => {
            let summary = commands::render(
                &config,
                &catalog,
                &chart,
                scale.max(1),
                !no_legends,
                Duration::from_secs(timeout),
            )?;
            println!("{} of {} tiles ready", summary.ready, summary.tiles);
        }
        Command::Purge { chart } => {
            let removed = commands::purge(&config, &catalog, &chart)?;
            println!("removed {removed} generated tiles");
        }
    }
    Ok(())
}
