use std::{path::PathBuf, time::Duration};

use chrono::{Local, NaiveDate};
use clap::Parser;
use commute_times::{
    collect::{run, CollectionConfig, Commute},
    distance_matrix::DEFAULT_ENDPOINT,
    fetch::DistanceMatrixSource,
    grid::{GridMode, TimeGrid},
    persist::OutputFormat,
};
use log::info;

extern crate commute_times;

#[derive(Parser)]
struct CollectArgs {
    #[arg(long, env = "COMMUTE_TIMES_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "COMMUTE_TIMES_HOME", default_value = "")]
    home: String,
    #[arg(long, env = "COMMUTE_TIMES_WORK", default_value = "")]
    work: String,
    /// Only sample six hourly departures on a single day.
    #[arg(long, env = "COMMUTE_TIMES_TEST_MODE")]
    test_mode: bool,
    /// First day of the grid, defaults to tomorrow.
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    direction: Vec<String>,
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::MessagePack)]
    format: OutputFormat,
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    #[arg(long)]
    timeout_seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let args = CollectArgs::parse();

    let mode = if args.test_mode {
        GridMode::Test
    } else {
        GridMode::Full
    };
    let grid = match args.start_date {
        Some(day) => TimeGrid::starting(mode, day),
        None => TimeGrid::from_invocation(mode, Local::now().date_naive()),
    };
    let config = CollectionConfig {
        commute: Commute {
            home: args.home,
            work: args.work,
        },
        grid,
        directions: vec![],
        output_dir: args.output_dir,
        format: args.format,
    }
    .with_direction_names(&args.direction)?;

    let source = DistanceMatrixSource::new(
        args.endpoint,
        args.api_key,
        args.timeout_seconds.map(Duration::from_secs),
    )?;
    let collected = run(&source, &config).await?;
    info!("Collected {} tables", collected.len());
    Ok(())
}
