use std::path::PathBuf;

use log::{info, warn};

use crate::{
    fetch::TravelTimeSource,
    grid::{Direction, TimeGrid},
    persist::{output_path, write_table, OutputFormat},
    table::assemble_table,
    traffic_model::TrafficModel,
};

pub const DAILY_REQUEST_QUOTA: usize = 2500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commute {
    pub home: String,
    pub work: String,
}

impl Commute {
    pub fn route(&self, direction: Direction) -> (&str, &str) {
        match direction {
            Direction::Going => (self.home.as_str(), self.work.as_str()),
            Direction::Returning => (self.work.as_str(), self.home.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub direction: Direction,
    pub path: PathBuf,
    pub rows: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub commute: Commute,
    pub grid: TimeGrid,
    pub directions: Vec<Direction>,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
}

impl CollectionConfig {
    // An empty list means both directions.
    pub fn with_direction_names(mut self, names: &[String]) -> Result<Self, anyhow::Error> {
        if names.is_empty() {
            self.directions = Direction::ALL.to_vec();
            return Ok(self);
        }
        self.directions = names
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Direction>, _>>()?;
        Ok(self)
    }
}

pub fn estimated_requests(grid: &TimeGrid, directions: &[Direction]) -> usize {
    grid.len() * TrafficModel::ALL.len() * directions.len()
}

pub async fn collect_direction<S: TravelTimeSource>(
    source: &S,
    config: &CollectionConfig,
    direction: Direction,
) -> Result<Collected, anyhow::Error> {
    let departures = config.grid.departures(direction);
    let (origin, destination) = config.commute.route(direction);
    info!(
        "Collecting {direction}: {} departures from {origin:?} to {destination:?}",
        departures.len()
    );
    let table = assemble_table(source, origin, destination, direction, &departures).await;
    let path = output_path(&config.output_dir, direction, config.format);
    write_table(&table, &path, config.format)?;
    Ok(Collected {
        direction,
        path,
        rows: table.len(),
        failed: table.failed_count(),
    })
}

pub async fn collect_morning<S: TravelTimeSource>(
    source: &S,
    config: &CollectionConfig,
) -> Result<Collected, anyhow::Error> {
    collect_direction(source, config, Direction::Going).await
}

pub async fn collect_afternoon<S: TravelTimeSource>(
    source: &S,
    config: &CollectionConfig,
) -> Result<Collected, anyhow::Error> {
    collect_direction(source, config, Direction::Returning).await
}

pub async fn run<S: TravelTimeSource>(
    source: &S,
    config: &CollectionConfig,
) -> Result<Vec<Collected>, anyhow::Error> {
    let requests = estimated_requests(&config.grid, &config.directions);
    info!(
        "{:?} grid starting {}: {requests} requests planned",
        config.grid.mode(),
        config.grid.first_day()
    );
    if requests > DAILY_REQUEST_QUOTA {
        warn!("{requests} requests exceed the daily quota of {DAILY_REQUEST_QUOTA}");
    }
    if config.commute.home.is_empty() || config.commute.work.is_empty() {
        warn!("Home or work address is empty, every lookup will likely fail");
    }

    let mut collected = Vec::with_capacity(config.directions.len());
    for direction in &config.directions {
        collected.push(match direction {
            Direction::Going => collect_morning(source, config).await?,
            Direction::Returning => collect_afternoon(source, config).await?,
        });
    }
    for table in &collected {
        info!(
            "{}: {} rows, {} of {} samples failed, saved to {:?}",
            table.direction,
            table.rows,
            table.failed,
            table.rows * TrafficModel::ALL.len(),
            table.path
        );
    }
    Ok(collected)
}
