use chrono::NaiveDateTime;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    fetch::{fetch_sample, TravelTimeSample, TravelTimeSource},
    grid::Direction,
    traffic_model::TrafficModel,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTimeRow {
    pub departure: NaiveDateTime,
    /// One sample per traffic model, in [`TrafficModel::ALL`] order.
    pub samples: [TravelTimeSample; 3],
}

impl TravelTimeRow {
    #[inline]
    pub fn sample(&self, model: TrafficModel) -> TravelTimeSample {
        self.samples[model.column()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTimeTable {
    direction: Direction,
    origin: String,
    destination: String,
    columns: [TrafficModel; 3],
    rows: Vec<TravelTimeRow>,
}

impl TravelTimeTable {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn columns(&self) -> &[TrafficModel; 3] {
        &self.columns
    }

    pub fn rows(&self) -> &[TravelTimeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, model: TrafficModel) -> Vec<TravelTimeSample> {
        self.rows.iter().map(|row| row.sample(model)).collect()
    }

    pub fn failed_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.samples.iter())
            .filter(|sample| sample.is_failed())
            .count()
    }
}

pub async fn assemble_table<S: TravelTimeSource>(
    source: &S,
    origin: &str,
    destination: &str,
    direction: Direction,
    departures: &[NaiveDateTime],
) -> TravelTimeTable {
    let total = departures.len() * TrafficModel::ALL.len();
    let mut rows = Vec::with_capacity(departures.len());
    for (idx, departure) in departures.iter().enumerate() {
        let mut samples = [TravelTimeSample::Failed; 3];
        for model in TrafficModel::ALL {
            samples[model.column()] =
                fetch_sample(source, origin, destination, *departure, model).await;
        }
        debug!(
            "{direction}: {}/{total} lookups done",
            (idx + 1) * TrafficModel::ALL.len()
        );
        rows.push(TravelTimeRow {
            departure: *departure,
            samples,
        });
    }
    let table = TravelTimeTable {
        direction,
        origin: origin.to_string(),
        destination: destination.to_string(),
        columns: TrafficModel::ALL,
        rows,
    };
    info!(
        "Assembled {direction} table with {} rows, {} failed samples",
        table.len(),
        table.failed_count()
    );
    table
}
