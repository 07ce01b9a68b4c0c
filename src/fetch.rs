use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeZone};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    distance_matrix::{matrix_request, MatrixRequest},
    traffic_model::TrafficModel,
};

pub const SENTINEL: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to routing service failed: {0}")]
    Request(String),
    #[error("routing service answered {status}: {}", .message.as_deref().unwrap_or("no message"))]
    ServiceStatus {
        status: String,
        message: Option<String>,
    },
    #[error("route element status {0}")]
    ElementStatus(String),
    #[error("response has no duration_in_traffic")]
    MissingDuration,
    #[error("departure {0} does not exist in local time")]
    DepartureTime(NaiveDateTime),
}

#[allow(async_fn_in_trait)]
pub trait TravelTimeSource {
    async fn travel_time(
        &self,
        origin: &str,
        destination: &str,
        departure: NaiveDateTime,
        model: TrafficModel,
    ) -> Result<u32, FetchError>;
}

// Serialized as a plain integer, failed lookups as -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", from = "i64")]
pub enum TravelTimeSample {
    Seconds(u32),
    Failed,
}

impl TravelTimeSample {
    pub fn is_failed(&self) -> bool {
        matches!(self, TravelTimeSample::Failed)
    }

    pub fn value(&self) -> i64 {
        match self {
            TravelTimeSample::Seconds(seconds) => *seconds as i64,
            TravelTimeSample::Failed => SENTINEL,
        }
    }
}

impl From<TravelTimeSample> for i64 {
    fn from(sample: TravelTimeSample) -> Self {
        sample.value()
    }
}

impl From<i64> for TravelTimeSample {
    fn from(value: i64) -> Self {
        match u32::try_from(value) {
            Ok(seconds) => TravelTimeSample::Seconds(seconds),
            Err(_) => TravelTimeSample::Failed,
        }
    }
}

pub async fn fetch_sample<S: TravelTimeSource>(
    source: &S,
    origin: &str,
    destination: &str,
    departure: NaiveDateTime,
    model: TrafficModel,
) -> TravelTimeSample {
    match source
        .travel_time(origin, destination, departure, model)
        .await
    {
        Ok(seconds) => {
            debug!("{departure} {model}: {seconds}s");
            TravelTimeSample::Seconds(seconds)
        }
        Err(err) => {
            warn!("No travel time for {departure} ({model}): {err}");
            TravelTimeSample::Failed
        }
    }
}

/// Distance-matrix backed source. Departures are wall-clock times in `Tz`.
pub struct DistanceMatrixSource<Tz: TimeZone = Local> {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timezone: Tz,
}

impl DistanceMatrixSource<Local> {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<DistanceMatrixSource<Local>, anyhow::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(DistanceMatrixSource {
            client: builder.build()?,
            endpoint,
            api_key,
            timezone: Local,
        })
    }
}

impl<Tz: TimeZone> DistanceMatrixSource<Tz> {
    pub fn with_timezone<T: TimeZone>(self, timezone: T) -> DistanceMatrixSource<T> {
        DistanceMatrixSource {
            client: self.client,
            endpoint: self.endpoint,
            api_key: self.api_key,
            timezone,
        }
    }
}

pub fn departure_epoch_seconds<Tz: TimeZone>(
    timezone: &Tz,
    departure: NaiveDateTime,
) -> Result<i64, FetchError> {
    timezone
        .from_local_datetime(&departure)
        .earliest()
        .map(|local| local.timestamp())
        .ok_or(FetchError::DepartureTime(departure))
}

impl<Tz: TimeZone> TravelTimeSource for DistanceMatrixSource<Tz> {
    async fn travel_time(
        &self,
        origin: &str,
        destination: &str,
        departure: NaiveDateTime,
        model: TrafficModel,
    ) -> Result<u32, FetchError> {
        let request = MatrixRequest::driving(
            origin,
            destination,
            departure_epoch_seconds(&self.timezone, departure)?,
            model,
            self.api_key.clone(),
        );
        matrix_request(&self.client, &self.endpoint, &request)
            .await
            .map_err(|err| FetchError::Request(format!("{err:#}")))?
            .duration_in_traffic()
    }
}
