use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

pub const HOURS_PER_DAY_WINDOW: i64 = 6;
pub const MINUTE_STEP: i64 = 10;
pub const WEEKDAYS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Going,
    Returning,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Going, Direction::Returning];

    pub fn anchor_hour(&self) -> i64 {
        match self {
            Direction::Going => 6,
            Direction::Returning => 14,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Going => "going",
            Direction::Returning => "returning",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("unknown direction {0:?}, expected \"going\" or \"returning\"")]
    UnknownDirection(String),
}

impl FromStr for Direction {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "going" => Ok(Direction::Going),
            "returning" => Ok(Direction::Returning),
            other => Err(GridError::UnknownDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridMode {
    /// Five weekdays, six hours, every ten minutes.
    Full,
    /// Six hourly samples on a single day.
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    mode: GridMode,
    first_day: NaiveDate,
}

impl TimeGrid {
    /// Grid anchored on the day after `today`.
    pub fn from_invocation(mode: GridMode, today: NaiveDate) -> TimeGrid {
        TimeGrid::starting(mode, today + Duration::days(1))
    }

    pub fn starting(mode: GridMode, first_day: NaiveDate) -> TimeGrid {
        TimeGrid { mode, first_day }
    }

    pub fn mode(&self) -> GridMode {
        self.mode
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn len(&self) -> usize {
        match self.mode {
            GridMode::Full => {
                WEEKDAYS * HOURS_PER_DAY_WINDOW as usize * (60 / MINUTE_STEP) as usize
            }
            GridMode::Test => HOURS_PER_DAY_WINDOW as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn departures(&self, direction: Direction) -> Vec<NaiveDateTime> {
        let anchor = direction.anchor_hour();
        match self.mode {
            GridMode::Test => (0..HOURS_PER_DAY_WINDOW)
                .map(|hour| at(self.first_day, anchor + hour, 0))
                .collect(),
            GridMode::Full => weekdays_from(self.first_day)
                .take(WEEKDAYS)
                .flat_map(move |day| {
                    (0..HOURS_PER_DAY_WINDOW).flat_map(move |hour| {
                        (0..60)
                            .step_by(MINUTE_STEP as usize)
                            .map(move |minute| at(day, anchor + hour, minute))
                    })
                })
                .collect(),
        }
    }
}

pub fn generate_departures(
    direction: &str,
    grid: &TimeGrid,
) -> Result<Vec<NaiveDateTime>, GridError> {
    let direction: Direction = direction.parse()?;
    Ok(grid.departures(direction))
}

fn at(day: NaiveDate, hour: i64, minute: i64) -> NaiveDateTime {
    day.and_time(NaiveTime::default()) + Duration::hours(hour) + Duration::minutes(minute)
}

fn weekdays_from(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..)
        .map(move |offset| start + Duration::days(offset))
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
}
