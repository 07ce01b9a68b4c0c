use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficModel {
    Optimistic,
    BestGuess,
    Pessimistic,
}

impl TrafficModel {
    // Column order of every table.
    pub const ALL: [TrafficModel; 3] = [
        TrafficModel::Optimistic,
        TrafficModel::BestGuess,
        TrafficModel::Pessimistic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficModel::Optimistic => "optimistic",
            TrafficModel::BestGuess => "best_guess",
            TrafficModel::Pessimistic => "pessimistic",
        }
    }

    #[inline]
    pub fn column(&self) -> usize {
        match self {
            TrafficModel::Optimistic => 0,
            TrafficModel::BestGuess => 1,
            TrafficModel::Pessimistic => 2,
        }
    }
}

impl fmt::Display for TrafficModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown traffic model {0:?}")]
pub struct UnknownTrafficModel(pub String);

impl FromStr for TrafficModel {
    type Err = UnknownTrafficModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrafficModel::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| UnknownTrafficModel(s.to_string()))
    }
}
