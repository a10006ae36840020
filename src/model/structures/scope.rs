use crate::error::ProcessorError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A rating pool with an independent namespace. Each scope reads its own
/// snapshot table and writes its own record table; the schema itself is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RatingScope {
    Events,
    Heats
}

impl RatingScope {
    /// Server tag stored on event rows, used to filter joins by scope.
    pub fn server(&self) -> &'static str {
        match self {
            RatingScope::Events => "events",
            RatingScope::Heats => "heats"
        }
    }

    /// Table holding previously rated participations for this scope.
    pub fn read_table(&self) -> &'static str {
        match self {
            RatingScope::Events => "base.elo_events",
            RatingScope::Heats => "base.elo_heats"
        }
    }

    /// Table receiving the rating records produced by a run.
    pub fn write_table(&self) -> &'static str {
        match self {
            RatingScope::Events => "enriched.new_event_elos",
            RatingScope::Heats => "enriched.new_heat_elos"
        }
    }
}

impl fmt::Display for RatingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.server())
    }
}

impl FromStr for RatingScope {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "events" => Ok(RatingScope::Events),
            "heats" => Ok(RatingScope::Heats),
            other => Err(ProcessorError::UnsupportedScope(other.to_string()))
        }
    }
}
