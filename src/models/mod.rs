use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackType {
    #[serde(rename = "RT")]
    Rt,
    #[serde(rename = "CT")]
    Ct,
}

impl TrackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Rt => "RT",
            TrackType::Ct => "CT",
        }
    }

    /// Anything that isn't "CT" (case-insensitive) is a regular track war.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("CT") => TrackType::Ct,
            _ => TrackType::Rt,
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub role: String,
    pub ally: bool,
}

impl Player {
    pub fn runner(name: String) -> Self {
        Self {
            name,
            role: "Runner".to_string(),
            ally: false,
        }
    }
}

/// A war (match) posted on a team's billboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct War {
    pub id: String,
    pub war_type: TrackType,
    pub team_name: String,
    pub gathered: bool,
    pub search_in_advance: bool,
    pub start_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub ally_count: i64,
    pub lineup: Vec<Player>,
}

impl War {
    pub fn new(war_type: TrackType, team_name: String, creator: Player) -> Self {
        let now = Utc::now();
        let ally_count = if creator.ally { 1 } else { 0 };

        Self {
            id: Uuid::new_v4().to_string(),
            war_type,
            team_name,
            gathered: false,
            search_in_advance: false,
            start_time: now,
            last_updated: now,
            ally_count,
            lineup: vec![creator],
        }
    }
}
