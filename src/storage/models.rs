//! Typed rows written by the API-driven jobs

use crate::cli::types::{AthleteId, ConferenceId, Season, SourceId, TeamId};
use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Record;

/// Serialize a typed row into a datastore record.
pub fn to_record<T: Serialize>(row: &T) -> Result<Record> {
    match serde_json::to_value(row)? {
        Value::Object(map) => Ok(map),
        other => Err(ImportError::Aborted {
            reason: format!("row did not serialize to an object: {other}"),
        }),
    }
}

/// One team's conference affiliation for one season.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub team_id: TeamId,
    pub season: Season,
    pub conference_id: Option<ConferenceId>,
    /// `false` marks a gap-filled season the team is not known to have played.
    pub existed: bool,
}

impl HistoryRecord {
    pub fn known(team_id: TeamId, season: Season, conference_id: ConferenceId) -> Self {
        Self::observed(team_id, season, Some(conference_id))
    }

    /// The team played this season; the conference may be unknown.
    pub fn observed(team_id: TeamId, season: Season, conference_id: Option<ConferenceId>) -> Self {
        Self {
            team_id,
            season,
            conference_id,
            existed: true,
        }
    }

    pub fn placeholder(team_id: TeamId, season: Season) -> Self {
        Self {
            team_id,
            season,
            conference_id: None,
            existed: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !self.existed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConferenceRow {
    pub id: ConferenceId,
    pub name: String,
    pub abbreviation: Option<String>,
    pub short_name: Option<String>,
}

/// Team row keyed on `source_id`; `id` is assigned by the datastore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRow {
    pub source_id: SourceId,
    pub school: Option<String>,
    pub mascot: Option<String>,
    pub abbreviation: Option<String>,
    pub display_name: Option<String>,
    pub short_display_name: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub current_venue_id: Option<i64>,
    pub current_venue: Option<String>,
    pub current_city: Option<String>,
    pub current_state: Option<String>,
    pub last_active_season: Season,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueRow {
    pub id: i64,
    pub source_id: Option<SourceId>,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub season: Season,
    pub season_type: String,
    pub week: i64,
    pub poll_date: Option<String>,
    pub poll_type: String,
    pub team_id: i64,
    pub team: String,
    pub conference: Option<String>,
    pub ranking: Option<i64>,
    pub points: i64,
    pub first_place_votes: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub id: AthleteId,
    pub source_id: Option<SourceId>,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub height: Option<i64>,
    pub weight: Option<i64>,
    pub hometown_city: Option<String>,
    pub hometown_state: Option<String>,
    pub hometown_country: Option<String>,
    pub first_season: Season,
    pub last_season: Season,
    pub roster_data_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntryRow {
    pub athlete_id: AthleteId,
    pub team_id: TeamId,
    pub season: Season,
    pub jersey: Option<String>,
    pub position: Option<String>,
    pub height: Option<i64>,
    pub weight: Option<i64>,
}
