use crate::cli::types::{AthleteId, ConferenceId, Season, SourceId};
use serde::{Deserialize, Deserializer, Serialize};


/// Accept a JSON string or number and keep it as text (jersey numbers arrive as both).
fn de_opt_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Entry from `/conferences`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conference {
    pub id: ConferenceId,
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

/// Entry from `/teams?season=`. One row per team per season, except that a
/// team with an ambiguous affiliation can be listed once per conference.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamInfo {
    pub id: Option<i64>,
    pub source_id: Option<SourceId>,
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
    pub conference_id: Option<ConferenceId>,
    pub conference: Option<String>,
}

/// Entry from `/teams/roster?season=`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRoster {
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub team_source_id: Option<SourceId>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub season: Option<Season>,
    #[serde(default)]
    pub players: Vec<RosterPlayer>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPlayer {
    pub id: AthleteId,
    #[serde(default)]
    pub source_id: Option<SourceId>,
    pub name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_lenient_string")]
    pub jersey: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub hometown: Option<Hometown>,
    #[serde(default)]
    pub start_season: Option<Season>,
    #[serde(default)]
    pub end_season: Option<Season>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Hometown {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Entry from `/rankings`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub season: Season,
    pub season_type: String,
    pub week: i64,
    #[serde(default)]
    pub poll_date: Option<String>,
    pub poll_type: String,
    pub team_id: i64,
    pub team: String,
    #[serde(default)]
    pub conference: Option<String>,
    /// `None` for teams only receiving votes.
    #[serde(default)]
    pub ranking: Option<i64>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub first_place_votes: Option<i64>,
}

/// Entry from `/venues`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: i64,
    #[serde(default)]
    pub source_id: Option<SourceId>,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}
