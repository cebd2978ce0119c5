//! Per-season team/conference snapshots held in memory for the backfill.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use crate::cbbd::types::TeamInfo;
use crate::cli::types::{ConferenceId, Season, SourceId, TeamId};

/// Every conference listing of each team in one season, in API order.
pub type SeasonTeams = HashMap<SourceId, Vec<Option<ConferenceId>>>;

/// Every fetched season, keyed by season.
///
/// Only seasons that returned at least one usable team are stored, so a
/// missing key always means "no data", never "no teams".
#[derive(Debug, Clone, Default)]
pub struct SeasonSnapshots {
    seasons: BTreeMap<Season, SeasonTeams>,
}

impl SeasonSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seasons<I>(seasons: I) -> Self
    where
        I: IntoIterator<Item = (Season, Vec<TeamInfo>)>,
    {
        let mut snapshots = Self::new();
        for (season, teams) in seasons {
            snapshots.insert_season(season, &teams);
        }
        snapshots
    }

    /// Add one season's `/teams` listing. Teams without a source id are
    /// ignored. Returns the number of distinct teams recorded.
    pub fn insert_season(&mut self, season: Season, teams: &[TeamInfo]) -> usize {
        for team in teams {
            if let Some(source_id) = &team.source_id {
                self.report(season, source_id.clone(), team.conference_id);
            }
        }
        self.seasons.get(&season).map_or(0, HashMap::len)
    }

    /// Record that `source_id` was listed under `conference` in `season`.
    pub fn report(&mut self, season: Season, source_id: SourceId, conference: Option<ConferenceId>) {
        self.seasons
            .entry(season)
            .or_default()
            .entry(source_id)
            .or_default()
            .push(conference);
    }

    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    pub fn has_season(&self, season: Season) -> bool {
        self.seasons.contains_key(&season)
    }

    /// Seasons with data, oldest first.
    pub fn seasons(&self) -> impl DoubleEndedIterator<Item = Season> + '_ {
        self.seasons.keys().copied()
    }

    pub fn teams(&self, season: Season) -> Option<&SeasonTeams> {
        self.seasons.get(&season)
    }

    pub fn reports(&self, season: Season, source_id: &SourceId) -> Option<&[Option<ConferenceId>]> {
        self.seasons.get(&season)?.get(source_id).map(Vec::as_slice)
    }

    pub fn appeared(&self, season: Season, source_id: &SourceId) -> bool {
        self.reports(season, source_id).is_some()
    }

    /// Seasons with data strictly after `season`, oldest first.
    pub fn after(&self, season: Season) -> impl Iterator<Item = (Season, &SeasonTeams)> + '_ {
        self.seasons
            .range((Bound::Excluded(season), Bound::Unbounded))
            .map(|(s, teams)| (*s, teams))
    }

    /// First and last season each team appears in.
    pub fn appearance_ranges(&self) -> BTreeMap<SourceId, (Season, Season)> {
        let mut ranges: BTreeMap<SourceId, (Season, Season)> = BTreeMap::new();
        for (season, teams) in &self.seasons {
            for source_id in teams.keys() {
                ranges
                    .entry(source_id.clone())
                    .and_modify(|(_, last)| *last = *season)
                    .or_insert((*season, *season));
            }
        }
        ranges
    }
}

/// State shared by the resolution, gap-filling and validation passes.
#[derive(Debug, Clone, Default)]
pub struct HistoryContext {
    pub snapshots: SeasonSnapshots,
    /// Upstream source id -> owned `teams.id`.
    pub team_ids: HashMap<SourceId, TeamId>,
}

impl HistoryContext {
    pub fn new(snapshots: SeasonSnapshots, team_ids: HashMap<SourceId, TeamId>) -> Self {
        Self { snapshots, team_ids }
    }

    pub fn team_id(&self, source_id: &SourceId) -> Option<TeamId> {
        self.team_ids.get(source_id).copied()
    }
}
