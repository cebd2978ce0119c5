//! Backward conference resolution.
//!
//! Seasons are walked newest first. A team listed under one conference in a
//! season gets that conference. A team listed under several is disambiguated
//! by looking forward for its *eventual* conference, the first later season
//! in which it is listed exactly once under a known conference; the season's
//! record is the listing that differs from it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use clap::ValueEnum;
use tracing::{debug, warn};

use super::snapshots::{HistoryContext, SeasonSnapshots};
use crate::cli::types::{ConferenceId, Season, SourceId, TeamId};
use crate::storage::HistoryRecord;

/// Result of scanning forward from a season with duplicate listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eventual {
    /// Listed exactly once in `season`.
    Found {
        season: Season,
        conference: ConferenceId,
    },
    /// Listed exactly once in `season`, but without a conference id.
    NoConference { season: Season },
    /// Disappears from the data before settling.
    Defunct { missing_from: Season },
    /// Still duplicated in every later season with data.
    NeverStabilized,
}

impl fmt::Display for Eventual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eventual::Found { season, conference } => {
                write!(f, "settles in conference {conference} in {season}")
            }
            Eventual::NoConference { season } => {
                write!(f, "listed once without a conference in {season}")
            }
            Eventual::Defunct { missing_from } => write!(f, "gone from the data in {missing_from}"),
            Eventual::NeverStabilized => f.write_str("never listed under one conference again"),
        }
    }
}

/// What to do with a duplicated season that has no eventual conference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FallbackPolicy {
    /// Store the smallest reported conference id, flagged as low confidence.
    #[default]
    Smallest,
    /// Store nothing; the gap filler marks the season as unresolved.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Only one conference was reported.
    Single(Option<ConferenceId>),
    /// Duplicates narrowed to one conference by the eventual conference.
    Resolved {
        eventual: ConferenceId,
        conference: Option<ConferenceId>,
    },
    /// More than one listing differs from the eventual conference.
    MultiValued {
        eventual: ConferenceId,
        candidates: Vec<Option<ConferenceId>>,
    },
    /// No eventual conference; the smallest reported id was taken.
    LowConfidence {
        reason: Eventual,
        reported: Vec<Option<ConferenceId>>,
        chosen: Option<ConferenceId>,
    },
    /// No eventual conference and the fallback is disabled.
    Unresolved {
        reason: Eventual,
        reported: Vec<Option<ConferenceId>>,
    },
    /// Every listing equals the eventual conference.
    Anomaly {
        eventual: ConferenceId,
        reported: Vec<Option<ConferenceId>>,
    },
}

impl Resolution {
    /// Whether a history record is written for this season.
    pub fn writes_record(&self) -> bool {
        !matches!(self, Resolution::Unresolved { .. } | Resolution::Anomaly { .. })
    }

    /// Conference stored in the history record.
    pub fn conference(&self) -> Option<ConferenceId> {
        match self {
            Resolution::Single(conference) => *conference,
            Resolution::Resolved { conference, .. } => *conference,
            Resolution::MultiValued { candidates, .. } => smallest(candidates),
            Resolution::LowConfidence { chosen, .. } => *chosen,
            Resolution::Unresolved { .. } | Resolution::Anomaly { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSeason {
    pub source_id: SourceId,
    pub season: Season,
    pub resolution: Resolution,
}

/// Smallest concrete conference id, or `None` when every value is unknown.
fn smallest(values: &[Option<ConferenceId>]) -> Option<ConferenceId> {
    values.iter().flatten().min().copied()
}

fn describe(values: &[Option<ConferenceId>]) -> String {
    let parts: Vec<String> = values
        .iter()
        .map(|v| v.map_or_else(|| "none".to_string(), |c| c.to_string()))
        .collect();
    parts.join(", ")
}

/// Scan forward from `season` for the first season listing the team once.
///
/// Seasons without any data are skipped. A season with data that does not
/// list the team ends the scan as [`Eventual::Defunct`]; a single listing
/// with no conference id ends it as [`Eventual::NoConference`].
pub fn find_eventual_conference(
    snapshots: &SeasonSnapshots,
    source_id: &SourceId,
    season: Season,
) -> Eventual {
    for (later, teams) in snapshots.after(season) {
        match teams.get(source_id).map(Vec::as_slice) {
            None => return Eventual::Defunct { missing_from: later },
            Some([Some(conference)]) => {
                return Eventual::Found {
                    season: later,
                    conference: *conference,
                }
            }
            Some([None]) => return Eventual::NoConference { season: later },
            Some(_) => continue,
        }
    }
    Eventual::NeverStabilized
}

fn resolve_one(
    snapshots: &SeasonSnapshots,
    source_id: &SourceId,
    season: Season,
    reported: &[Option<ConferenceId>],
    policy: FallbackPolicy,
) -> Resolution {
    if let [conference] = reported {
        return Resolution::Single(*conference);
    }

    let mut distinct = reported.to_vec();
    distinct.sort();
    distinct.dedup();

    match find_eventual_conference(snapshots, source_id, season) {
        Eventual::Found { conference: eventual, .. } => {
            let candidates: Vec<Option<ConferenceId>> =
                distinct.into_iter().filter(|c| *c != Some(eventual)).collect();
            match candidates.len() {
                0 => Resolution::Anomaly {
                    eventual,
                    reported: reported.to_vec(),
                },
                1 => Resolution::Resolved {
                    eventual,
                    conference: candidates[0],
                },
                _ => Resolution::MultiValued { eventual, candidates },
            }
        }
        reason => match policy {
            FallbackPolicy::Smallest => Resolution::LowConfidence {
                reason,
                chosen: smallest(&distinct),
                reported: distinct,
            },
            FallbackPolicy::Unresolved => Resolution::Unresolved {
                reason,
                reported: distinct,
            },
        },
    }
}

/// Resolve every (team, season) in the snapshots, newest season first.
///
/// Teams within a season are ordered by source id so runs are repeatable.
pub fn resolve_conferences(
    snapshots: &SeasonSnapshots,
    policy: FallbackPolicy,
) -> Vec<ResolvedSeason> {
    let mut resolved = Vec::new();

    for season in snapshots.seasons().rev() {
        let Some(teams) = snapshots.teams(season) else {
            continue;
        };
        let mut source_ids: Vec<&SourceId> = teams.keys().collect();
        source_ids.sort();

        for source_id in source_ids {
            let reported = &teams[source_id];
            let resolution = resolve_one(snapshots, source_id, season, reported, policy);
            debug!(%source_id, %season, ?resolution, "Resolved conference");
            resolved.push(ResolvedSeason {
                source_id: source_id.clone(),
                season,
                resolution,
            });
        }
    }

    resolved
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub single: usize,
    pub duplicates_resolved: usize,
    pub multi_valued: usize,
    pub low_confidence: usize,
    pub unresolved: usize,
    pub anomalies: usize,
    pub skipped_unmapped: usize,
}

/// History rows produced by the resolution pass.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuild {
    pub records: Vec<HistoryRecord>,
    pub stats: ResolutionStats,
    /// Source ids with no row in `teams`.
    pub unmapped: BTreeSet<SourceId>,
    pub warnings: Vec<String>,
}

/// Turn resolutions into history records keyed by owned team id.
///
/// Unmapped source ids are skipped and warned about once each. At most one
/// record is produced per (team_id, season).
pub fn history_records(
    resolved: &[ResolvedSeason],
    team_ids: &HashMap<SourceId, TeamId>,
) -> HistoryBuild {
    let mut build = HistoryBuild::default();
    let mut seen: HashSet<(TeamId, Season)> = HashSet::new();

    for item in resolved {
        let Some(team_id) = team_ids.get(&item.source_id).copied() else {
            if build.unmapped.insert(item.source_id.clone()) {
                warn!(source_id = %item.source_id, season = %item.season, "No team_id for source_id");
            }
            build.stats.skipped_unmapped += 1;
            continue;
        };

        let stats = &mut build.stats;
        match &item.resolution {
            Resolution::Single(_) => stats.single += 1,
            Resolution::Resolved { .. } => stats.duplicates_resolved += 1,
            Resolution::MultiValued { eventual, candidates } => {
                stats.duplicates_resolved += 1;
                stats.multi_valued += 1;
                let message = format!(
                    "Team {} in {}: several listings differ from eventual conference {} ({}); storing the smallest",
                    item.source_id,
                    item.season,
                    eventual,
                    describe(candidates)
                );
                warn!("{message}");
                build.warnings.push(message);
            }
            Resolution::LowConfidence { reason, reported, chosen } => {
                stats.duplicates_resolved += 1;
                stats.low_confidence += 1;
                let message = format!(
                    "Team {} in {}: no eventual conference ({reason}); fell back to {} from ({})",
                    item.source_id,
                    item.season,
                    describe(&[*chosen]),
                    describe(reported)
                );
                warn!("{message}");
                build.warnings.push(message);
            }
            Resolution::Unresolved { reason, reported } => {
                stats.unresolved += 1;
                let message = format!(
                    "Team {} in {}: no eventual conference ({reason}); left unresolved ({})",
                    item.source_id,
                    item.season,
                    describe(reported)
                );
                warn!("{message}");
                build.warnings.push(message);
            }
            Resolution::Anomaly { eventual, reported } => {
                stats.anomalies += 1;
                let message = format!(
                    "Team {} in {}: all listings ({}) match eventual conference {}",
                    item.source_id,
                    item.season,
                    describe(reported),
                    eventual
                );
                warn!("{message}");
                build.warnings.push(message);
            }
        }

        if !item.resolution.writes_record() {
            continue;
        }
        if !seen.insert((team_id, item.season)) {
            let message = format!(
                "Team {team_id} in {}: another source id already produced a record",
                item.season
            );
            warn!("{message}");
            build.warnings.push(message);
            continue;
        }
        build.records.push(HistoryRecord::observed(
            team_id,
            item.season,
            item.resolution.conference(),
        ));
    }

    build
}

impl HistoryContext {
    /// Resolution pass over the whole context.
    pub fn resolve(&self, policy: FallbackPolicy) -> HistoryBuild {
        let resolved = resolve_conferences(&self.snapshots, policy);
        history_records(&resolved, &self.team_ids)
    }
}

#[cfg(test)]
mod tests;
