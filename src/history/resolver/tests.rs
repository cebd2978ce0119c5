//! Unit tests for the backward conference resolver

use super::*;
use crate::cbbd::types::TeamInfo;
use std::collections::BTreeMap;

const A: ConferenceId = ConferenceId(1);
const B: ConferenceId = ConferenceId(2);
const C: ConferenceId = ConferenceId(3);

fn listing(source_id: &str, conference: ConferenceId) -> TeamInfo {
    TeamInfo {
        source_id: Some(SourceId::new(source_id)),
        conference_id: Some(conference),
        ..Default::default()
    }
}

/// Build snapshots from `(season, source_id, conference)` listings.
fn snapshots(listings: &[(u16, &str, ConferenceId)]) -> SeasonSnapshots {
    let mut by_season: BTreeMap<Season, Vec<TeamInfo>> = BTreeMap::new();
    for (season, source_id, conference) in listings {
        by_season
            .entry(Season::new(*season))
            .or_default()
            .push(listing(source_id, *conference));
    }
    SeasonSnapshots::from_seasons(by_season)
}

fn resolution_for(resolved: &[ResolvedSeason], source_id: &str, season: u16) -> Resolution {
    resolved
        .iter()
        .find(|r| r.source_id.as_str() == source_id && r.season == Season::new(season))
        .map(|r| r.resolution.clone())
        .unwrap()
}

fn team_map(pairs: &[(&str, i64)]) -> HashMap<SourceId, TeamId> {
    pairs
        .iter()
        .map(|(source, id)| (SourceId::new(*source), TeamId::new(*id)))
        .collect()
}

#[test]
fn test_duplicate_resolved_to_non_eventual_conference() {
    // A in 2010 and 2011, B in 2010 only, A alone from 2012 on.
    let data = snapshots(&[
        (2010, "T", A),
        (2010, "T", B),
        (2011, "T", A),
        (2012, "T", A),
        (2013, "T", A),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);

    assert_eq!(
        resolution_for(&resolved, "T", 2010),
        Resolution::Resolved {
            eventual: A,
            conference: Some(B)
        }
    );
    assert_eq!(resolution_for(&resolved, "T", 2011), Resolution::Single(Some(A)));

    let build = history_records(&resolved, &team_map(&[("T", 7)]));
    let for_2010: Vec<&HistoryRecord> =
        build.records.iter().filter(|r| r.season == Season::new(2010)).collect();
    assert_eq!(for_2010.len(), 1);
    assert_eq!(for_2010[0].conference_id, Some(B));
    assert!(for_2010[0].existed);
}

#[test]
fn test_seasons_processed_newest_first() {
    let data = snapshots(&[
        (2008, "T", A),
        (2009, "T", A),
        (2010, "T", A),
    ]);
    let seasons: Vec<u16> = resolve_conferences(&data, FallbackPolicy::Smallest)
        .iter()
        .map(|r| r.season.as_u16())
        .collect();
    assert_eq!(seasons, vec![2010, 2009, 2008]);
}

#[test]
fn test_single_listings_map_one_to_one() {
    let data = snapshots(&[
        (2015, "X", A),
        (2015, "Y", B),
        (2015, "Z", C),
        (2016, "X", B),
        (2016, "Y", B),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);
    let build = history_records(&resolved, &team_map(&[("X", 1), ("Y", 2), ("Z", 3)]));

    assert_eq!(build.records.len(), 5);
    assert_eq!(build.stats.single, 5);
    for item in &resolved {
        let reported = data.reports(item.season, &item.source_id).unwrap();
        assert_eq!(item.resolution, Resolution::Single(reported[0]));
    }
}

#[test]
fn test_eventual_scan_skips_seasons_without_data() {
    let data = snapshots(&[
        (2000, "T", A),
        (2000, "T", B),
        (2003, "T", B),
    ]);
    assert_eq!(
        find_eventual_conference(&data, &SourceId::new("T"), Season::new(2000)),
        Eventual::Found {
            season: Season::new(2003),
            conference: B
        }
    );
}

#[test]
fn test_eventual_scan_passes_over_still_duplicated_seasons() {
    let data = snapshots(&[
        (2000, "T", A),
        (2000, "T", B),
        (2001, "T", A),
        (2001, "T", B),
        (2002, "T", B),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);

    for season in [2000, 2001] {
        assert_eq!(
            resolution_for(&resolved, "T", season),
            Resolution::Resolved {
                eventual: B,
                conference: Some(A)
            }
        );
    }
}

#[test]
fn test_defunct_team_falls_back_to_smallest_id() {
    let data = snapshots(&[
        (2000, "T", C),
        (2000, "T", B),
        (2001, "U", A),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);

    assert_eq!(
        resolution_for(&resolved, "T", 2000),
        Resolution::LowConfidence {
            reason: Eventual::Defunct {
                missing_from: Season::new(2001)
            },
            reported: vec![Some(B), Some(C)],
            chosen: Some(B),
        }
    );

    let build = history_records(&resolved, &team_map(&[("T", 1), ("U", 2)]));
    assert_eq!(build.stats.low_confidence, 1);
    assert_eq!(build.warnings.len(), 1);
    assert!(build.records.contains(&HistoryRecord::known(TeamId::new(1), Season::new(2000), B)));
}

#[test]
fn test_never_stabilized_is_reported() {
    let data = snapshots(&[
        (2024, "T", A),
        (2024, "T", B),
        (2025, "T", A),
        (2025, "T", C),
    ]);
    assert_eq!(
        find_eventual_conference(&data, &SourceId::new("T"), Season::new(2024)),
        Eventual::NeverStabilized
    );
    assert_eq!(
        find_eventual_conference(&data, &SourceId::new("T"), Season::new(2025)),
        Eventual::NeverStabilized
    );
}

fn conference_less_later_listing() -> SeasonSnapshots {
    let no_conference = TeamInfo {
        source_id: Some(SourceId::new("T")),
        conference_id: None,
        ..Default::default()
    };
    SeasonSnapshots::from_seasons(vec![
        (Season::new(2010), vec![listing("T", A), listing("T", B)]),
        (Season::new(2011), vec![no_conference]),
    ])
}

#[test]
fn test_later_listing_without_conference_is_not_eventual() {
    let data = conference_less_later_listing();
    assert_eq!(
        find_eventual_conference(&data, &SourceId::new("T"), Season::new(2010)),
        Eventual::NoConference {
            season: Season::new(2011)
        }
    );

    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);
    assert_eq!(
        resolution_for(&resolved, "T", 2010),
        Resolution::LowConfidence {
            reason: Eventual::NoConference {
                season: Season::new(2011)
            },
            reported: vec![Some(A), Some(B)],
            chosen: Some(A),
        }
    );
    let build = history_records(&resolved, &team_map(&[("T", 1)]));
    assert_eq!(build.stats.low_confidence, 1);
    assert_eq!(build.stats.multi_valued, 0);
}

#[test]
fn test_later_listing_without_conference_respects_unresolved_policy() {
    let resolved = resolve_conferences(&conference_less_later_listing(), FallbackPolicy::Unresolved);

    assert!(matches!(
        resolution_for(&resolved, "T", 2010),
        Resolution::Unresolved {
            reason: Eventual::NoConference { .. },
            ..
        }
    ));
    let build = history_records(&resolved, &team_map(&[("T", 1)]));
    assert!(build.records.iter().all(|r| r.season != Season::new(2010)));
}

#[test]
fn test_unresolved_policy_writes_nothing() {
    let data = snapshots(&[
        (2025, "T", A),
        (2025, "T", B),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Unresolved);

    assert!(matches!(
        resolution_for(&resolved, "T", 2025),
        Resolution::Unresolved { .. }
    ));
    let build = history_records(&resolved, &team_map(&[("T", 1)]));
    assert!(build.records.is_empty());
    assert_eq!(build.stats.unresolved, 1);
}

#[test]
fn test_multi_valued_outcome_is_kept_explicit() {
    let data = snapshots(&[
        (2000, "T", C),
        (2000, "T", A),
        (2000, "T", B),
        (2001, "T", A),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);

    assert_eq!(
        resolution_for(&resolved, "T", 2000),
        Resolution::MultiValued {
            eventual: A,
            candidates: vec![Some(B), Some(C)]
        }
    );

    let build = history_records(&resolved, &team_map(&[("T", 1)]));
    assert_eq!(build.stats.multi_valued, 1);
    assert_eq!(build.warnings.len(), 1);
    let stored: Vec<&HistoryRecord> =
        build.records.iter().filter(|r| r.season == Season::new(2000)).collect();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].conference_id, Some(B));
}

#[test]
fn test_repeated_listing_matching_eventual_is_anomaly() {
    let data = snapshots(&[
        (2000, "T", A),
        (2000, "T", A),
        (2001, "T", A),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);

    assert!(matches!(
        resolution_for(&resolved, "T", 2000),
        Resolution::Anomaly { eventual: A, .. }
    ));
    let build = history_records(&resolved, &team_map(&[("T", 1)]));
    assert_eq!(build.stats.anomalies, 1);
    assert!(build.records.iter().all(|r| r.season != Season::new(2000)));
}

#[test]
fn test_records_exclude_eventual_conference() {
    let data = snapshots(&[
        (2005, "P", A),
        (2005, "P", B),
        (2005, "Q", B),
        (2005, "Q", C),
        (2006, "P", A),
        (2006, "Q", C),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);
    let build = history_records(&resolved, &team_map(&[("P", 1), ("Q", 2)]));

    for (team, eventual) in [(TeamId::new(1), A), (TeamId::new(2), C)] {
        let record = build
            .records
            .iter()
            .find(|r| r.team_id == team && r.season == Season::new(2005))
            .unwrap();
        assert_ne!(record.conference_id, Some(eventual));
    }
    assert_eq!(build.stats.duplicates_resolved, 2);
}

#[test]
fn test_unmapped_source_ids_warned_once() {
    let data = snapshots(&[
        (2000, "GHOST", A),
        (2001, "GHOST", A),
    ]);
    let resolved = resolve_conferences(&data, FallbackPolicy::Smallest);
    let build = history_records(&resolved, &HashMap::new());

    assert!(build.records.is_empty());
    assert_eq!(build.unmapped.len(), 1);
    assert_eq!(build.stats.skipped_unmapped, 2);
}

#[test]
fn test_context_resolve_uses_team_map() {
    let context = HistoryContext::new(snapshots(&[
        (2020, "T", A),
    ]), team_map(&[("T", 44)]));
    let build = context.resolve(FallbackPolicy::Smallest);
    assert_eq!(
        build.records,
        vec![HistoryRecord::known(TeamId::new(44), Season::new(2020), A)]
    );
}
