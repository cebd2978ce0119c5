//! Poll rankings import from `/rankings`.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::common::{print_banner, print_errors, timestamp};
use crate::{
    cbbd::{types::Ranking, CbbdClient},
    cli::types::Season,
    ingest::{coerce::normalize_date, upload_in_batches, UploadMode},
    storage::{get_i64, tables, to_record, RankingRow, Store},
    Result,
};

pub const CHUNK_SIZE: usize = 1000;
const RANKING_KEY: &[&str] = &["season", "season_type", "week", "poll_type", "team_id"];

/// Shape of the raw API response, printed before processing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingsAnalysis {
    pub records: usize,
    pub first_season: Option<Season>,
    pub last_season: Option<Season>,
    pub poll_types: BTreeSet<String>,
    pub unique_teams: usize,
    pub with_poll_date: usize,
}

impl RankingsAnalysis {
    pub fn poll_date_share(&self) -> f64 {
        if self.records == 0 {
            return 0.0;
        }
        self.with_poll_date as f64 / self.records as f64 * 100.0
    }

    pub fn print(&self) {
        if let (Some(first), Some(last)) = (self.first_season, self.last_season) {
            println!("  → Seasons covered: {first} to {last}");
        }
        let polls: Vec<&str> = self.poll_types.iter().map(String::as_str).collect();
        println!("  → Poll types: {}", polls.join(", "));
        println!("  → Unique teams: {}", self.unique_teams);
        println!(
            "  → Records with poll_date: {} ({:.1}%)",
            self.with_poll_date,
            self.poll_date_share()
        );
    }
}

pub fn analyze(rankings: &[Ranking]) -> RankingsAnalysis {
    let teams: HashSet<i64> = rankings.iter().map(|r| r.team_id).collect();
    RankingsAnalysis {
        records: rankings.len(),
        first_season: rankings.iter().map(|r| r.season).min(),
        last_season: rankings.iter().map(|r| r.season).max(),
        poll_types: rankings.iter().map(|r| r.poll_type.clone()).collect(),
        unique_teams: teams.len(),
        with_poll_date: rankings
            .iter()
            .filter(|r| r.poll_date.as_deref().is_some_and(|d| !d.is_empty()))
            .count(),
    }
}

/// Map an API ranking to its row; an unparseable poll date is stored as NULL.
pub fn ranking_row(ranking: &Ranking, now: &str) -> RankingRow {
    RankingRow {
        season: ranking.season,
        season_type: ranking.season_type.clone(),
        week: ranking.week,
        poll_date: ranking.poll_date.as_deref().and_then(normalize_date),
        poll_type: ranking.poll_type.clone(),
        team_id: ranking.team_id,
        team: ranking.team.clone(),
        conference: ranking.conference.clone(),
        ranking: ranking.ranking,
        points: ranking.points.unwrap_or(0),
        first_place_votes: ranking.first_place_votes.unwrap_or(0),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}

type RankingKey = (Season, String, i64, String, i64);

fn key(row: &RankingRow) -> RankingKey {
    (
        row.season,
        row.season_type.clone(),
        row.week,
        row.poll_type.clone(),
        row.team_id,
    )
}

/// Collapse rows sharing a ranking key, keeping first-seen order.
///
/// A later row replaces the kept one when it adds a poll date the kept one
/// lacks, or when it carries more points. Returns the rows and the number of
/// duplicates seen.
pub fn dedupe_rankings(rows: Vec<RankingRow>) -> (Vec<RankingRow>, usize) {
    let mut index: HashMap<RankingKey, usize> = HashMap::new();
    let mut kept: Vec<RankingRow> = Vec::with_capacity(rows.len());
    let mut duplicates = 0;

    for row in rows {
        match index.get(&key(&row)) {
            Some(&i) => {
                duplicates += 1;
                let current = &kept[i];
                let adds_date = row.poll_date.is_some() && current.poll_date.is_none();
                if adds_date || row.points > current.points {
                    kept[i] = row;
                }
            }
            None => {
                index.insert(key(&row), kept.len());
                kept.push(row);
            }
        }
    }

    (kept, duplicates)
}

#[derive(Debug, Clone, Default)]
pub struct RankingsOutcome {
    pub received: usize,
    pub duplicates: usize,
    pub inserted: usize,
    pub errors: Vec<String>,
}

pub async fn handle_rankings<S: Store>(store: &mut S, api: &CbbdClient) -> Result<RankingsOutcome> {
    print_banner("IMPORTING ALL RANKINGS");
    println!("[1/4] Fetching all rankings from API...");
    let rankings = api.fetch_rankings().await?;
    let mut outcome = RankingsOutcome {
        received: rankings.len(),
        ..Default::default()
    };
    if rankings.is_empty() {
        println!("No rankings data available");
        return Ok(outcome);
    }
    println!("✓ Received {} ranking records from API", rankings.len());

    println!("\n[2/4] Analyzing data...");
    analyze(&rankings).print();

    println!("\n[3/4] Processing and deduplicating rankings...");
    let now = timestamp();
    let (rows, duplicates) = dedupe_rankings(rankings.iter().map(|r| ranking_row(r, &now)).collect());
    outcome.duplicates = duplicates;
    println!("  → Original records: {}", rankings.len());
    println!("  → Duplicates found: {duplicates}");
    println!("  → Unique records to insert: {}", rows.len());

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        match to_record(row) {
            Ok(record) => records.push(record),
            Err(e) => outcome.errors.push(format!(
                "Team {} season {} week {}: {e}",
                row.team, row.season, row.week
            )),
        }
    }

    println!("\n[4/4] Inserting rankings into database in batches of {CHUNK_SIZE}...");
    let mode = UploadMode::Upsert { on_conflict: RANKING_KEY };
    let report = upload_in_batches(store, tables::RANKINGS, &records, mode, CHUNK_SIZE).await;
    outcome.inserted = report.inserted;
    outcome.errors.extend(report.failed.iter().map(|f| {
        format!(
            "{} season {} week {}: {}",
            f.record.get("team").and_then(|v| v.as_str()).unwrap_or("unknown"),
            get_i64(&f.record, "season").unwrap_or_default(),
            get_i64(&f.record, "week").unwrap_or_default(),
            f.error
        )
    }));

    print_banner("RANKINGS IMPORT COMPLETE");
    println!("API records received:     {}", outcome.received);
    println!("Duplicates removed:       {}", outcome.duplicates);
    println!("Unique records inserted:  {}", outcome.inserted);
    println!("Errors:                   {}", outcome.errors.len());
    print_errors(&outcome.errors);

    Ok(outcome)
}
