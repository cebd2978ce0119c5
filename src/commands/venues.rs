//! Venue import from `/venues`.

use super::common::{print_banner, print_errors, timestamp};
use crate::{
    cbbd::{types::Venue, CbbdClient},
    ingest::{upload_in_batches, UploadMode},
    storage::{tables, to_record, Store, VenueRow},
    Result,
};

const UPSERT_BATCH: usize = 500;

pub fn venue_row(venue: &Venue, now: &str) -> VenueRow {
    VenueRow {
        id: venue.id,
        source_id: venue.source_id.clone(),
        name: venue.name.clone(),
        city: venue.city.clone(),
        state: venue.state.clone(),
        country: venue.country.clone(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct VenuesOutcome {
    pub received: usize,
    pub inserted: usize,
    pub errors: Vec<String>,
}

pub async fn handle_venues<S: Store>(store: &mut S, api: &CbbdClient) -> Result<VenuesOutcome> {
    print_banner("IMPORTING VENUES");
    println!("[1/2] Fetching venues from API...");
    let venues = api.fetch_venues().await?;
    let mut outcome = VenuesOutcome {
        received: venues.len(),
        ..Default::default()
    };
    if venues.is_empty() {
        println!("No venue data available");
        return Ok(outcome);
    }
    println!("✓ Received {} venues from API", venues.len());

    println!("[2/2] Inserting venues into database...");
    let now = timestamp();
    let mut records = Vec::with_capacity(venues.len());
    for venue in &venues {
        match to_record(&venue_row(venue, &now)) {
            Ok(record) => records.push(record),
            Err(e) => outcome.errors.push(format!("Venue {}: {e}", venue.name)),
        }
    }

    let mode = UploadMode::Upsert { on_conflict: &["id"] };
    let report = upload_in_batches(store, tables::VENUES, &records, mode, UPSERT_BATCH).await;
    outcome.inserted = report.inserted;
    outcome.errors.extend(report.failed.iter().map(|f| {
        format!(
            "Venue {}: {}",
            f.record.get("name").and_then(|v| v.as_str()).unwrap_or("unknown"),
            f.error
        )
    }));

    print_banner("VENUES IMPORT COMPLETE");
    println!("Venues inserted: {}", outcome.inserted);
    println!("Errors: {}", outcome.errors.len());
    print_errors(&outcome.errors);

    Ok(outcome)
}
